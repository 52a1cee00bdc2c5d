/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use crate::tools::error::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A named zone with its own posted limit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoadSection {
    pub name: String,
    pub category: RoadCategory,
    pub speed_limit: SpeedInKmph,
}

impl RoadSection {
    pub fn new(name: &str, category: RoadCategory, speed_limit: u32) -> Self {
        Self {
            name: name.to_string(),
            category,
            speed_limit: SpeedInKmph(speed_limit),
        }
    }
}

/// Fixed ordered list of road sections, defined once at start-up.
#[derive(Debug, Clone)]
pub struct RoadSectionCatalog {
    sections: Vec<RoadSection>,
}

impl RoadSectionCatalog {
    pub fn new(sections: Vec<RoadSection>) -> Result<Self, AppError> {
        if sections.is_empty() {
            return Err(AppError::InvalidConfiguration(
                "Road section catalog is empty".to_string(),
            ));
        }
        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[RoadSection] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RoadSection> {
        self.sections.get(index)
    }
}

impl Default for RoadSectionCatalog {
    fn default() -> Self {
        Self {
            sections: vec![
                RoadSection::new("Expressway - Normal", RoadCategory::Expressway, 100),
                RoadSection::new("Ghat Section - Khandala", RoadCategory::Ghat, 40),
                RoadSection::new("Tunnel - Lonavala", RoadCategory::Tunnel, 60),
                RoadSection::new("Highway - Pune Approach", RoadCategory::Highway, 80),
            ],
        }
    }
}

/// Round-robin position within the catalog. Not map-matched; it simply advances on a timer.
#[derive(Debug, Clone)]
pub struct RoadSectionCursor {
    catalog: Arc<RoadSectionCatalog>,
    index: usize,
}

impl RoadSectionCursor {
    pub fn new(catalog: Arc<RoadSectionCatalog>) -> Self {
        Self { catalog, index: 0 }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &RoadSection {
        // The catalog is never empty and `index` is always reduced modulo its length.
        &self.catalog.sections[self.index]
    }

    pub fn advance(&mut self) -> &RoadSection {
        self.index = (self.index + 1) % self.catalog.len();
        self.current()
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_sections() -> Arc<RoadSectionCatalog> {
        Arc::new(RoadSectionCatalog::default())
    }

    #[test]
    fn cursor_wraps_after_full_cycle() {
        let mut cursor = RoadSectionCursor::new(four_sections());
        for _ in 0..4 {
            cursor.advance();
        }
        assert_eq!(cursor.index(), 0);
        assert_eq!(cursor.current().name, "Expressway - Normal");
    }

    #[test]
    fn cursor_walks_sections_in_order() {
        let mut cursor = RoadSectionCursor::new(four_sections());
        assert_eq!(cursor.advance().category, RoadCategory::Ghat);
        assert_eq!(cursor.advance().speed_limit, SpeedInKmph(60));
        assert_eq!(cursor.advance().name, "Highway - Pune Approach");
        cursor.reset();
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(matches!(
            RoadSectionCatalog::new(vec![]),
            Err(AppError::InvalidConfiguration(_))
        ));
    }
}
