/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use crate::common::detection::Evaluation;
use crate::common::road_section::RoadSection;
use crate::common::types::*;
use crate::tools::error::AppError;

pub struct OverspeedingEvaluator {
    near_limit_ratio: f64,
}

impl OverspeedingEvaluator {
    pub fn new(near_limit_ratio: f64) -> Self {
        Self { near_limit_ratio }
    }

    fn band(&self, speed: SpeedInKmph, speed_limit: SpeedInKmph) -> SpeedBand {
        if speed > speed_limit {
            SpeedBand::Overspeeding
        } else if speed.inner() as f64 >= speed_limit.inner() as f64 * self.near_limit_ratio {
            SpeedBand::NearLimit
        } else {
            SpeedBand::Compliant
        }
    }

    /// Overspeeding is strictly above the posted limit; equal is compliant.
    /// A zero limit means the catalog entry is broken and is reported, never compared.
    pub fn evaluate(
        &self,
        speed: SpeedInKmph,
        section: &RoadSection,
    ) -> Result<Evaluation, AppError> {
        if section.speed_limit.inner() == 0 {
            return Err(AppError::InvalidRoadSection(section.name.to_owned()));
        }

        Ok(Evaluation {
            speed,
            speed_limit: section.speed_limit,
            is_overspeeding: speed > section.speed_limit,
            band: self.band(speed, section.speed_limit),
        })
    }
}

impl Default for OverspeedingEvaluator {
    fn default() -> Self {
        Self::new(super::DEFAULT_NEAR_LIMIT_RATIO)
    }
}
