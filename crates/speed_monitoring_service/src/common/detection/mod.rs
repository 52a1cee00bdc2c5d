/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use crate::common::types::*;
use serde::{Deserialize, Serialize};

mod alert;
mod overspeeding;

pub use alert::{AlertPolicy, AlertState};
pub use overspeeding::OverspeedingEvaluator;

pub const DEFAULT_WARNING_THRESHOLD: u32 = 3;
pub const DEFAULT_NEAR_LIMIT_RATIO: f64 = 0.9;

/// Outcome of comparing one speed reading against the active road section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub speed: SpeedInKmph,
    pub speed_limit: SpeedInKmph,
    pub is_overspeeding: bool,
    pub band: SpeedBand,
}
