/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use serde::{Deserialize, Serialize};

use crate::common::{road_section::RoadSection, types::*};

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdateRequest {
    pub pt: Point,
    pub ts: TimeStamp,
    pub acc: Accuracy,
    pub v: Option<SpeedInMeterPerSecond>,
    pub bear: Option<Direction>,
}

impl From<LocationUpdateRequest> for LocationSample {
    fn from(request: LocationUpdateRequest) -> Self {
        LocationSample {
            location: request.pt,
            accuracy: request.acc,
            speed: request.v,
            heading: request.bear,
            timestamp: request.ts,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PositioningErrorRequest {
    pub code: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct InputModeRequest {
    pub use_real_location: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdateResponse {
    pub delivered: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LocationHistoryResponse {
    pub vehicle_number: VehicleId,
    pub points_recorded: usize,
    pub distance_covered_meters: f64,
    pub locations: Vec<LocationSample>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RoadSectionsResponse {
    pub sections: Vec<RoadSection>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ResponseData {
    pub result: String,
}
