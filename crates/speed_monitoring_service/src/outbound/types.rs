/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use serde::{Deserialize, Serialize};

use crate::common::types::*;

// Overspeeding alert handed to the authority system
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OverspeedingAlertReq {
    pub alert_type: String,
    pub vehicle_number: Option<VehicleId>,
    pub location: String,
    pub speed: SpeedInKmph,
    pub speed_limit: SpeedInKmph,
    pub warning_count: u32,
    pub timestamp: TimeStamp,
}

impl From<&AlertPayload> for OverspeedingAlertReq {
    fn from(payload: &AlertPayload) -> Self {
        Self {
            alert_type: "overspeeding".to_string(),
            vehicle_number: payload.vehicle_id.to_owned(),
            location: payload.location_description.to_owned(),
            speed: payload.speed_kmh,
            speed_limit: payload.speed_limit_kmh,
            warning_count: payload.warning_count,
            timestamp: payload.fired_at,
        }
    }
}
