/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use actix_web::{
    http::{header::ContentType, StatusCode},
    HttpResponse, ResponseError,
};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    error_message: String,
    pub error_code: String,
}

#[derive(Debug, Serialize, thiserror::Error)]
pub enum AppError {
    #[error("INTERNAL_ERROR")]
    InternalError(String),
    #[error("INVALID_REQUEST")]
    InvalidRequest(String),
    #[error("UNPROCESSIBLE_REQUEST")]
    UnprocessibleRequest(String),
    #[error("LARGE_PAYLOAD_SIZE")]
    LargePayloadSize(usize, usize),
    #[error("EXTERNAL_API_CALL_ERROR")]
    ExternalAPICallError(String),
    #[error("DESERIALIZATION_ERROR")]
    DeserializationError(String),
    #[error("INVALID_CONFIGURATION")]
    InvalidConfiguration(String),
    #[error("REQUEST_TIMEOUT")]
    RequestTimeout,
    #[error("ALERT_REQUEST_FAILED")]
    AlertRequestFailed(String),
    #[error("INVALID_GPS_DATA")]
    InvalidGPSData(String),
    #[error("INVALID_ROAD_SECTION")]
    InvalidRoadSection(String),
    #[error("INPUT_MODE_LOCKED")]
    InputModeLocked,
    #[error("MONITORING_SESSION_UNAVAILABLE")]
    MonitoringSessionUnavailable(String),
}

impl AppError {
    fn error_message(&self) -> ErrorBody {
        ErrorBody {
            error_message: self.message(),
            error_code: self.code(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            AppError::InternalError(err) => err.to_string(),
            AppError::InvalidRequest(err) => err.to_string(),
            AppError::UnprocessibleRequest(err) => err.to_string(),
            AppError::ExternalAPICallError(err) => err.to_string(),
            AppError::DeserializationError(err) => err.to_string(),
            AppError::InvalidConfiguration(err) => err.to_string(),
            AppError::LargePayloadSize(length, limit) => {
                format!("Content length ({length} Bytes) greater than allowed maximum limit : ({limit} Bytes)")
            }
            AppError::AlertRequestFailed(reason) => {
                format!("Sending Overspeeding Alert Failed : {reason}")
            }
            AppError::InvalidGPSData(reason) => format!("Invalid GPS Data : {reason}"),
            AppError::InvalidRoadSection(section) => {
                format!("Road section has no valid speed limit : {section}")
            }
            AppError::InputModeLocked => {
                "Input mode cannot be switched while monitoring is active".to_string()
            }
            AppError::MonitoringSessionUnavailable(vehicle) => {
                format!("Monitoring session is not running : {vehicle}")
            }
            _ => "Some Error Occured".to_string(),
        }
    }

    fn code(&self) -> String {
        self.to_string()
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(self.error_message())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnprocessibleRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::LargePayloadSize(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::ExternalAPICallError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::DeserializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidConfiguration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            AppError::AlertRequestFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidGPSData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidRoadSection(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InputModeLocked => StatusCode::CONFLICT,
            AppError::MonitoringSessionUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Failures reported by a positioning capability. These never abort monitoring; the
/// sampler keeps the latest one as advisory text.
#[derive(
    Debug, Clone, Copy, Display, EnumString, Serialize, Deserialize, Eq, PartialEq,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PositioningError {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    Unknown,
}

impl std::error::Error for PositioningError {}

impl PositioningError {
    pub fn message(&self) -> &'static str {
        match self {
            PositioningError::PermissionDenied => {
                "Location permission denied. Please enable location access."
            }
            PositioningError::PositionUnavailable => "Location information is unavailable.",
            PositioningError::Timeout => "Location request timed out.",
            PositioningError::Unknown => "An unknown error occurred.",
        }
    }
}
