/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use std::{str::FromStr, sync::Arc};

use chrono::Utc;
use tracing::{info, warn};

use crate::{
    common::{sampler::validate_sample, types::*, utils::path_length_in_meters},
    domain::types::ui::monitor::*,
    environment::AppState,
    monitor::{registry::MonitoredVehicle, session::MonitoringSnapshot},
    tools::error::{AppError, PositioningError},
};

/// Resolves a session that `start` already created. No other route creates one.
async fn existing_session(
    data: &AppState,
    vehicle_id: &VehicleId,
) -> Result<Arc<MonitoredVehicle>, AppError> {
    data.registry
        .get(vehicle_id)
        .await
        .ok_or_else(|| AppError::MonitoringSessionUnavailable(vehicle_id.inner()))
}

pub async fn start_monitoring(
    data: &AppState,
    vehicle_id: VehicleId,
) -> Result<MonitoringSnapshot, AppError> {
    let vehicle = data.registry.get_or_create(&vehicle_id).await;
    let snapshot = vehicle.handle.start().await?;
    info!(tag = "[Monitoring Started]", vehicle_id = %vehicle_id.inner(), input_mode = %snapshot.input_mode);
    Ok(snapshot)
}

pub async fn stop_monitoring(
    data: &AppState,
    vehicle_id: VehicleId,
) -> Result<MonitoringSnapshot, AppError> {
    let vehicle = existing_session(data, &vehicle_id).await?;
    vehicle.handle.stop().await
}

pub async fn reset_monitoring(
    data: &AppState,
    vehicle_id: VehicleId,
) -> Result<MonitoringSnapshot, AppError> {
    let vehicle = existing_session(data, &vehicle_id).await?;
    vehicle.handle.reset().await
}

pub async fn monitoring_status(
    data: &AppState,
    vehicle_id: VehicleId,
) -> Result<MonitoringSnapshot, AppError> {
    let vehicle = existing_session(data, &vehicle_id).await?;
    vehicle.handle.status().await
}

pub async fn set_input_mode(
    data: &AppState,
    vehicle_id: VehicleId,
    request_body: InputModeRequest,
) -> Result<MonitoringSnapshot, AppError> {
    let vehicle = existing_session(data, &vehicle_id).await?;
    vehicle
        .handle
        .set_use_real_location(request_body.use_real_location)
        .await
}

/// Hands a device fix to the vehicle's positioning capability. A fix nobody is listening
/// for, or one filtered out by the accuracy and age rules, is acknowledged with
/// `delivered = false`.
pub async fn push_location(
    data: &AppState,
    vehicle_id: VehicleId,
    request_body: LocationUpdateRequest,
) -> Result<LocationUpdateResponse, AppError> {
    let sample = LocationSample::from(request_body);
    validate_sample(&sample)?;

    let vehicle = existing_session(data, &vehicle_id).await?;

    let delivered = vehicle
        .positioning
        .publish_sample(sample, TimeStamp(Utc::now()));

    if !delivered {
        warn!(tag = "[Location Not Delivered]", vehicle_id = %vehicle_id.inner());
    }

    Ok(LocationUpdateResponse { delivered })
}

pub async fn push_location_error(
    data: &AppState,
    vehicle_id: VehicleId,
    code: &str,
) -> Result<LocationUpdateResponse, AppError> {
    let err = PositioningError::from_str(code)
        .map_err(|_| AppError::InvalidRequest(format!("Unknown positioning error : {code}")))?;

    let vehicle = existing_session(data, &vehicle_id).await?;

    Ok(LocationUpdateResponse {
        delivered: vehicle.positioning.publish_failure(err),
    })
}

pub async fn location_history(
    data: &AppState,
    vehicle_id: VehicleId,
) -> Result<LocationHistoryResponse, AppError> {
    let vehicle = existing_session(data, &vehicle_id).await?;
    let locations = vehicle.handle.history().await?;

    Ok(LocationHistoryResponse {
        points_recorded: locations.len(),
        distance_covered_meters: path_length_in_meters(
            locations.iter().map(|sample| &sample.location),
        ),
        vehicle_number: vehicle_id,
        locations,
    })
}

pub fn road_sections(data: &AppState) -> RoadSectionsResponse {
    RoadSectionsResponse {
        sections: data.registry.catalog().sections().to_vec(),
    }
}
