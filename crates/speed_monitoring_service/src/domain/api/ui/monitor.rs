/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use actix_web::{
    get, post, put,
    web::{Data, Json, Path},
};

use crate::{
    common::types::*,
    domain::{action::ui::monitor, types::ui::monitor::*},
    environment::AppState,
    monitor::session::MonitoringSnapshot,
    tools::error::AppError,
};

#[post("/ui/monitor/{vehicleNumber}/start")]
pub async fn start_monitoring(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<Json<MonitoringSnapshot>, AppError> {
    let vehicle_id = VehicleId(path.into_inner());

    Ok(Json(monitor::start_monitoring(&data, vehicle_id).await?))
}

#[post("/ui/monitor/{vehicleNumber}/stop")]
pub async fn stop_monitoring(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<Json<MonitoringSnapshot>, AppError> {
    let vehicle_id = VehicleId(path.into_inner());

    Ok(Json(monitor::stop_monitoring(&data, vehicle_id).await?))
}

#[post("/ui/monitor/{vehicleNumber}/reset")]
pub async fn reset_monitoring(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<Json<MonitoringSnapshot>, AppError> {
    let vehicle_id = VehicleId(path.into_inner());

    Ok(Json(monitor::reset_monitoring(&data, vehicle_id).await?))
}

#[get("/ui/monitor/{vehicleNumber}/status")]
pub async fn monitoring_status(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<Json<MonitoringSnapshot>, AppError> {
    let vehicle_id = VehicleId(path.into_inner());

    Ok(Json(monitor::monitoring_status(&data, vehicle_id).await?))
}

#[put("/ui/monitor/{vehicleNumber}/mode")]
pub async fn set_input_mode(
    data: Data<AppState>,
    path: Path<String>,
    param_obj: Json<InputModeRequest>,
) -> Result<Json<MonitoringSnapshot>, AppError> {
    let vehicle_id = VehicleId(path.into_inner());
    let request_body = param_obj.into_inner();

    Ok(Json(
        monitor::set_input_mode(&data, vehicle_id, request_body).await?,
    ))
}

#[post("/ui/monitor/{vehicleNumber}/location")]
pub async fn push_location(
    data: Data<AppState>,
    path: Path<String>,
    param_obj: Json<LocationUpdateRequest>,
) -> Result<Json<LocationUpdateResponse>, AppError> {
    let vehicle_id = VehicleId(path.into_inner());
    let request_body = param_obj.into_inner();

    Ok(Json(
        monitor::push_location(&data, vehicle_id, request_body).await?,
    ))
}

#[post("/ui/monitor/{vehicleNumber}/location/error")]
pub async fn push_location_error(
    data: Data<AppState>,
    path: Path<String>,
    param_obj: Json<PositioningErrorRequest>,
) -> Result<Json<LocationUpdateResponse>, AppError> {
    let vehicle_id = VehicleId(path.into_inner());
    let request_body = param_obj.into_inner();

    Ok(Json(
        monitor::push_location_error(&data, vehicle_id, &request_body.code).await?,
    ))
}

#[get("/ui/monitor/{vehicleNumber}/history")]
pub async fn location_history(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<Json<LocationHistoryResponse>, AppError> {
    let vehicle_id = VehicleId(path.into_inner());

    Ok(Json(monitor::location_history(&data, vehicle_id).await?))
}

#[get("/ui/road-sections")]
pub async fn road_sections(data: Data<AppState>) -> Result<Json<RoadSectionsResponse>, AppError> {
    Ok(Json(monitor::road_sections(&data)))
}
