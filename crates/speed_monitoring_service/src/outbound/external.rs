/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::types::*;
use crate::common::types::*;
use crate::tools::{callapi::call_api, error::AppError};
use reqwest::{Method, Url};
use std::time::Duration;

pub async fn send_overspeeding_alert(
    alert_callback_url: &Url,
    alert_api_key: Option<&str>,
    payload: &AlertPayload,
    timeout: Duration,
) -> Result<APISuccess, AppError> {
    let mut headers = vec![("content-type", "application/json")];
    if let Some(api_key) = alert_api_key {
        headers.push(("api-key", api_key));
    }

    call_api::<APISuccess, OverspeedingAlertReq>(
        Method::POST,
        alert_callback_url,
        headers,
        Some(OverspeedingAlertReq::from(payload)),
        Some(timeout),
    )
    .await
    .map_err(|err| AppError::AlertRequestFailed(err.message()))
}
