/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::external::send_overspeeding_alert;
use crate::common::types::*;
use crate::tools::error::AppError;
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use tracing::{info, warn};

/// Receives the single alert produced when a session crosses its warning threshold.
/// Delivery guarantees are the notifier's concern.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn notify(&self, payload: &AlertPayload) -> Result<(), AppError>;
}

/// Used when no authority endpoint is configured.
pub struct LoggingAlertNotifier;

#[async_trait]
impl AlertNotifier for LoggingAlertNotifier {
    async fn notify(&self, payload: &AlertPayload) -> Result<(), AppError> {
        warn!(
            tag = "[Overspeeding Alert]",
            vehicle_id = ?payload.vehicle_id,
            location = %payload.location_description,
            speed = payload.speed_kmh.inner(),
            speed_limit = payload.speed_limit_kmh.inner(),
            warning_count = payload.warning_count
        );
        Ok(())
    }
}

pub struct CallbackAlertNotifier {
    alert_callback_url: Url,
    alert_api_key: Option<String>,
    timeout: Duration,
}

impl CallbackAlertNotifier {
    pub fn new(alert_callback_url: Url, alert_api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            alert_callback_url,
            alert_api_key,
            timeout,
        }
    }
}

#[async_trait]
impl AlertNotifier for CallbackAlertNotifier {
    async fn notify(&self, payload: &AlertPayload) -> Result<(), AppError> {
        send_overspeeding_alert(
            &self.alert_callback_url,
            self.alert_api_key.as_deref(),
            payload,
            self.timeout,
        )
        .await?;
        info!(tag = "[Overspeeding Alert Delivered]", vehicle_id = ?payload.vehicle_id);
        Ok(())
    }
}
