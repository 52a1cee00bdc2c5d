/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
#![allow(clippy::expect_used)]

use std::{str::FromStr, sync::Arc, time::Duration};

use crate::{
    common::{
        road_section::{RoadSection, RoadSectionCatalog},
        sampler::PositioningConfig,
        types::*,
    },
    monitor::{registry::SessionRegistry, session::MonitoringSettings},
    outbound::notifier::{AlertNotifier, CallbackAlertNotifier, LoggingAlertNotifier},
    tools::{error::AppError, logger::LoggerConfig},
};
use reqwest::Url;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub workers: usize,
    pub logger_cfg: LoggerConfig,
    pub request_timeout: u64,
    pub max_allowed_req_size: usize,
    pub monitoring_cfg: MonitoringConfig,
    pub road_sections: Vec<RoadSectionConfig>,
    pub alert_callback_url: Option<String>,
    pub alert_api_key: Option<String>,
    pub alert_request_timeout: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitoringConfig {
    pub use_real_location: bool,
    pub high_accuracy: bool,
    pub max_sample_age: u64,
    pub timeout: u64,
    pub simulation_interval: u64,
    pub section_advance_interval: u64,
    pub warning_threshold: u32,
    pub near_limit_ratio: f64,
    pub history_capacity: usize,
    pub idle_session_ttl: u64,
    pub min_location_accuracy: f64,
    pub simulation_seed: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoadSectionConfig {
    pub name: String,
    pub category: String,
    pub speed_limit: u32,
}

pub fn read_dhall_config(config_path: &str) -> Result<AppConfig, String> {
    let config = serde_dhall::from_file(config_path).parse::<AppConfig>();
    match config {
        Ok(config) => Ok(config),
        Err(e) => Err(format!("Error reading config: {}", e)),
    }
}

impl MonitoringConfig {
    /// All durations in the config are milliseconds. Zero timer periods are rejected.
    pub fn settings(&self) -> Result<MonitoringSettings, AppError> {
        let settings = MonitoringSettings {
            use_real_location: self.use_real_location,
            positioning: PositioningConfig {
                high_accuracy: self.high_accuracy,
                max_sample_age: Duration::from_millis(self.max_sample_age),
                timeout: Duration::from_millis(self.timeout),
            },
            simulation_interval: Duration::from_millis(self.simulation_interval),
            section_advance_interval: Duration::from_millis(self.section_advance_interval),
            warning_threshold: self.warning_threshold,
            near_limit_ratio: self.near_limit_ratio,
            history_capacity: self.history_capacity,
            idle_session_ttl: Duration::from_millis(self.idle_session_ttl),
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl AppConfig {
    /// Builds the road-section catalog. An empty or unparsable list is a configuration error.
    pub fn road_section_catalog(&self) -> Result<RoadSectionCatalog, AppError> {
        let sections = self
            .road_sections
            .iter()
            .map(|section| {
                let category = RoadCategory::from_str(section.category.as_str()).map_err(|_| {
                    AppError::InvalidConfiguration(format!(
                        "Unknown road category : {}",
                        section.category
                    ))
                })?;
                if section.speed_limit == 0 {
                    warn!(tag = "[Road Section Without Speed Limit]", section = %section.name);
                }
                Ok(RoadSection::new(
                    section.name.as_str(),
                    category,
                    section.speed_limit,
                ))
            })
            .collect::<Result<Vec<RoadSection>, AppError>>()?;

        RoadSectionCatalog::new(sections)
    }

    pub fn alert_notifier(&self) -> Result<Arc<dyn AlertNotifier>, AppError> {
        match &self.alert_callback_url {
            Some(url) => {
                let url = Url::parse(url.as_str()).map_err(|err| {
                    AppError::InvalidConfiguration(format!("Invalid alert_callback_url : {err}"))
                })?;
                Ok(Arc::new(CallbackAlertNotifier::new(
                    url,
                    self.alert_api_key.to_owned(),
                    Duration::from_millis(self.alert_request_timeout),
                )))
            }
            None => Ok(Arc::new(LoggingAlertNotifier)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub max_allowed_req_size: usize,
    pub request_timeout: u64,
}

impl AppState {
    pub fn new(app_config: AppConfig) -> AppState {
        let catalog = app_config
            .road_section_catalog()
            .expect("Failed to build road section catalog");

        let notifier = app_config
            .alert_notifier()
            .expect("Failed to build alert notifier");

        let settings = app_config
            .monitoring_cfg
            .settings()
            .expect("Failed to build monitoring settings");

        info!(
            tag = "[Road Sections Loaded]",
            sections = catalog.len(),
            alert_callback = app_config.alert_callback_url.is_some()
        );

        let registry = SessionRegistry::new(
            settings,
            Arc::new(catalog),
            notifier,
            Accuracy(app_config.monitoring_cfg.min_location_accuracy),
            app_config.monitoring_cfg.simulation_seed,
        );

        AppState {
            registry: Arc::new(registry),
            max_allowed_req_size: app_config.max_allowed_req_size,
            request_timeout: app_config.request_timeout,
        }
    }
}
