/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use crate::common::{
    detection::{AlertPolicy, AlertState, OverspeedingEvaluator},
    road_section::{RoadSection, RoadSectionCatalog, RoadSectionCursor},
    sampler::{LocationSampler, PositionEvent, PositioningCapability, PositioningConfig},
    simulation::SpeedSource,
    types::*,
    utils::format_coordinates,
};
use crate::tools::error::{AppError, PositioningError};
use crate::tools::prometheus::{ALERTS_FIRED, OVERSPEEDING_WARNINGS, SPEED_EVALUATIONS};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct MonitoringSettings {
    pub use_real_location: bool,
    pub positioning: PositioningConfig,
    pub simulation_interval: Duration,
    pub section_advance_interval: Duration,
    pub warning_threshold: u32,
    pub near_limit_ratio: f64,
    pub history_capacity: usize,
    pub idle_session_ttl: Duration,
}

impl MonitoringSettings {
    /// Timer periods must be positive; tokio refuses a zero-period interval.
    pub fn validate(&self) -> Result<(), AppError> {
        let periods = [
            ("simulation_interval", self.simulation_interval),
            ("section_advance_interval", self.section_advance_interval),
            ("idle_session_ttl", self.idle_session_ttl),
        ];
        match periods.iter().find(|(_, period)| period.is_zero()) {
            Some((name, _)) => Err(AppError::InvalidConfiguration(format!(
                "{name} must be greater than zero"
            ))),
            None => Ok(()),
        }
    }
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            use_real_location: true,
            positioning: PositioningConfig::default(),
            simulation_interval: Duration::from_secs(2),
            section_advance_interval: Duration::from_secs(15),
            warning_threshold: crate::common::detection::DEFAULT_WARNING_THRESHOLD,
            near_limit_ratio: crate::common::detection::DEFAULT_NEAR_LIMIT_RATIO,
            history_capacity: crate::common::sampler::DEFAULT_HISTORY_CAPACITY,
            idle_session_ttl: Duration::from_secs(30 * 60),
        }
    }
}

/// Mutable state of one start/stop cycle.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringSession {
    pub is_monitoring: bool,
    pub current_section_index: usize,
    pub current_speed: SpeedInKmph,
    pub speed_limit: SpeedInKmph,
    pub is_overspeeding: bool,
    pub band: SpeedBand,
    pub warning_count: u32,
    pub alert_fired: bool,
    pub location: String,
    pub last_evaluated_at: Option<TimeStamp>,
}

impl MonitoringSession {
    fn initial(section: &RoadSection) -> Self {
        Self {
            is_monitoring: false,
            current_section_index: 0,
            current_speed: SpeedInKmph(0),
            speed_limit: section.speed_limit,
            is_overspeeding: false,
            band: SpeedBand::Compliant,
            warning_count: 0,
            alert_fired: false,
            location: section.name.to_owned(),
            last_evaluated_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringSnapshot {
    pub vehicle_id: Option<VehicleId>,
    pub session: MonitoringSession,
    pub section: RoadSection,
    pub use_real_location: bool,
    pub input_mode: InputMode,
    pub is_tracking: bool,
    pub alert_state: AlertState,
    pub warnings_until_alert: u32,
    pub latest_location: Option<LocationSample>,
    pub location_error: Option<String>,
    pub evaluation_error: Option<String>,
}

/// Synchronous heart of a monitoring session: road-section cursor, speed evaluation,
/// warning accumulation and the alert policy. Time and randomness are injected so every
/// transition can be driven directly.
pub struct MonitoringCore {
    vehicle_id: Option<VehicleId>,
    use_real_location: bool,
    session: MonitoringSession,
    cursor: RoadSectionCursor,
    evaluator: OverspeedingEvaluator,
    alert_policy: AlertPolicy,
    speed_source: Box<dyn SpeedSource>,
    sampler: LocationSampler,
    evaluation_error: Option<String>,
}

impl MonitoringCore {
    pub fn new(
        vehicle_id: Option<VehicleId>,
        settings: &MonitoringSettings,
        catalog: Arc<RoadSectionCatalog>,
        capability: Arc<dyn PositioningCapability>,
        speed_source: Box<dyn SpeedSource>,
    ) -> Self {
        let cursor = RoadSectionCursor::new(catalog);
        let session = MonitoringSession::initial(cursor.current());
        Self {
            vehicle_id,
            use_real_location: settings.use_real_location,
            session,
            cursor,
            evaluator: OverspeedingEvaluator::new(settings.near_limit_ratio),
            alert_policy: AlertPolicy::new(settings.warning_threshold),
            speed_source,
            sampler: LocationSampler::new(
                capability,
                settings.positioning,
                settings.history_capacity,
            ),
            evaluation_error: None,
        }
    }

    pub fn session(&self) -> &MonitoringSession {
        &self.session
    }

    pub fn is_monitoring(&self) -> bool {
        self.session.is_monitoring
    }

    pub fn is_tracking(&self) -> bool {
        self.sampler.is_tracking()
    }

    pub fn alert_state(&self) -> AlertState {
        self.alert_policy.state()
    }

    pub fn current_section(&self) -> &RoadSection {
        self.cursor.current()
    }

    /// Live only when live input is selected and the positioning subscription is up;
    /// a refused subscription falls back to simulated readings.
    pub fn input_mode(&self) -> InputMode {
        if self.use_real_location && self.sampler.is_tracking() {
            InputMode::Live
        } else {
            InputMode::Simulated
        }
    }

    pub fn simulation_active(&self) -> bool {
        self.session.is_monitoring && self.input_mode() == InputMode::Simulated
    }

    pub fn set_use_real_location(&mut self, use_real_location: bool) -> Result<(), AppError> {
        if self.session.is_monitoring && self.use_real_location != use_real_location {
            return Err(AppError::InputModeLocked);
        }
        self.use_real_location = use_real_location;
        Ok(())
    }

    /// Begins monitoring. Returns the positioning receiver when a live subscription was
    /// opened by this call.
    pub fn start(&mut self) -> Option<UnboundedReceiver<PositionEvent>> {
        if self.session.is_monitoring {
            return None;
        }
        self.session.is_monitoring = true;
        info!(tag = "[Monitoring Started]", vehicle_id = ?self.vehicle_id, use_real_location = self.use_real_location);

        if self.use_real_location {
            self.sampler.start()
        } else {
            None
        }
    }

    /// Pauses monitoring. Warnings and the alert state survive until `reset`.
    pub fn stop(&mut self) {
        self.sampler.stop();
        if self.session.is_monitoring {
            self.session.is_monitoring = false;
            info!(tag = "[Monitoring Stopped]", vehicle_id = ?self.vehicle_id, warning_count = self.session.warning_count);
        }
    }

    pub fn reset(&mut self) {
        self.stop();
        self.cursor.reset();
        self.alert_policy.reset();
        self.evaluation_error = None;
        self.session = MonitoringSession::initial(self.cursor.current());
        info!(tag = "[Monitoring Reset]", vehicle_id = ?self.vehicle_id);
    }

    pub fn on_position_event(
        &mut self,
        event: PositionEvent,
        now: TimeStamp,
    ) -> Result<Option<AlertPayload>, AppError> {
        if !self.session.is_monitoring {
            return Ok(None);
        }

        let (label, speed) = match self.sampler.record(event) {
            Some(sample) => (format_coordinates(&sample.location), sample.speed),
            None => return Ok(None),
        };

        match speed {
            Some(speed) => self.evaluate(speed.to_kmph(), label, InputMode::Live, now),
            None => {
                self.session.location = label;
                Ok(None)
            }
        }
    }

    pub fn on_positioning_failure(&mut self, err: PositioningError) {
        if self.session.is_monitoring {
            self.sampler.record_failure(err);
        }
    }

    pub fn on_simulation_tick(&mut self, now: TimeStamp) -> Result<Option<AlertPayload>, AppError> {
        if !self.simulation_active() {
            return Ok(None);
        }

        let section = self.cursor.current();
        let label = section.name.to_owned();
        let speed = self
            .speed_source
            .next_speed(self.session.current_speed, section.speed_limit);

        self.evaluate(speed, label, InputMode::Simulated, now)
    }

    /// Moves to the next road section and re-derives the overspeeding flag against its limit.
    /// No warning is issued for the change itself.
    pub fn on_section_tick(&mut self) -> Result<(), AppError> {
        if !self.session.is_monitoring {
            return Ok(());
        }

        self.cursor.advance();
        self.session.current_section_index = self.cursor.index();

        let evaluation = self
            .evaluator
            .evaluate(self.session.current_speed, self.cursor.current())
            .map_err(|err| self.record_evaluation_error(err))?;

        self.session.speed_limit = evaluation.speed_limit;
        self.session.is_overspeeding = evaluation.is_overspeeding;
        self.session.band = evaluation.band;
        Ok(())
    }

    fn evaluate(
        &mut self,
        speed: SpeedInKmph,
        label: String,
        mode: InputMode,
        now: TimeStamp,
    ) -> Result<Option<AlertPayload>, AppError> {
        let evaluation = self
            .evaluator
            .evaluate(speed, self.cursor.current())
            .map_err(|err| self.record_evaluation_error(err))?;

        SPEED_EVALUATIONS
            .with_label_values(&[mode.to_string().as_str()])
            .inc();

        self.evaluation_error = None;
        self.session.current_speed = evaluation.speed;
        self.session.speed_limit = evaluation.speed_limit;
        self.session.is_overspeeding = evaluation.is_overspeeding;
        self.session.band = evaluation.band;
        self.session.location = label;
        self.session.last_evaluated_at = Some(now);

        if evaluation.is_overspeeding {
            self.session.warning_count += 1;
            OVERSPEEDING_WARNINGS.inc();
            warn!(
                tag = "[Overspeeding Warning]",
                vehicle_id = ?self.vehicle_id,
                speed = evaluation.speed.inner(),
                speed_limit = evaluation.speed_limit.inner(),
                warning_count = self.session.warning_count
            );
        }

        if self
            .alert_policy
            .observe(self.session.warning_count, self.session.is_overspeeding)
        {
            self.session.alert_fired = true;
            ALERTS_FIRED.inc();
            return Ok(Some(AlertPayload {
                vehicle_id: self.vehicle_id.to_owned(),
                location_description: self.session.location.to_owned(),
                speed_kmh: self.session.current_speed,
                speed_limit_kmh: self.session.speed_limit,
                warning_count: self.session.warning_count,
                fired_at: now,
            }));
        }

        Ok(None)
    }

    fn record_evaluation_error(&mut self, err: AppError) -> AppError {
        self.evaluation_error = Some(err.message());
        err
    }

    pub fn history(&self) -> Vec<LocationSample> {
        self.sampler.history().to_vec()
    }

    pub fn snapshot(&self) -> MonitoringSnapshot {
        MonitoringSnapshot {
            vehicle_id: self.vehicle_id.to_owned(),
            session: self.session.to_owned(),
            section: self.cursor.current().to_owned(),
            use_real_location: self.use_real_location,
            input_mode: self.input_mode(),
            is_tracking: self.sampler.is_tracking(),
            alert_state: self.alert_policy.state(),
            warnings_until_alert: self
                .alert_policy
                .warnings_until_alert(self.session.warning_count),
            latest_location: self.sampler.latest().cloned(),
            location_error: self.sampler.error().map(str::to_string),
            evaluation_error: self.evaluation_error.to_owned(),
        }
    }
}
