/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use crate::common::{sampler::PositionEvent, types::*};
use crate::monitor::session::{MonitoringCore, MonitoringSettings, MonitoringSnapshot};
use crate::outbound::notifier::AlertNotifier;
use crate::tools::error::{AppError, PositioningError};
use chrono::Utc;
use std::{pin::Pin, sync::Arc, time::Duration};
use tokio::{
    sync::{
        mpsc::{self, UnboundedReceiver},
        oneshot,
    },
    task::JoinHandle,
    time::{interval_at, sleep, Instant, Interval, MissedTickBehavior, Sleep},
};
use tracing::{error, info};

const COMMAND_BUFFER: usize = 32;

pub enum SessionCommand {
    Start(oneshot::Sender<MonitoringSnapshot>),
    Stop(oneshot::Sender<MonitoringSnapshot>),
    Reset(oneshot::Sender<MonitoringSnapshot>),
    Status(oneshot::Sender<MonitoringSnapshot>),
    History(oneshot::Sender<Vec<LocationSample>>),
    SetUseRealLocation(bool, oneshot::Sender<Result<MonitoringSnapshot, AppError>>),
}

/// Cloneable front for a running session controller.
#[derive(Clone)]
pub struct SessionHandle {
    label: String,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, AppError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(command(reply))
            .await
            .map_err(|_| AppError::MonitoringSessionUnavailable(self.label.to_owned()))?;
        response
            .await
            .map_err(|_| AppError::MonitoringSessionUnavailable(self.label.to_owned()))
    }

    pub async fn start(&self) -> Result<MonitoringSnapshot, AppError> {
        self.request(SessionCommand::Start).await
    }

    pub async fn stop(&self) -> Result<MonitoringSnapshot, AppError> {
        self.request(SessionCommand::Stop).await
    }

    pub async fn reset(&self) -> Result<MonitoringSnapshot, AppError> {
        self.request(SessionCommand::Reset).await
    }

    pub async fn status(&self) -> Result<MonitoringSnapshot, AppError> {
        self.request(SessionCommand::Status).await
    }

    pub async fn history(&self) -> Result<Vec<LocationSample>, AppError> {
        self.request(SessionCommand::History).await
    }

    pub async fn set_use_real_location(
        &self,
        use_real_location: bool,
    ) -> Result<MonitoringSnapshot, AppError> {
        self.request(|reply| SessionCommand::SetUseRealLocation(use_real_location, reply))
            .await?
    }
}

/// Event sources that are live only while monitoring.
#[derive(Default)]
struct Schedule {
    positions: Option<UnboundedReceiver<PositionEvent>>,
    simulation: Option<Interval>,
    section: Option<Interval>,
    positioning_deadline: Option<Pin<Box<Sleep>>>,
}

async fn next_position(positions: &mut Option<UnboundedReceiver<PositionEvent>>) -> Option<PositionEvent> {
    match positions {
        Some(receiver) => receiver.recv().await,
        None => futures::future::pending().await,
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => futures::future::pending().await,
    }
}

async fn deadline_elapsed(deadline: &mut Option<Pin<Box<Sleep>>>) {
    match deadline {
        Some(deadline) => deadline.as_mut().await,
        None => futures::future::pending().await,
    }
}

fn interval_after(period: Duration) -> Interval {
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

/// Single writer for one monitoring session.
///
/// Commands, positioning events, the simulation interval and the road-section interval are
/// all consumed by one `select!` loop, so every mutation of the session is serialized.
/// Stopping drops the positioning receiver and both intervals; anything still queued from
/// the old subscription is discarded with it.
pub struct SessionController {
    core: MonitoringCore,
    notifier: Arc<dyn AlertNotifier>,
    commands: mpsc::Receiver<SessionCommand>,
    simulation_interval: Duration,
    section_advance_interval: Duration,
    positioning_timeout: Duration,
}

impl SessionController {
    pub fn spawn(
        core: MonitoringCore,
        settings: &MonitoringSettings,
        notifier: Arc<dyn AlertNotifier>,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (sender, commands) = mpsc::channel(COMMAND_BUFFER);
        let label = core
            .snapshot()
            .vehicle_id
            .map(|VehicleId(vehicle_id)| vehicle_id)
            .unwrap_or_else(|| "anonymous".to_string());

        let controller = SessionController {
            core,
            notifier,
            commands,
            simulation_interval: settings.simulation_interval,
            section_advance_interval: settings.section_advance_interval,
            positioning_timeout: settings.positioning.timeout,
        };

        let join_handle = tokio::spawn(controller.run());

        (SessionHandle { label, sender }, join_handle)
    }

    async fn run(mut self) {
        let mut schedule = Schedule::default();

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command, &mut schedule),
                    None => break,
                },
                event = next_position(&mut schedule.positions) => match event {
                    Some(event) => {
                        if let Some(deadline) = schedule.positioning_deadline.as_mut() {
                            deadline.as_mut().reset(Instant::now() + self.positioning_timeout);
                        }
                        let outcome = self.core.on_position_event(event, TimeStamp(Utc::now()));
                        self.handle_outcome(outcome);
                    }
                    None => {
                        schedule.positions = None;
                        schedule.positioning_deadline = None;
                    }
                },
                _ = next_tick(&mut schedule.simulation) => {
                    let outcome = self.core.on_simulation_tick(TimeStamp(Utc::now()));
                    self.handle_outcome(outcome);
                },
                _ = next_tick(&mut schedule.section) => {
                    if let Err(err) = self.core.on_section_tick() {
                        error!(tag = "[Road Section Advance Failed]", error = %err.message());
                    }
                },
                _ = deadline_elapsed(&mut schedule.positioning_deadline) => {
                    self.core.on_positioning_failure(PositioningError::Timeout);
                    if let Some(deadline) = schedule.positioning_deadline.as_mut() {
                        deadline.as_mut().reset(Instant::now() + self.positioning_timeout);
                    }
                },
            }
        }

        self.core.stop();
        info!(tag = "[Monitoring Session Closed]", vehicle_id = ?self.core.snapshot().vehicle_id);
    }

    fn handle_command(&mut self, command: SessionCommand, schedule: &mut Schedule) {
        match command {
            SessionCommand::Start(reply) => {
                if let Some(positions) = self.core.start() {
                    schedule.positions = Some(positions);
                    schedule.positioning_deadline = (!self.positioning_timeout.is_zero())
                        .then(|| Box::pin(sleep(self.positioning_timeout)));
                }
                self.sync_schedule(schedule);
                let _ = reply.send(self.core.snapshot());
            }
            SessionCommand::Stop(reply) => {
                self.core.stop();
                self.sync_schedule(schedule);
                let _ = reply.send(self.core.snapshot());
            }
            SessionCommand::Reset(reply) => {
                self.core.reset();
                self.sync_schedule(schedule);
                let _ = reply.send(self.core.snapshot());
            }
            SessionCommand::Status(reply) => {
                let _ = reply.send(self.core.snapshot());
            }
            SessionCommand::History(reply) => {
                let _ = reply.send(self.core.history());
            }
            SessionCommand::SetUseRealLocation(use_real_location, reply) => {
                let result = self
                    .core
                    .set_use_real_location(use_real_location)
                    .map(|_| self.core.snapshot());
                let _ = reply.send(result);
            }
        }
    }

    /// Brings the timers and the positioning receiver in line with the core's state.
    fn sync_schedule(&self, schedule: &mut Schedule) {
        if !self.core.is_tracking() {
            schedule.positions = None;
            schedule.positioning_deadline = None;
        }

        if self.core.simulation_active() {
            if schedule.simulation.is_none() {
                schedule.simulation = Some(interval_after(self.simulation_interval));
            }
        } else {
            schedule.simulation = None;
        }

        if self.core.is_monitoring() {
            if schedule.section.is_none() {
                schedule.section = Some(interval_after(self.section_advance_interval));
            }
        } else {
            schedule.section = None;
        }
    }

    fn handle_outcome(&self, outcome: Result<Option<AlertPayload>, AppError>) {
        match outcome {
            Ok(Some(payload)) => {
                info!(
                    tag = "[Overspeeding Alert Fired]",
                    vehicle_id = ?payload.vehicle_id,
                    speed = payload.speed_kmh.inner(),
                    speed_limit = payload.speed_limit_kmh.inner(),
                    warning_count = payload.warning_count
                );
                let notifier = self.notifier.clone();
                tokio::spawn(async move {
                    if let Err(err) = notifier.notify(&payload).await {
                        error!(tag = "[Overspeeding Alert Delivery Failed]", error = %err.message());
                    }
                });
            }
            Ok(None) => {}
            Err(err) => {
                error!(tag = "[Speed Evaluation Failed]", error = %err.message());
            }
        }
    }
}
