/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use crate::common::{
    road_section::RoadSectionCatalog, sampler::PushPositioning, simulation::RandomSpeedSource,
    types::*,
};
use crate::monitor::{
    controller::{SessionController, SessionHandle},
    session::{MonitoringCore, MonitoringSettings},
};
use crate::outbound::notifier::AlertNotifier;
use crate::tools::prometheus::REGISTERED_SESSIONS;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::{
    sync::RwLock,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::info;

/// A vehicle's session controller together with the capability its device pushes fixes into.
pub struct MonitoredVehicle {
    pub handle: SessionHandle,
    pub positioning: Arc<PushPositioning>,
    last_used: Mutex<Instant>,
    join_handle: JoinHandle<()>,
}

impl MonitoredVehicle {
    fn touch(&self) {
        *self
            .last_used
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_used
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .elapsed()
    }
}

/// Owns one monitoring session per vehicle. Sessions are created by `start` only and are
/// evicted once they sit paused for longer than `idle_session_ttl`.
pub struct SessionRegistry {
    settings: MonitoringSettings,
    catalog: Arc<RoadSectionCatalog>,
    notifier: Arc<dyn AlertNotifier>,
    min_location_accuracy: Accuracy,
    simulation_seed: Option<u64>,
    sessions: RwLock<FxHashMap<VehicleId, Arc<MonitoredVehicle>>>,
}

impl SessionRegistry {
    pub fn new(
        settings: MonitoringSettings,
        catalog: Arc<RoadSectionCatalog>,
        notifier: Arc<dyn AlertNotifier>,
        min_location_accuracy: Accuracy,
        simulation_seed: Option<u64>,
    ) -> Self {
        Self {
            settings,
            catalog,
            notifier,
            min_location_accuracy,
            simulation_seed,
            sessions: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn catalog(&self) -> &RoadSectionCatalog {
        &self.catalog
    }

    /// Looks up an existing session and marks it as used.
    pub async fn get(&self, vehicle_id: &VehicleId) -> Option<Arc<MonitoredVehicle>> {
        let vehicle = self.sessions.read().await.get(vehicle_id).cloned()?;
        vehicle.touch();
        Some(vehicle)
    }

    pub async fn get_or_create(&self, vehicle_id: &VehicleId) -> Arc<MonitoredVehicle> {
        if let Some(vehicle) = self.get(vehicle_id).await {
            return vehicle;
        }

        let mut sessions = self.sessions.write().await;
        if let Some(vehicle) = sessions.get(vehicle_id) {
            vehicle.touch();
            return vehicle.clone();
        }

        let positioning = Arc::new(PushPositioning::new(self.min_location_accuracy));
        let seed = self
            .simulation_seed
            .map(|seed| seed.wrapping_add(sessions.len() as u64));
        let core = MonitoringCore::new(
            Some(vehicle_id.to_owned()),
            &self.settings,
            self.catalog.clone(),
            positioning.clone(),
            Box::new(RandomSpeedSource::from_seed(seed)),
        );
        let (handle, join_handle) =
            SessionController::spawn(core, &self.settings, self.notifier.clone());

        let vehicle = Arc::new(MonitoredVehicle {
            handle,
            positioning,
            last_used: Mutex::new(Instant::now()),
            join_handle,
        });
        sessions.insert(vehicle_id.to_owned(), vehicle.clone());
        REGISTERED_SESSIONS.inc();
        info!(tag = "[Monitoring Session Created]", vehicle_id = %vehicle_id.inner());

        vehicle
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drops sessions that are not monitoring and have not been used for `idle_session_ttl`.
    /// A controller that no longer answers counts as not monitoring. Returns how many were
    /// dropped.
    pub async fn evict_idle(&self) -> usize {
        let ttl = self.settings.idle_session_ttl;
        let candidates: Vec<(VehicleId, Arc<MonitoredVehicle>)> = self
            .sessions
            .read()
            .await
            .iter()
            .filter(|(_, vehicle)| vehicle.idle_for() >= ttl)
            .map(|(vehicle_id, vehicle)| (vehicle_id.to_owned(), vehicle.clone()))
            .collect();

        let mut evicted = 0;
        for (vehicle_id, vehicle) in candidates {
            let is_monitoring = vehicle
                .handle
                .status()
                .await
                .map(|snapshot| snapshot.session.is_monitoring)
                .unwrap_or(false);
            if is_monitoring {
                continue;
            }

            let mut sessions = self.sessions.write().await;
            let still_idle = sessions.get(&vehicle_id).is_some_and(|current| {
                Arc::ptr_eq(current, &vehicle) && current.idle_for() >= ttl
            });
            if still_idle {
                sessions.remove(&vehicle_id);
                REGISTERED_SESSIONS.dec();
                evicted += 1;
                info!(tag = "[Monitoring Session Evicted]", vehicle_id = %vehicle_id.inner());
            }
        }

        evicted
    }

    /// Sweeps idle sessions once every `idle_session_ttl` until the task is aborted.
    pub fn spawn_eviction(self: &Arc<Self>) -> JoinHandle<()> {
        let registry = self.clone();
        let period = self.settings.idle_session_ttl;
        tokio::spawn(async move {
            let mut sweep = interval_at(Instant::now() + period, period);
            sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                sweep.tick().await;
                registry.evict_idle().await;
            }
        })
    }

    /// Drops every session handle and waits for the controllers to wind down.
    pub async fn shutdown(&self) {
        let sessions: Vec<Arc<MonitoredVehicle>> = {
            let mut sessions = self.sessions.write().await;
            sessions.drain().map(|(_, vehicle)| vehicle).collect()
        };

        for vehicle in sessions {
            REGISTERED_SESSIONS.dec();
            match Arc::try_unwrap(vehicle) {
                Ok(MonitoredVehicle {
                    handle,
                    join_handle,
                    ..
                }) => {
                    drop(handle);
                    let _ = join_handle.await;
                }
                Err(vehicle) => vehicle.join_handle.abort(),
            }
        }
    }
}
