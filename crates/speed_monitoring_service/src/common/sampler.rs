/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use crate::tools::error::{AppError, PositioningError};
use crate::tools::prometheus::POSITIONING_ERRORS;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Options handed to the positioning capability on subscription.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositioningConfig {
    pub high_accuracy: bool,
    pub max_sample_age: Duration,
    pub timeout: Duration,
}

impl Default for PositioningConfig {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            max_sample_age: Duration::ZERO,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Sample(LocationSample),
    Failure(PositioningError),
}

/// Source of location fixes. Delivery happens through the sender registered on `subscribe`;
/// after `unsubscribe` returns no new events are sent, although one already queued may
/// still be observed by the receiver.
pub trait PositioningCapability: Send + Sync {
    fn subscribe(
        &self,
        config: PositioningConfig,
        sender: UnboundedSender<PositionEvent>,
    ) -> Result<SubscriptionHandle, PositioningError>;

    fn unsubscribe(&self, handle: SubscriptionHandle);
}

/// Most recent fixes, oldest evicted first.
#[derive(Debug, Clone)]
pub struct LocationHistory {
    samples: VecDeque<LocationSample>,
    capacity: usize,
}

impl LocationHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: LocationSample) {
        if self.capacity == 0 {
            return;
        }
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocationSample> {
        self.samples.iter()
    }

    pub fn to_vec(&self) -> Vec<LocationSample> {
        self.samples.iter().cloned().collect()
    }
}

/// Bridges a positioning capability into location samples, keeping the latest fix, a
/// bounded trail and the last advisory error.
pub struct LocationSampler {
    capability: Arc<dyn PositioningCapability>,
    config: PositioningConfig,
    subscription: Option<SubscriptionHandle>,
    latest: Option<LocationSample>,
    history: LocationHistory,
    error: Option<String>,
}

impl LocationSampler {
    pub fn new(
        capability: Arc<dyn PositioningCapability>,
        config: PositioningConfig,
        history_capacity: usize,
    ) -> Self {
        Self {
            capability,
            config,
            subscription: None,
            latest: None,
            history: LocationHistory::new(history_capacity),
            error: None,
        }
    }

    /// Subscribes to the capability. Returns the event receiver on a fresh subscription and
    /// `None` when already subscribed or when the capability refused, in which case the
    /// refusal is kept as the advisory error.
    pub fn start(&mut self) -> Option<UnboundedReceiver<PositionEvent>> {
        if self.subscription.is_some() {
            return None;
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        match self.capability.subscribe(self.config, sender) {
            Ok(handle) => {
                self.subscription = Some(handle);
                self.error = None;
                Some(receiver)
            }
            Err(err) => {
                warn!(tag = "[Positioning Subscribe Failed]", error = %err);
                self.record_failure(err);
                None
            }
        }
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.subscription.take() {
            self.capability.unsubscribe(handle);
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.subscription.is_some()
    }

    /// Applies one event from the capability. Returns the new sample when it was a fix.
    pub fn record(&mut self, event: PositionEvent) -> Option<&LocationSample> {
        match event {
            PositionEvent::Sample(sample) => {
                self.history.push(sample.to_owned());
                self.latest = Some(sample);
                self.error = None;
                self.latest.as_ref()
            }
            PositionEvent::Failure(err) => {
                self.record_failure(err);
                None
            }
        }
    }

    pub fn record_failure(&mut self, err: PositioningError) {
        POSITIONING_ERRORS
            .with_label_values(&[err.to_string().as_str()])
            .inc();
        self.error = Some(err.message().to_string());
    }

    pub fn config(&self) -> PositioningConfig {
        self.config
    }

    pub fn latest(&self) -> Option<&LocationSample> {
        self.latest.as_ref()
    }

    pub fn history(&self) -> &LocationHistory {
        &self.history
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl Drop for LocationSampler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Rejects fixes a receiver could not physically have produced.
pub fn validate_sample(sample: &LocationSample) -> Result<(), AppError> {
    let Latitude(lat) = sample.location.lat;
    let Longitude(lon) = sample.location.lon;
    let Accuracy(accuracy) = sample.accuracy;

    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(AppError::InvalidGPSData(format!("latitude out of range : {lat}")));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(AppError::InvalidGPSData(format!("longitude out of range : {lon}")));
    }
    if !accuracy.is_finite() || accuracy < 0.0 {
        return Err(AppError::InvalidGPSData(format!("negative accuracy : {accuracy}")));
    }
    if let Some(SpeedInMeterPerSecond(speed)) = sample.speed {
        if !speed.is_finite() || speed < 0.0 {
            return Err(AppError::InvalidGPSData(format!("negative speed : {speed}")));
        }
    }
    if let Some(Direction(heading)) = sample.heading {
        if !heading.is_finite() {
            return Err(AppError::InvalidGPSData(format!("invalid heading : {heading}")));
        }
    }
    Ok(())
}

struct Subscriber {
    handle: SubscriptionHandle,
    config: PositioningConfig,
    sender: UnboundedSender<PositionEvent>,
}

/// Positioning capability fed by fixes a device pushes over the API. Honours the
/// subscriber's accuracy and sample-age options before delivering.
pub struct PushPositioning {
    min_location_accuracy: Accuracy,
    subscriber: Mutex<Option<Subscriber>>,
    next_handle: AtomicU64,
}

impl PushPositioning {
    pub fn new(min_location_accuracy: Accuracy) -> Self {
        Self {
            min_location_accuracy,
            subscriber: Mutex::new(None),
            next_handle: AtomicU64::new(1),
        }
    }

    pub fn has_subscriber(&self) -> bool {
        self.subscriber
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// Delivers a fix to the current subscriber. Returns whether it was delivered.
    pub fn publish_sample(&self, sample: LocationSample, now: TimeStamp) -> bool {
        let mut subscriber = self
            .subscriber
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let Some(current) = subscriber.as_ref() else {
            debug!(tag = "[Positioning Sample Dropped]", reason = "no subscriber");
            return false;
        };

        if current.config.high_accuracy && sample.accuracy > self.min_location_accuracy {
            debug!(tag = "[Positioning Sample Dropped]", reason = "low accuracy", accuracy = %sample.accuracy.inner());
            return false;
        }

        if !current.config.max_sample_age.is_zero() {
            let age = now.inner().signed_duration_since(sample.timestamp.inner());
            let is_stale = age
                .to_std()
                .map(|age| age > current.config.max_sample_age)
                .unwrap_or(false);
            if is_stale {
                debug!(tag = "[Positioning Sample Dropped]", reason = "stale", age_ms = %age.num_milliseconds());
                return false;
            }
        }

        if current.sender.send(PositionEvent::Sample(sample)).is_err() {
            *subscriber = None;
            return false;
        }
        true
    }

    pub fn publish_failure(&self, err: PositioningError) -> bool {
        let mut subscriber = self
            .subscriber
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match subscriber.as_ref() {
            Some(current) => {
                if current.sender.send(PositionEvent::Failure(err)).is_err() {
                    *subscriber = None;
                    return false;
                }
                true
            }
            None => false,
        }
    }
}

impl PositioningCapability for PushPositioning {
    fn subscribe(
        &self,
        config: PositioningConfig,
        sender: UnboundedSender<PositionEvent>,
    ) -> Result<SubscriptionHandle, PositioningError> {
        let handle = SubscriptionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        *self
            .subscriber
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Subscriber {
            handle,
            config,
            sender,
        });
        Ok(handle)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        let mut subscriber = self
            .subscriber
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if subscriber
            .as_ref()
            .is_some_and(|current| current.handle == handle)
        {
            *subscriber = None;
        }
    }
}
