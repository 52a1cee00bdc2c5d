#[cfg(test)]
mod api;
#[cfg(test)]
mod config;
#[cfg(test)]
mod controller;

#[cfg(test)]
pub(crate) mod fixtures {
    use async_trait::async_trait;
    use chrono::Utc;
    use speed_monitoring_service::{
        common::{
            road_section::{RoadSection, RoadSectionCatalog},
            simulation::SpeedSource,
            types::*,
        },
        outbound::notifier::AlertNotifier,
        tools::error::AppError,
    };
    use std::collections::VecDeque;
    use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

    pub struct ScriptedSpeeds(pub VecDeque<u32>);

    impl ScriptedSpeeds {
        pub fn boxed(speeds: &[u32]) -> Box<dyn SpeedSource> {
            Box::new(Self(speeds.iter().copied().collect()))
        }
    }

    impl SpeedSource for ScriptedSpeeds {
        fn next_speed(&mut self, previous: SpeedInKmph, _: SpeedInKmph) -> SpeedInKmph {
            self.0.pop_front().map(SpeedInKmph).unwrap_or(previous)
        }
    }

    pub struct RecordingNotifier(UnboundedSender<AlertPayload>);

    impl RecordingNotifier {
        pub fn new() -> (Self, UnboundedReceiver<AlertPayload>) {
            let (sender, receiver) = mpsc::unbounded_channel();
            (Self(sender), receiver)
        }
    }

    #[async_trait]
    impl AlertNotifier for RecordingNotifier {
        async fn notify(&self, payload: &AlertPayload) -> Result<(), AppError> {
            self.0
                .send(payload.to_owned())
                .map_err(|err| AppError::InternalError(err.to_string()))
        }
    }

    pub fn two_section_catalog() -> RoadSectionCatalog {
        RoadSectionCatalog::new(vec![
            RoadSection::new("Expressway - Normal", RoadCategory::Expressway, 100),
            RoadSection::new("Ghat Section - Khandala", RoadCategory::Ghat, 40),
        ])
        .expect("catalog is not empty")
    }

    pub fn fix(speed_mps: Option<f64>, accuracy: f64) -> LocationSample {
        LocationSample {
            location: Point {
                lat: Latitude(18.7557),
                lon: Longitude(73.4091),
            },
            accuracy: Accuracy(accuracy),
            speed: speed_mps.map(SpeedInMeterPerSecond),
            heading: Some(Direction(90.0)),
            timestamp: TimeStamp(Utc::now()),
        }
    }
}
