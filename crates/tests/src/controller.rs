use crate::fixtures::*;
use speed_monitoring_service::{
    common::{
        detection::AlertState,
        road_section::RoadSectionCatalog,
        sampler::{PositioningCapability, PushPositioning},
        types::*,
    },
    monitor::{
        controller::{SessionController, SessionHandle},
        registry::SessionRegistry,
        session::{MonitoringCore, MonitoringSettings},
    },
};
use std::{sync::Arc, time::Duration};
use tokio::{sync::mpsc::UnboundedReceiver, time::sleep};

fn simulated_settings() -> MonitoringSettings {
    MonitoringSettings {
        use_real_location: false,
        ..MonitoringSettings::default()
    }
}

fn spawn_simulated(speeds: &[u32]) -> (SessionHandle, UnboundedReceiver<AlertPayload>) {
    let settings = simulated_settings();
    let (notifier, alerts) = RecordingNotifier::new();
    let positioning: Arc<dyn PositioningCapability> =
        Arc::new(PushPositioning::new(Accuracy(50.0)));
    let core = MonitoringCore::new(
        Some(VehicleId("MH14XY0001".to_string())),
        &settings,
        Arc::new(two_section_catalog()),
        positioning,
        ScriptedSpeeds::boxed(speeds),
    );
    let (handle, _) = SessionController::spawn(core, &settings, Arc::new(notifier));
    (handle, alerts)
}

#[tokio::test(start_paused = true)]
async fn simulated_ticks_raise_a_single_alert() -> anyhow::Result<()> {
    let (handle, mut alerts) = spawn_simulated(&[50, 105, 110, 120, 125]);

    let started = handle.start().await?;
    assert!(started.session.is_monitoring);
    assert_eq!(started.input_mode, InputMode::Simulated);

    // Stay clear of the tick instants so each status read follows the tick it checks.
    sleep(Duration::from_millis(100)).await;
    let mut warnings = vec![];
    for _ in 0..4 {
        sleep(Duration::from_millis(2000)).await;
        warnings.push(handle.status().await?.session.warning_count);
    }
    assert_eq!(warnings, vec![0, 1, 2, 3]);

    let alert = alerts.recv().await.expect("alert delivered");
    assert_eq!(alert.vehicle_id, Some(VehicleId("MH14XY0001".to_string())));
    assert_eq!(alert.speed_kmh, SpeedInKmph(120));
    assert_eq!(alert.speed_limit_kmh, SpeedInKmph(100));
    assert_eq!(alert.warning_count, 3);
    assert_eq!(alert.location_description, "Expressway - Normal");

    sleep(Duration::from_millis(2000)).await;
    let status = handle.status().await?;
    assert_eq!(status.session.warning_count, 4);
    assert_eq!(status.alert_state, AlertState::Fired);
    assert!(alerts.try_recv().is_err());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn section_advances_every_fifteen_seconds() -> anyhow::Result<()> {
    let (handle, _alerts) = spawn_simulated(&[30]);
    handle.start().await?;

    sleep(Duration::from_millis(15_500)).await;
    let status = handle.status().await?;
    assert_eq!(status.session.current_section_index, 1);
    assert_eq!(status.section.speed_limit, SpeedInKmph(40));

    sleep(Duration::from_millis(15_000)).await;
    assert_eq!(handle.status().await?.session.current_section_index, 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stop_pauses_and_reset_clears() -> anyhow::Result<()> {
    let (handle, _alerts) = spawn_simulated(&[120, 120, 120]);
    handle.start().await?;
    sleep(Duration::from_millis(6_500)).await;

    let stopped = handle.stop().await?;
    assert!(!stopped.session.is_monitoring);
    assert_eq!(stopped.session.warning_count, 3);

    sleep(Duration::from_millis(10_000)).await;
    assert_eq!(handle.status().await?.session.warning_count, 3);

    let restarted = handle.start().await?;
    assert_eq!(restarted.session.warning_count, 3);
    assert_eq!(restarted.alert_state, AlertState::Fired);

    let reset = handle.reset().await?;
    assert!(!reset.session.is_monitoring);
    assert_eq!(reset.session.warning_count, 0);
    assert_eq!(reset.session.current_speed, SpeedInKmph(0));
    assert_eq!(reset.session.current_section_index, 0);
    assert_eq!(reset.alert_state, AlertState::Armed);
    assert_eq!(reset.warnings_until_alert, 3);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn start_is_idempotent() -> anyhow::Result<()> {
    let (handle, _alerts) = spawn_simulated(&[120, 120]);
    handle.start().await?;
    handle.start().await?;

    sleep(Duration::from_millis(2_500)).await;
    assert_eq!(handle.status().await?.session.warning_count, 1);

    Ok(())
}

fn live_registry() -> (SessionRegistry, UnboundedReceiver<AlertPayload>) {
    let (notifier, alerts) = RecordingNotifier::new();
    let registry = SessionRegistry::new(
        MonitoringSettings::default(),
        Arc::new(RoadSectionCatalog::default()),
        Arc::new(notifier),
        Accuracy(50.0),
        Some(7),
    );
    (registry, alerts)
}

#[tokio::test(start_paused = true)]
async fn pushed_fixes_drive_live_evaluation() -> anyhow::Result<()> {
    let (registry, mut alerts) = live_registry();
    let vehicle = registry
        .get_or_create(&VehicleId("KA01AB1234".to_string()))
        .await;

    let started = vehicle.handle.start().await?;
    assert_eq!(started.input_mode, InputMode::Live);
    assert!(vehicle.positioning.has_subscriber());

    let now = TimeStamp(chrono::Utc::now());
    assert!(vehicle.positioning.publish_sample(fix(Some(27.78), 5.0), now));
    sleep(Duration::from_millis(100)).await;

    let status = vehicle.handle.status().await?;
    assert_eq!(status.session.current_speed, SpeedInKmph(100));
    assert!(!status.session.is_overspeeding);
    assert_eq!(status.session.location, "18.7557, 73.4091");

    assert!(!vehicle.positioning.publish_sample(fix(Some(40.0), 120.0), now));

    for _ in 0..3 {
        assert!(vehicle.positioning.publish_sample(fix(Some(33.34), 5.0), now));
        sleep(Duration::from_millis(100)).await;
    }

    let alert = alerts.recv().await.expect("alert delivered");
    assert_eq!(alert.speed_kmh, SpeedInKmph(120));
    assert_eq!(alert.location_description, "18.7557, 73.4091");
    assert_eq!(vehicle.handle.history().await?.len(), 4);

    vehicle.handle.stop().await?;
    assert!(!vehicle.positioning.has_subscriber());
    assert!(!vehicle.positioning.publish_sample(fix(Some(50.0), 5.0), now));

    registry.shutdown().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn silent_receiver_reports_timeout() -> anyhow::Result<()> {
    let (registry, _alerts) = live_registry();
    let vehicle = registry
        .get_or_create(&VehicleId("KA01AB1234".to_string()))
        .await;
    vehicle.handle.start().await?;

    sleep(Duration::from_millis(10_500)).await;
    let status = vehicle.handle.status().await?;
    assert_eq!(
        status.location_error.as_deref(),
        Some("Location request timed out.")
    );
    assert!(status.session.is_monitoring);

    assert!(vehicle
        .positioning
        .publish_sample(fix(Some(10.0), 5.0), TimeStamp(chrono::Utc::now())));
    sleep(Duration::from_millis(100)).await;
    assert_eq!(vehicle.handle.status().await?.location_error, None);

    Ok(())
}

#[tokio::test]
async fn registry_keeps_one_session_per_vehicle() {
    let (registry, _alerts) = live_registry();
    let first = registry.get_or_create(&VehicleId("A".to_string())).await;
    let again = registry.get_or_create(&VehicleId("A".to_string())).await;
    registry.get_or_create(&VehicleId("B".to_string())).await;

    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(registry.len().await, 2);

    drop((first, again));
    registry.shutdown().await;
    assert!(registry.is_empty().await);
}

fn registry_with_idle_ttl(idle_session_ttl: Duration) -> SessionRegistry {
    let (notifier, _alerts) = RecordingNotifier::new();
    SessionRegistry::new(
        MonitoringSettings {
            idle_session_ttl,
            ..simulated_settings()
        },
        Arc::new(two_section_catalog()),
        Arc::new(notifier),
        Accuracy(50.0),
        Some(7),
    )
}

#[tokio::test(start_paused = true)]
async fn lookups_never_create_sessions() {
    let registry = registry_with_idle_ttl(Duration::from_secs(60));
    let vehicle_id = VehicleId("MH12AB1234".to_string());

    assert!(registry.get(&vehicle_id).await.is_none());
    assert!(registry.get(&vehicle_id).await.is_none());
    assert!(registry.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn paused_sessions_are_evicted_after_idle_ttl() -> anyhow::Result<()> {
    let registry = registry_with_idle_ttl(Duration::from_secs(60));
    let paused = VehicleId("PAUSED".to_string());
    let running = VehicleId("RUNNING".to_string());

    let vehicle = registry.get_or_create(&paused).await;
    vehicle.handle.start().await?;
    vehicle.handle.stop().await?;
    drop(vehicle);
    registry.get_or_create(&running).await.handle.start().await?;

    sleep(Duration::from_secs(30)).await;
    assert_eq!(registry.evict_idle().await, 0);

    sleep(Duration::from_secs(31)).await;
    assert_eq!(registry.evict_idle().await, 1);
    assert!(registry.get(&paused).await.is_none());
    assert!(registry.get(&running).await.is_some());
    assert_eq!(registry.len().await, 1);

    registry.shutdown().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn recent_use_postpones_eviction() {
    let registry = Arc::new(registry_with_idle_ttl(Duration::from_secs(60)));
    let vehicle_id = VehicleId("MH12AB1234".to_string());
    registry.get_or_create(&vehicle_id).await;
    let sweeper = registry.spawn_eviction();

    sleep(Duration::from_secs(45)).await;
    assert!(registry.get(&vehicle_id).await.is_some());

    sleep(Duration::from_secs(30)).await;
    assert_eq!(registry.len().await, 1);

    sleep(Duration::from_secs(60)).await;
    assert!(registry.is_empty().await);

    sweeper.abort();
}
