use speed_monitoring_service::{
    common::types::*,
    environment::{read_dhall_config, AppConfig, RoadSectionConfig},
    tools::error::AppError,
};
use std::time::Duration;

const CONFIG_PATH: &str = "../../dhall_config/speed_monitoring_service.dhall";

fn load() -> AppConfig {
    read_dhall_config(CONFIG_PATH).expect("config parses")
}

#[test]
fn shipped_config_matches_defaults() {
    let config = load();
    assert_eq!(config.port, 8090);
    assert!(config.alert_callback_url.is_none());

    let settings = config.monitoring_cfg.settings().expect("settings valid");
    assert!(settings.use_real_location);
    assert_eq!(settings.simulation_interval, Duration::from_secs(2));
    assert_eq!(settings.section_advance_interval, Duration::from_secs(15));
    assert_eq!(settings.positioning.timeout, Duration::from_secs(10));
    assert_eq!(settings.positioning.max_sample_age, Duration::ZERO);
    assert_eq!(settings.warning_threshold, 3);
    assert_eq!(settings.history_capacity, 50);
    assert_eq!(settings.idle_session_ttl, Duration::from_secs(30 * 60));

    let catalog = config.road_section_catalog().expect("catalog builds");
    let limits: Vec<u32> = catalog
        .sections()
        .iter()
        .map(|section| section.speed_limit.inner())
        .collect();
    assert_eq!(limits, vec![100, 40, 60, 80]);
    assert_eq!(catalog.sections()[2].category, RoadCategory::Tunnel);
}

#[test]
fn empty_section_list_is_a_configuration_error() {
    let mut config = load();
    config.road_sections.clear();
    assert!(matches!(
        config.road_section_catalog(),
        Err(AppError::InvalidConfiguration(_))
    ));
}

#[test]
fn zero_timer_periods_are_configuration_errors() {
    let mut config = load();
    config.monitoring_cfg.simulation_interval = 0;
    assert!(matches!(
        config.monitoring_cfg.settings(),
        Err(AppError::InvalidConfiguration(_))
    ));

    let mut config = load();
    config.monitoring_cfg.section_advance_interval = 0;
    assert!(matches!(
        config.monitoring_cfg.settings(),
        Err(AppError::InvalidConfiguration(_))
    ));
}

#[test]
fn unknown_category_is_a_configuration_error() {
    let mut config = load();
    config.road_sections.push(RoadSectionConfig {
        name: "Bridge".to_string(),
        category: "bridge".to_string(),
        speed_limit: 50,
    });
    assert!(matches!(
        config.road_section_catalog(),
        Err(AppError::InvalidConfiguration(_))
    ));
}

#[test]
fn malformed_callback_url_is_rejected() {
    let mut config = load();
    config.alert_callback_url = Some("not a url".to_string());
    assert!(matches!(
        config.alert_notifier(),
        Err(AppError::InvalidConfiguration(_))
    ));

    config.alert_callback_url = Some("http://localhost:8016/alerts/overspeeding".to_string());
    assert!(config.alert_notifier().is_ok());
}

#[test]
fn missing_config_file_is_reported() {
    assert!(read_dhall_config("./does_not_exist.dhall").is_err());
}
