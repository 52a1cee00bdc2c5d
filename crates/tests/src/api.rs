use actix_web::{
    http::StatusCode,
    test,
    web::{self, Data},
    App,
};
use serde_json::{json, Value};
use speed_monitoring_service::{
    common::{road_section::RoadSectionCatalog, types::Accuracy},
    domain::api,
    environment::AppState,
    middleware::IncomingRequestMetrics,
    monitor::{registry::SessionRegistry, session::MonitoringSettings},
    outbound::notifier::LoggingAlertNotifier,
    tools::{
        error::{AppError, ErrorBody},
        prometheus::INCOMING_API,
    },
};
use std::{sync::Arc, time::Duration};

fn app_state() -> Data<AppState> {
    let registry = SessionRegistry::new(
        MonitoringSettings::default(),
        Arc::new(RoadSectionCatalog::default()),
        Arc::new(LoggingAlertNotifier),
        Accuracy(50.0),
        Some(11),
    );
    Data::new(AppState {
        registry: Arc::new(registry),
        max_allowed_req_size: 512_000,
        request_timeout: 9_000,
    })
}

macro_rules! monitoring_app {
    ($data:expr) => {
        test::init_service(
            App::new()
                .app_data($data.clone())
                .app_data(web::JsonConfig::default().error_handler(|err, _| {
                    AppError::UnprocessibleRequest(err.to_string()).into()
                }))
                .configure(api::handler),
        )
        .await
    };
}

fn location_body(speed: Value, lat: f64, acc: f64) -> Value {
    json!({
        "pt": { "lat": lat, "lon": 73.4091 },
        "ts": chrono::Utc::now(),
        "acc": acc,
        "v": speed,
        "bear": 120.0
    })
}

#[actix_web::test]
async fn healthcheck_and_catalog() {
    let data = app_state();
    let app = monitoring_app!(data);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/healthcheck").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["result"], "Service Is Up");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/ui/road-sections").to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    let sections = body["sections"].as_array().expect("sections array");
    assert_eq!(sections.len(), 4);
    assert_eq!(sections[0]["category"], "expressway");
    assert_eq!(sections[0]["speedLimit"], 100);
    assert_eq!(sections[1]["name"], "Ghat Section - Khandala");
}

#[actix_web::test]
async fn pushed_location_updates_status() {
    let data = app_state();
    let app = monitoring_app!(data);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/ui/monitor/MH12AB1234/start")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["session"]["isMonitoring"], true);
    assert_eq!(body["inputMode"], "LIVE");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/ui/monitor/MH12AB1234/location")
            .set_json(location_body(json!(27.78), 18.7557, 5.0))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["delivered"], true);

    actix_web::rt::time::sleep(Duration::from_millis(50)).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/ui/monitor/MH12AB1234/status")
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["session"]["currentSpeed"], 100);
    assert_eq!(body["session"]["location"], "18.7557, 73.4091");
    assert_eq!(body["warningsUntilAlert"], 3);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/ui/monitor/MH12AB1234/history")
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["pointsRecorded"], 1);
    assert_eq!(body["distanceCoveredMeters"], 0.0);

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/ui/monitor/MH12AB1234/mode")
            .set_json(json!({ "useRealLocation": false }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.error_code, "INPUT_MODE_LOCKED");

    data.registry.shutdown().await;
}

#[actix_web::test]
async fn invalid_fixes_are_rejected() {
    let data = app_state();
    let app = monitoring_app!(data);

    test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/ui/monitor/MH12AB1234/start")
            .to_request(),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/ui/monitor/MH12AB1234/location")
            .set_json(location_body(json!(10.0), 95.0, 5.0))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.error_code, "INVALID_GPS_DATA");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/ui/monitor/MH12AB1234/location")
            .set_json(location_body(json!(-3.0), 18.7557, 5.0))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/ui/monitor/MH12AB1234/location/error")
            .set_json(json!({ "code": "SATELLITES_ON_STRIKE" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/ui/monitor/MH12AB1234/location/error")
            .set_json(json!({ "code": "PERMISSION_DENIED" }))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["delivered"], true);

    data.registry.shutdown().await;
}

#[actix_web::test]
async fn location_for_unknown_vehicle_is_unavailable() {
    let data = app_state();
    let app = monitoring_app!(data);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/ui/monitor/UNKNOWN/location")
            .set_json(location_body(json!(10.0), 18.7557, 5.0))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.error_code, "MONITORING_SESSION_UNAVAILABLE");
}

#[actix_web::test]
async fn stop_and_reset_over_http() {
    let data = app_state();
    let app = monitoring_app!(data);

    for action in ["start", "stop"] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/ui/monitor/MH01ZZ9999/{action}"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/ui/monitor/MH01ZZ9999/mode")
            .set_json(json!({ "useRealLocation": false }))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["useRealLocation"], false);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/ui/monitor/MH01ZZ9999/reset")
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["session"]["isMonitoring"], false);
    assert_eq!(body["session"]["warningCount"], 0);
    assert_eq!(body["alertState"], "ARMED");

    data.registry.shutdown().await;
}

#[actix_web::test]
async fn session_routes_need_a_started_session() {
    let data = app_state();
    let app = monitoring_app!(data);

    let requests = [
        test::TestRequest::get().uri("/ui/monitor/NEVERSTARTED/status"),
        test::TestRequest::get().uri("/ui/monitor/NEVERSTARTED/history"),
        test::TestRequest::post().uri("/ui/monitor/NEVERSTARTED/stop"),
        test::TestRequest::post().uri("/ui/monitor/NEVERSTARTED/reset"),
        test::TestRequest::put()
            .uri("/ui/monitor/NEVERSTARTED/mode")
            .set_json(json!({ "useRealLocation": false })),
    ];
    for request in requests {
        let resp = test::call_service(&app, request.to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: ErrorBody = test::read_body_json(resp).await;
        assert_eq!(body.error_code, "MONITORING_SESSION_UNAVAILABLE");
    }

    assert!(data.registry.is_empty().await);
}

#[actix_web::test]
async fn request_metrics_are_labelled_by_route_pattern() {
    let data = app_state();
    let app = test::init_service(
        App::new()
            .app_data(data.clone())
            .wrap(IncomingRequestMetrics)
            .configure(api::handler),
    )
    .await;

    let version = std::env::var("DEPLOYMENT_VERSION").unwrap_or("DEV".to_string());
    let labels = [
        "GET",
        "/ui/monitor/{vehicleNumber}/status",
        "503",
        "MONITORING_SESSION_UNAVAILABLE",
        version.as_str(),
    ];
    let before = INCOMING_API.with_label_values(&labels).get_sample_count();

    // A vehicle number that also occurs inside the literal path segments.
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/ui/monitor/o/status")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let after = INCOMING_API.with_label_values(&labels).get_sample_count();
    assert_eq!(after, before + 1);
}
