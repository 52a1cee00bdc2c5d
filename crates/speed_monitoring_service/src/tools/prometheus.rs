/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
#![allow(clippy::expect_used)]

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use prometheus::{
    core::Collector, opts, register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge, HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

pub static INCOMING_API: once_cell::sync::Lazy<HistogramVec> = once_cell::sync::Lazy::new(|| {
    register_histogram_vec!(
        opts!("http_request_duration_seconds", "Incoming API requests").into(),
        &["method", "handler", "status_code", "code", "version"]
    )
    .expect("Failed to register incoming API metrics")
});

pub static CALL_EXTERNAL_API: once_cell::sync::Lazy<HistogramVec> =
    once_cell::sync::Lazy::new(|| {
        register_histogram_vec!(
            opts!("external_request_duration", "Call external API requests").into(),
            &["method", "host", "service", "status"]
        )
        .expect("Failed to register call external API metrics")
    });

pub static SPEED_EVALUATIONS: once_cell::sync::Lazy<IntCounterVec> =
    once_cell::sync::Lazy::new(|| {
        register_int_counter_vec!(
            opts!("speed_evaluations", "Speed evaluation ticks"),
            &["mode"]
        )
        .expect("Failed to register speed evaluation metrics")
    });

pub static OVERSPEEDING_WARNINGS: once_cell::sync::Lazy<IntCounter> =
    once_cell::sync::Lazy::new(|| {
        register_int_counter!("overspeeding_warnings", "Overspeeding warnings issued")
            .expect("Failed to register overspeeding warning metrics")
    });

pub static ALERTS_FIRED: once_cell::sync::Lazy<IntCounter> = once_cell::sync::Lazy::new(|| {
    register_int_counter!("overspeeding_alerts_fired", "Overspeeding alerts fired")
        .expect("Failed to register alerts fired metrics")
});

pub static POSITIONING_ERRORS: once_cell::sync::Lazy<IntCounterVec> =
    once_cell::sync::Lazy::new(|| {
        register_int_counter_vec!(
            opts!("positioning_errors", "Positioning capability errors"),
            &["code"]
        )
        .expect("Failed to register positioning error metrics")
    });

pub static REGISTERED_SESSIONS: once_cell::sync::Lazy<IntGauge> =
    once_cell::sync::Lazy::new(|| {
        register_int_gauge!(
            "registered_monitoring_sessions",
            "Vehicle sessions held by the registry, monitoring or paused"
        )
        .expect("Failed to register session registry metrics")
    });

/// Observes the duration of an incoming API request.
///
/// # Arguments
///
/// * `$method` - The HTTP method of the request (e.g., GET, POST).
/// * `$endpoint` - The endpoint or route of the request.
/// * `$status` - The HTTP status code of the response.
/// * `$code` - Error code of the response, or `SUCCESS`.
/// * `$start` - The time when the request was received.
#[macro_export]
macro_rules! incoming_api {
    ($method:expr, $endpoint:expr, $status:expr, $code:expr, $start:expr) => {
        let duration = $start.elapsed().as_secs_f64();
        let version = std::env::var("DEPLOYMENT_VERSION").unwrap_or("DEV".to_string());
        INCOMING_API
            .with_label_values(&[$method, $endpoint, $status, $code, version.as_str()])
            .observe(duration);
    };
}

/// Observes the duration of an outgoing call to an external service.
#[macro_export]
macro_rules! call_external_api {
    ($method:expr, $host:expr, $path:expr, $status:expr, $start:expr) => {
        let duration = $start.elapsed().as_secs_f64();
        CALL_EXTERNAL_API
            .with_label_values(&[$method, $host, $path, $status])
            .observe(duration);
    };
}

/// Initializes the `PrometheusMetrics` middleware serving `/metrics` and registers the
/// service's own collectors on its registry.
///
/// # Panics
///
/// * If a collector cannot be registered.
pub fn prometheus_metrics() -> PrometheusMetrics {
    let prometheus = PrometheusMetricsBuilder::new("api")
        .endpoint("/metrics")
        .build()
        .expect("Failed to create Prometheus Metrics");

    let collectors: Vec<Box<dyn Collector>> = vec![
        Box::new(INCOMING_API.to_owned()),
        Box::new(CALL_EXTERNAL_API.to_owned()),
        Box::new(SPEED_EVALUATIONS.to_owned()),
        Box::new(OVERSPEEDING_WARNINGS.to_owned()),
        Box::new(ALERTS_FIRED.to_owned()),
        Box::new(POSITIONING_ERRORS.to_owned()),
        Box::new(REGISTERED_SESSIONS.to_owned()),
    ];

    for collector in collectors {
        prometheus
            .registry
            .register(collector)
            .expect("Failed to register speed monitoring metrics");
    }

    prometheus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_gauge_describes_registered_sessions() {
        let desc = REGISTERED_SESSIONS.desc();
        assert_eq!(desc[0].fq_name, "registered_monitoring_sessions");
        assert!(desc[0].help.contains("monitoring or paused"));
    }
}
