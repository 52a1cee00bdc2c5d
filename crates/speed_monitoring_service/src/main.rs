/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
#![allow(clippy::expect_used)]

use actix_web::{web, App, HttpServer};
use speed_monitoring_service::{
    domain::api,
    environment::{read_dhall_config, AppState},
    middleware::*,
    tools::{error::AppError, logger::setup_tracing, prometheus::prometheus_metrics},
};
use std::env::var;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn start_server() -> std::io::Result<()> {
    let dhall_config_path = var("DHALL_CONFIG")
        .unwrap_or_else(|_| "./dhall_config/speed_monitoring_service.dhall".to_string());
    let app_config = read_dhall_config(&dhall_config_path).unwrap_or_else(|err| {
        println!("Dhall Config Reading Error : {}", err);
        std::process::exit(1);
    });

    let _guard = setup_tracing(app_config.logger_cfg);

    let port = app_config.port;
    let workers = app_config.workers;

    let app_state = AppState::new(app_config);
    let registry = app_state.registry.clone();
    let eviction = registry.spawn_eviction();

    let data = web::Data::new(app_state);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .app_data(
                web::JsonConfig::default()
                    .error_handler(|err, _| AppError::UnprocessibleRequest(err.to_string()).into()),
            )
            .wrap(CheckContentLength)
            .wrap(RequestTimeout)
            .wrap(IncomingRequestMetrics)
            .wrap(TracingLogger::<DomainRootSpanBuilder>::new())
            .wrap(prometheus_metrics())
            .configure(api::handler)
    })
    .workers(workers)
    .disable_signals()
    .bind(("0.0.0.0", port))?
    .run();

    let server_handle = server.handle();

    // Stop accepting requests on SIGTERM or SIGINT (Ctrl+C), then wind down every session.
    tokio::spawn(async move {
        let mut sigterm = signal(SignalKind::terminate()).expect("Failed to listen for SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to listen for SIGINT");
        tokio::select! {
            _ = sigterm.recv() => info!(tag = "[Shutdown]", signal = "SIGTERM"),
            _ = sigint.recv() => info!(tag = "[Shutdown]", signal = "SIGINT"),
        }
        server_handle.stop(true).await;
    });

    server.await?;

    eviction.abort();
    registry.shutdown().await;
    info!(tag = "[Shutdown]", "Monitoring sessions stopped");

    Ok(())
}

fn main() {
    start_server().expect("Failed to start the server");
}
