/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
#![allow(clippy::expect_used)]

use serde::Deserialize;
use tracing::subscriber::set_global_default;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, EnvFilter, Registry};

const SERVICE_NAME: &str = concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION"));
const LOG_DIRECTORY: &str = "logs";

#[derive(Debug, Deserialize, Clone, Copy)]
pub enum LogLevel {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
    OFF,
}

impl From<LogLevel> for LevelFilter {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::TRACE => LevelFilter::TRACE,
            LogLevel::DEBUG => LevelFilter::DEBUG,
            LogLevel::INFO => LevelFilter::INFO,
            LogLevel::WARN => LevelFilter::WARN,
            LogLevel::ERROR => LevelFilter::ERROR,
            LogLevel::OFF => LevelFilter::OFF,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct LoggerConfig {
    pub level: LogLevel,
    pub log_to_file: bool,
}

/// Level from `RUST_LOG` when set, otherwise the configured level.
fn level_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .from_env_lossy()
}

/// Installs the global bunyan subscriber: stdout always, plus a daily rolling file under
/// `logs/` when `log_to_file` is set. Keep the returned guard alive until shutdown or
/// buffered stdout records are lost.
pub fn setup_tracing(logger_cfg: LoggerConfig) -> WorkerGuard {
    LogTracer::init().expect("Failed to bridge log records into tracing");

    let (stdout_writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    let file_layer = logger_cfg.log_to_file.then(|| {
        let file_writer =
            tracing_appender::rolling::daily(LOG_DIRECTORY, format!("{SERVICE_NAME}.log"));
        BunyanFormattingLayer::new(SERVICE_NAME.to_string(), file_writer)
    });

    let subscriber = Registry::default()
        .with(level_filter(logger_cfg.level))
        .with(JsonStorageLayer)
        .with(file_layer)
        .with(BunyanFormattingLayer::new(
            SERVICE_NAME.to_string(),
            stdout_writer,
        ));

    set_global_default(subscriber).expect("Unable to set global tracing subscriber");

    guard
}
