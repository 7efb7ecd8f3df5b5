//! Structured logging configuration
//!
//! JSON output for production, pretty formatting for development,
//! configurable via the config file or `LOG_*` environment variables.

use crate::config::get_config;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

// Keeps the non-blocking writer's worker thread alive for the process
// lifetime; dropping the guard shuts the worker down and loses logs.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initialize the logging system based on configuration.
pub fn init_logging() {
    let config = get_config();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.output.as_str() {
        "file" => init_file_logging(env_filter, &config.logging.format, &config.paths.log_directory),
        _ => init_console_logging(env_filter, &config.logging.format),
    }
}

fn init_console_logging(filter: EnvFilter, format: &str) {
    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        "json" => {
            subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_target(true),
                )
                .init();
        }
        _ => {
            subscriber
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_ansi(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
    }
}

fn init_file_logging(filter: EnvFilter, format: &str, log_dir: &std::path::Path) {
    let file_appender = tracing_appender::rolling::daily(log_dir, "usage-meter.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = FILE_GUARD.set(guard);

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        }
        _ => {
            subscriber
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .init();
        }
    }
}
