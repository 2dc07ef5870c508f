//! Logging Infrastructure
//!
//! Console output always; with a log dir, two daily-rotated files:
//! `app/` for everything except the `security` target, `security/` for
//! authentication and authorization events.

use std::fs;
use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global subscriber
///
/// `RUST_LOG` wins over `level` when set.
pub fn init_logger(level: &str, json_format: bool, log_dir: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let file_layers = match log_dir {
        Some(dir) => {
            let app_dir = dir.join("app");
            let security_dir = dir.join("security");
            fs::create_dir_all(&app_dir)?;
            fs::create_dir_all(&security_dir)?;

            let app_log = RollingFileAppender::new(Rotation::DAILY, app_dir, "app");
            let app_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_writer(std::sync::Mutex::new(app_log))
                .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
                    meta.target() != "security"
                }));

            let security_log = RollingFileAppender::new(Rotation::DAILY, security_dir, "security");
            let security_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_writer(std::sync::Mutex::new(security_log))
                .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
                    meta.target() == "security"
                }));

            Some(app_layer.and_then(security_layer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layers)
        .try_init()?;

    Ok(())
}
