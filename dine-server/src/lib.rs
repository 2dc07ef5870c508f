//! Dine Server - QR table ordering backend
//!
//! Customers scan a table's QR code, fill the table's cart, and pay through
//! the Midtrans gateway; staff move paid orders through the kitchen queue.
//!
//! # Module layout
//!
//! ```text
//! dine-server/src/
//! ├── core/          # config, state, errors, HTTP server
//! ├── auth/          # JWT, permissions, middleware
//! ├── db/            # embedded SurrealDB and repositories
//! ├── orders/        # checkout, lifecycle, payment reconciliation
//! ├── services/      # payment gateway, nutrition estimator, QR codes
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # logging, validation
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod services;
pub mod utils;

pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

pub use utils::logger::init_logger;

/// Security event on the `security` target, kept apart from the app log
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Load `.env`, read the configuration, create the work dir and start logging
pub fn setup_environment() -> anyhow::Result<Config> {
    // A missing .env file is normal outside development
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    let log_dir = config.log_to_file.then(|| config.logs_dir());
    init_logger(&config.log_level, config.log_json, log_dir.as_deref())?;

    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
    ____  _
   / __ \(_)___  ___
  / / / / / __ \/ _ \
 / /_/ / / / / /  __/
/_____/_/_/ /_/\___/
    "#
    );
}
