use std::path::PathBuf;

use crate::auth::JwtConfig;

/// Payment gateway settings
#[derive(Debug, Clone)]
pub struct MidtransConfig {
    /// Server key, used as basic-auth user and in notification signatures
    pub server_key: String,
    /// Production endpoints instead of sandbox
    pub is_production: bool,
    /// Reject notifications whose `signature_key` does not match
    pub verify_signature: bool,
    /// Where the gateway redirects the customer after paying
    pub finish_url: Option<String>,
}

impl MidtransConfig {
    pub fn from_env() -> Self {
        Self {
            server_key: std::env::var("MIDTRANS_SERVER_KEY").unwrap_or_default(),
            is_production: env_flag("MIDTRANS_IS_PRODUCTION", false),
            verify_signature: env_flag("MIDTRANS_VERIFY_SIGNATURE", false),
            finish_url: std::env::var("PAYMENT_FINISH_URL").ok().filter(|s| !s.is_empty()),
        }
    }

    /// Snap (checkout) API base
    pub fn snap_base_url(&self) -> &'static str {
        if self.is_production {
            "https://app.midtrans.com"
        } else {
            "https://app.sandbox.midtrans.com"
        }
    }

    /// Core API base (transaction status)
    pub fn api_base_url(&self) -> &'static str {
        if self.is_production {
            "https://api.midtrans.com"
        } else {
            "https://api.sandbox.midtrans.com"
        }
    }
}

/// Generative nutrition estimator settings
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// OpenAI-compatible chat completions URL; unset means keyword estimation only
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
}

impl AiConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("AI_API_URL").ok().filter(|s| !s.is_empty()),
            api_key: std::env::var("AI_API_KEY").ok().filter(|s| !s.is_empty()),
            model: std::env::var("AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into()),
        }
    }
}

/// First-start administrator account
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

impl AdminSeed {
    pub fn from_env() -> Self {
        Self {
            username: std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into()),
            password: std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into()),
            email: std::env::var("ADMIN_EMAIL").ok().filter(|s| !s.is_empty()),
        }
    }
}

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | ./data | database, uploads and logs |
/// | HTTP_PORT | 3000 | HTTP port |
/// | ENVIRONMENT | development | development / staging / production |
/// | PUBLIC_BASE_URL | http://localhost:3000 | base of URLs encoded in table QR codes |
/// | REQUEST_TIMEOUT_MS | 30000 | per-request timeout, also used for outbound calls |
/// | LOG_LEVEL | info | default filter when RUST_LOG is unset |
/// | LOG_JSON | false | JSON console output |
/// | LOG_TO_FILE | false | daily rolling files under `{WORK_DIR}/logs` |
///
/// JWT, payment gateway, generative estimator and admin seed settings are
/// read by [`JwtConfig`], [`MidtransConfig`], [`AiConfig`] and [`AdminSeed`].
///
/// ```ignore
/// WORK_DIR=/data/dine HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub http_port: u16,
    pub environment: String,
    pub public_base_url: String,
    pub jwt: JwtConfig,
    pub midtrans: MidtransConfig,
    pub ai: AiConfig,
    pub admin: AdminSeed,
    pub request_timeout_ms: u64,
    pub shutdown_timeout_ms: u64,
    pub log_level: String,
    pub log_json: bool,
    pub log_to_file: bool,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let http_port = env_parse("HTTP_PORT", 3000);
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| format!("http://localhost:{http_port}")),
            jwt: JwtConfig::from_env(),
            midtrans: MidtransConfig::from_env(),
            ai: AiConfig::from_env(),
            admin: AdminSeed::from_env(),
            request_timeout_ms: env_parse("REQUEST_TIMEOUT_MS", 30_000),
            shutdown_timeout_ms: env_parse("SHUTDOWN_TIMEOUT_MS", 10_000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_flag("LOG_JSON", false),
            log_to_file: env_flag("LOG_TO_FILE", false),
        }
    }

    /// Override the parts tests care about
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    pub fn uploads_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("uploads").join("images")
    }

    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// Create `database/`, `uploads/images/` and `logs/` under the work dir
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.uploads_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_dir_layout() {
        let config = Config::with_overrides("/tmp/dine-test", 4000);
        assert_eq!(config.http_port, 4000);
        assert_eq!(config.database_dir(), PathBuf::from("/tmp/dine-test/database"));
        assert_eq!(
            config.uploads_dir(),
            PathBuf::from("/tmp/dine-test/uploads/images")
        );
    }

    #[test]
    fn test_midtrans_endpoints() {
        let mut m = MidtransConfig {
            server_key: "k".into(),
            is_production: false,
            verify_signature: false,
            finish_url: None,
        };
        assert!(m.snap_base_url().contains("sandbox"));
        m.is_production = true;
        assert_eq!(m.api_base_url(), "https://api.midtrans.com");
    }
}
