use std::sync::Arc;
use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::{Config, Result, ServerError};
use crate::db::DbService;
use crate::db::repository::UserRepository;
use crate::services::{
    FallbackEstimator, GenerativeEstimator, KeywordEstimator, MidtransGateway,
    NutritionEstimator, PaymentGateway,
};

/// Shared server state, cloned into every handler
///
/// | field | type | purpose |
/// |------|------|------|
/// | config | Config | immutable settings |
/// | db | Surreal<Db> | embedded database |
/// | jwt_service | Arc<JwtService> | token issue and validation |
/// | gateway | Arc<dyn PaymentGateway> | checkout sessions, status queries |
/// | nutrition | Arc<dyn NutritionEstimator> | menu nutrition estimates |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: Surreal<Db>,
    pub jwt_service: Arc<JwtService>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub nutrition: Arc<dyn NutritionEstimator>,
}

impl ServerState {
    /// Assemble state from ready-made parts (tests swap in fakes here)
    pub fn with_services(
        config: Config,
        db: Surreal<Db>,
        gateway: Arc<dyn PaymentGateway>,
        nutrition: Arc<dyn NutritionEstimator>,
    ) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        Self {
            config,
            db,
            jwt_service,
            gateway,
            nutrition,
        }
    }

    /// Open the database, seed the first admin and build the real
    /// gateway and estimator clients.
    pub async fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let db_path = config.database_dir().join("dine.db");
        let db = DbService::new(&db_path).await?.db;

        let timeout = Duration::from_millis(config.request_timeout_ms);
        let gateway = MidtransGateway::new(config.midtrans.clone(), timeout)
            .map_err(|e| ServerError::Config(e.to_string()))?;
        if config.midtrans.server_key.is_empty() {
            tracing::warn!("MIDTRANS_SERVER_KEY is not set, checkout will fail");
        }

        let nutrition: Arc<dyn NutritionEstimator> = if config.ai.api_url.is_some() {
            let primary = GenerativeEstimator::new(config.ai.clone(), timeout)
                .map_err(|e| ServerError::Config(e.to_string()))?;
            Arc::new(FallbackEstimator::new(Box::new(primary)))
        } else {
            tracing::info!("AI_API_URL not set, nutrition uses the keyword table only");
            Arc::new(KeywordEstimator)
        };

        let state = Self::with_services(config.clone(), db, Arc::new(gateway), nutrition);
        state.seed_admin().await?;
        Ok(state)
    }

    /// Create the configured admin account when no admin exists yet
    pub async fn seed_admin(&self) -> Result<()> {
        let users = UserRepository::new(self.db.clone());
        let seed = &self.config.admin;
        if let Some(admin) = users
            .ensure_admin(&seed.username, &seed.password, seed.email.clone())
            .await?
        {
            tracing::info!(username = %admin.username, "Seeded initial admin account");
            if seed.password == "admin123" {
                tracing::warn!("Initial admin uses the default password, change it");
            }
        }
        Ok(())
    }

    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }
}
