//! Database Module
//!
//! Embedded SurrealDB (RocksDB engine), schema indexes and first-start
//! seeding.

pub mod models;
pub mod repository;

use crate::utils::AppError;
use std::path::Path;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

pub const NAMESPACE: &str = "dine";
pub const DATABASE: &str = "dine";

/// Indexes; tables stay schemaless
const SCHEMA: &str = r#"
DEFINE INDEX IF NOT EXISTS app_user_username ON app_user FIELDS username UNIQUE;
DEFINE INDEX IF NOT EXISTS dining_table_number ON dining_table FIELDS number UNIQUE;
DEFINE INDEX IF NOT EXISTS orders_gateway_order_id ON orders FIELDS gateway_order_id UNIQUE;
DEFINE INDEX IF NOT EXISTS orders_table_id ON orders FIELDS table_id;
DEFINE INDEX IF NOT EXISTS review_order_id ON review FIELDS order_id;
"#;

/// Database service, owns the SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the database at `db_path` and apply the schema
    pub async fn new(db_path: &Path) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        tracing::info!(path = %db_path.display(), "Database connection established (RocksDB)");

        db.query(SCHEMA)
            .await
            .and_then(|r| r.check())
            .map_err(|e| AppError::database(format!("Failed to apply schema: {e}")))?;
        tracing::info!("Database schema applied");

        Ok(Self { db })
    }
}
