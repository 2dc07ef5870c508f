//! Repository Module
//!
//! All SurrealQL lives here; handlers and services only see typed methods.

pub mod cart;
pub mod dining_table;
pub mod menu;
pub mod order;
pub mod restaurant;
pub mod review;
pub mod user;

pub use cart::CartRepository;
pub use dining_table::DiningTableRepository;
pub use menu::MenuRepository;
pub use order::OrderRepository;
pub use restaurant::RestaurantRepository;
pub use review::ReviewRepository;
pub use user::UserRepository;

use shared::error::{AppError, ErrorCode};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        // Unique index violations surface as "Database index `x` already contains ..."
        if msg.contains("already contains") {
            RepoError::Duplicate(msg)
        } else {
            RepoError::Database(msg)
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::conflict(msg),
            RepoError::Database(msg) => AppError::database(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID convention
// =============================================================================
//
// Records are keyed by snowflake i64: `menu_item:123456`.
//   - build:  RecordId::from_table_key("menu_item", id)
//   - read:   SELECT *, record::id(id) AS id FROM ...  (plain i64 in the row)
//   - create: INSERT INTO menu_item $data, where $data.id is the key

/// Record id for a table/key pair
pub fn thing(table: &str, id: i64) -> RecordId {
    RecordId::from_table_key(table, id)
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }

    /// `SELECT` a single row by key with the numeric id projected
    pub async fn find_one<T>(&self, table: &'static str, id: i64) -> RepoResult<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let rows: Vec<T> = self
            .db
            .query("SELECT *, record::id(id) AS id FROM $thing")
            .bind(("thing", thing(table, id)))
            .await?
            .take(0)?;
        Ok(rows.into_iter().next())
    }

    /// Insert a row whose `id` field becomes the record key
    pub async fn insert<T>(&self, table: &'static str, data: T) -> RepoResult<()>
    where
        T: serde::Serialize + 'static,
    {
        self.db
            .query(format!("INSERT INTO {table} $data RETURN NONE"))
            .bind(("data", data))
            .await?
            .check()?;
        Ok(())
    }

    /// Hard delete; returns whether the row existed
    pub async fn delete(&self, table: &'static str, id: i64) -> RepoResult<bool> {
        let mut result = self
            .db
            .query("SELECT VALUE record::id(id) FROM $thing; DELETE $thing;")
            .bind(("thing", thing(table, id)))
            .await?
            .check()?;
        let existed: Vec<i64> = result.take(0)?;
        Ok(!existed.is_empty())
    }
}
