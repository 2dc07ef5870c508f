//! Startup and runtime errors of the server process
//!
//! Request handlers use [`AppError`](shared::error::AppError); this type only
//! covers bringing the process up and down.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<shared::error::AppError> for ServerError {
    fn from(err: shared::error::AppError) -> Self {
        ServerError::Database(err.message)
    }
}

impl From<crate::db::repository::RepoError> for ServerError {
    fn from(err: crate::db::repository::RepoError) -> Self {
        ServerError::Database(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
