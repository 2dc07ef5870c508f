//! Utilities
//!
//! - [`AppError`] / [`ApiResponse`] - re-exported from `shared::error`
//! - [`logger`] - tracing subscriber setup
//! - [`validation`] - `validator` integration

pub mod logger;
pub mod validation;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use validation::validate;
