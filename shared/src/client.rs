//! Client-related types shared between server and client
//!
//! Request/response bodies that are not domain models.

use crate::models::{Order, Review, Role};
use crate::order::OrderStatus;
use serde::{Deserialize, Serialize};

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Authenticated user information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub permissions: Vec<String>,
}

// =============================================================================
// Payment / upload / health
// =============================================================================

/// Webhook acknowledgement body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationAck {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Result of a customer completing a served order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedOrder {
    pub order: Order,
    pub review: Review,
}

/// Stored upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
    pub size: usize,
    pub content_type: String,
}

/// Health check body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}
