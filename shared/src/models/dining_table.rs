//! Dining Table Model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Table occupancy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    #[default]
    Available,
    Occupied,
    Reserved,
}

/// Rendered QR code for a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrPayload {
    /// `data:image/png;base64,...`
    pub image_data_url: String,
    /// Raw PNG, base64
    pub image_bytes: String,
    /// URL encoded in the code
    pub target_url: String,
    /// `t` parameter of `target_url`; a lookup must present it
    #[serde(default)]
    pub session_token: String,
    pub generated_at: i64,
}

impl QrPayload {
    /// Whether a scanned `t` belongs to this code
    pub fn accepts(&self, token: Option<&str>) -> bool {
        match token.map(str::trim) {
            Some(t) => !self.session_token.is_empty() && t == self.session_token,
            None => false,
        }
    }
}

/// Dining table entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: i64,
    pub number: i32,
    pub name: String,
    #[serde(default)]
    pub capacity: i32,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: TableStatus,
    #[serde(default)]
    pub active_order_id: Option<i64>,
    #[serde(default)]
    pub qr: Option<QrPayload>,
    #[serde(default)]
    pub created_at: i64,
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DiningTableCreate {
    #[validate(range(min = 1))]
    pub number: i32,
    /// Defaults to "Table {number}"
    #[serde(default)]
    #[validate(length(max = 100))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, max = 100))]
    pub capacity: Option<i32>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Update dining table payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DiningTableUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub number: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 100))]
    pub capacity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TableStatus>,
}

/// Public lookup of a scanned code: `t` from the QR URL
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableLookupQuery {
    #[serde(default)]
    pub t: Option<String>,
}

/// QR lookup options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QrQuery {
    #[serde(default)]
    pub force_regenerate: bool,
}
