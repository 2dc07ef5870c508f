//! Review Model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Customer review of a finished order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub order_id: i64,
    pub table_id: i64,
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: i64,
}

/// Create review payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReviewCreate {
    pub order_id: i64,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

/// Review list filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewQuery {
    #[serde(default)]
    pub order_id: Option<i64>,
}
