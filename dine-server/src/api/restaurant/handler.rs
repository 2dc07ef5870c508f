//! Restaurant Profile API Handlers

use axum::{Json, extract::State};

use crate::core::ServerState;
use crate::db::models::{RestaurantProfile, RestaurantUpdate};
use crate::db::repository::RestaurantRepository;
use crate::utils::{AppResult, validate};

/// GET /api/restaurant - empty profile until first saved
pub async fn get(State(state): State<ServerState>) -> AppResult<Json<RestaurantProfile>> {
    let repo = RestaurantRepository::new(state.db.clone());
    Ok(Json(repo.get_or_default().await?))
}

/// PUT /api/restaurant - partial update
pub async fn update(
    State(state): State<ServerState>,
    Json(payload): Json<RestaurantUpdate>,
) -> AppResult<Json<RestaurantProfile>> {
    validate(&payload)?;
    let repo = RestaurantRepository::new(state.db.clone());
    let profile = repo.update(payload).await?;
    tracing::info!(name = %profile.name, "Restaurant profile updated");
    Ok(Json(profile))
}
