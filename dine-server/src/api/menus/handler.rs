//! Menu API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::core::ServerState;
use crate::db::models::{
    MenuItem, MenuItemCreate, MenuItemUpdate, MenuQuery, Nutrition, NutritionRequest,
};
use crate::db::repository::MenuRepository;
use crate::utils::{AppError, AppResult, ErrorCode, validate};

fn menu_item_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::MenuItemNotFound, format!("Menu item {id} not found"))
}

/// Estimate when asked to and there is something to estimate from
async fn maybe_estimate(
    state: &ServerState,
    requested: bool,
    composition: Option<&str>,
) -> AppResult<Option<Nutrition>> {
    match composition.map(str::trim).filter(|c| !c.is_empty()) {
        Some(composition) if requested => Ok(Some(state.nutrition.estimate(composition).await?)),
        _ => Ok(None),
    }
}

/// GET /api/menus?category=&available=
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<MenuQuery>,
) -> AppResult<Json<Vec<MenuItem>>> {
    let repo = MenuRepository::new(state.db.clone());
    Ok(Json(repo.find_all(&query).await?))
}

/// GET /api/menus/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MenuItem>> {
    let repo = MenuRepository::new(state.db.clone());
    let item = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| menu_item_not_found(id))?;
    Ok(Json(item))
}

/// POST /api/menus
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<MenuItemCreate>,
) -> AppResult<Json<MenuItem>> {
    validate(&payload)?;
    let nutrition = maybe_estimate(
        &state,
        payload.generate_nutrition,
        payload.composition.as_deref(),
    )
    .await?;

    let repo = MenuRepository::new(state.db.clone());
    let item = repo.create(payload, nutrition).await?;
    tracing::info!(item_id = item.id, name = %item.name, "Menu item created");
    Ok(Json(item))
}

/// PUT /api/menus/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<MenuItemUpdate>,
) -> AppResult<Json<MenuItem>> {
    validate(&payload)?;
    let repo = MenuRepository::new(state.db.clone());
    let existing = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| menu_item_not_found(id))?;

    let composition = payload
        .composition
        .as_deref()
        .or(existing.composition.as_deref());
    let nutrition = maybe_estimate(&state, payload.generate_nutrition, composition).await?;

    let item = repo.update(id, payload, nutrition).await?;
    Ok(Json(item))
}

/// DELETE /api/menus/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let repo = MenuRepository::new(state.db.clone());
    if !repo.delete(id).await? {
        return Err(menu_item_not_found(id));
    }
    tracing::info!(item_id = id, "Menu item deleted");
    Ok(Json(true))
}

/// POST /api/menus/nutrition - estimate without saving
pub async fn estimate_nutrition(
    State(state): State<ServerState>,
    Json(payload): Json<NutritionRequest>,
) -> AppResult<Json<Nutrition>> {
    validate(&payload)?;
    Ok(Json(state.nutrition.estimate(&payload.composition).await?))
}
