//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::core::ServerState;
use crate::db::models::{
    DiningTable, DiningTableCreate, DiningTableUpdate, QrPayload, QrQuery, TableLookupQuery,
    TableStatus,
};
use crate::db::repository::{CartRepository, DiningTableRepository, RepoError};
use crate::services::qr;
use crate::utils::{AppError, AppResult, ErrorCode, validate};

fn table_not_found(id: impl std::fmt::Display) -> AppError {
    AppError::with_message(ErrorCode::TableNotFound, format!("Table {id} not found"))
}

fn map_duplicate(err: RepoError) -> AppError {
    match err {
        RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::TableNumberExists, msg),
        other => other.into(),
    }
}

async fn load(repo: &DiningTableRepository, id: i64) -> AppResult<DiningTable> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| table_not_found(id))
}

/// GET /api/tables
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<DiningTable>>> {
    let repo = DiningTableRepository::new(state.db.clone());
    Ok(Json(repo.find_all().await?))
}

/// GET /api/tables/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DiningTable>> {
    let repo = DiningTableRepository::new(state.db.clone());
    Ok(Json(load(&repo, id).await?))
}

/// GET /api/tables/number/{number}?t= - public, QR payload stripped
///
/// `t` must match the table's current QR code; regenerating or deleting
/// the code retires printed copies.
pub async fn get_by_number(
    State(state): State<ServerState>,
    Path(number): Path<i32>,
    Query(query): Query<TableLookupQuery>,
) -> AppResult<Json<DiningTable>> {
    let repo = DiningTableRepository::new(state.db.clone());
    let mut table = repo
        .find_by_number(number)
        .await?
        .ok_or_else(|| table_not_found(format!("number {number}")))?;

    let valid = table
        .qr
        .as_ref()
        .is_some_and(|qr| qr.accepts(query.t.as_deref()));
    if !valid {
        tracing::info!(table = number, "Rejected lookup with stale or missing QR token");
        return Err(AppError::with_message(
            ErrorCode::QrCodeExpired,
            format!("QR code for table {number} is no longer valid"),
        ));
    }

    table.qr = None;
    Ok(Json(table))
}

/// POST /api/tables
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<DiningTableCreate>,
) -> AppResult<Json<DiningTable>> {
    validate(&payload)?;
    let repo = DiningTableRepository::new(state.db.clone());
    let table = repo.create(payload).await.map_err(map_duplicate)?;
    tracing::info!(table_id = table.id, number = table.number, "Table created");
    Ok(Json(table))
}

/// PUT /api/tables/{id}
///
/// Renumbering drops the stored QR code, its URL points at the old number.
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<DiningTableUpdate>,
) -> AppResult<Json<DiningTable>> {
    validate(&payload)?;
    let repo = DiningTableRepository::new(state.db.clone());
    let before = load(&repo, id).await?;

    let mut table = repo.update(id, payload).await.map_err(map_duplicate)?;
    if table.number != before.number && table.qr.is_some() {
        table = repo.set_qr(id, None).await?;
    }
    Ok(Json(table))
}

/// DELETE /api/tables/{id} - refused while a paid order holds the table
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let repo = DiningTableRepository::new(state.db.clone());
    let table = load(&repo, id).await?;
    if table.status == TableStatus::Occupied {
        return Err(AppError::conflict(format!(
            "Table {} is occupied and cannot be deleted",
            table.number
        )));
    }

    repo.delete(id).await?;
    CartRepository::new(state.db.clone()).delete(id).await?;
    tracing::info!(table_id = id, number = table.number, "Table deleted");
    Ok(Json(true))
}

/// GET /api/tables/{id}/qr?force_regenerate=
///
/// Returns the stored code; renders a new one only when none exists or
/// when forced.
pub async fn get_qr(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Query(query): Query<QrQuery>,
) -> AppResult<Json<QrPayload>> {
    let repo = DiningTableRepository::new(state.db.clone());
    let table = load(&repo, id).await?;

    if let Some(existing) = table.qr
        && !query.force_regenerate
    {
        return Ok(Json(existing));
    }

    let payload = qr::generate(&state.config.public_base_url, table.number)?;
    repo.set_qr(id, Some(payload.clone())).await?;
    tracing::info!(
        table_id = id,
        number = table.number,
        forced = query.force_regenerate,
        "QR code generated"
    );
    Ok(Json(payload))
}

/// DELETE /api/tables/{id}/qr
pub async fn delete_qr(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DiningTable>> {
    let repo = DiningTableRepository::new(state.db.clone());
    load(&repo, id).await?;
    Ok(Json(repo.set_qr(id, None).await?))
}
