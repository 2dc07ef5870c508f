//! User API Handlers
//!
//! Password hashes never leave the repository; responses are [`User`].

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{User, UserCreate, UserUpdate};
use crate::db::repository::{RepoError, UserRepository};
use crate::security_log;
use crate::utils::{AppError, AppResult, ErrorCode, validate};

fn user_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::UserNotFound, format!("User {id} not found"))
}

fn map_repo_error(e: RepoError) -> AppError {
    match e {
        RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::UsernameExists, msg),
        RepoError::NotFound(msg) => AppError::with_message(ErrorCode::UserNotFound, msg),
        other => other.into(),
    }
}

/// GET /api/users
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<User>>> {
    let repo = UserRepository::new(state.db.clone());
    let users = repo.find_all().await?;
    Ok(Json(users.into_iter().map(User::from).collect()))
}

/// GET /api/users/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo.find_by_id(id).await?.ok_or_else(|| user_not_found(id))?;
    Ok(Json(user.into()))
}

/// POST /api/users
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<UserCreate>,
) -> AppResult<Json<User>> {
    validate(&payload)?;
    let repo = UserRepository::new(state.db.clone());
    let user = repo.create(payload).await.map_err(map_repo_error)?;

    security_log!(
        "INFO",
        "user_created",
        user_id = user.id,
        username = user.username.clone(),
        by = current_user.username.clone()
    );
    Ok(Json(user.into()))
}

/// PUT /api/users/{id}
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<User>> {
    validate(&payload)?;

    // No self-lockout
    if id == current_user.id
        && (payload.is_active == Some(false)
            || payload.role.is_some_and(|r| r != current_user.role))
    {
        return Err(AppError::with_message(
            ErrorCode::CannotDeleteSelf,
            "Cannot deactivate or demote your own account",
        ));
    }

    let repo = UserRepository::new(state.db.clone());
    let user = repo.update(id, payload).await.map_err(map_repo_error)?;

    security_log!(
        "INFO",
        "user_updated",
        user_id = user.id,
        by = current_user.username.clone()
    );
    Ok(Json(user.into()))
}

/// DELETE /api/users/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    if id == current_user.id {
        return Err(AppError::new(ErrorCode::CannotDeleteSelf));
    }

    let repo = UserRepository::new(state.db.clone());
    if !repo.delete(id).await? {
        return Err(user_not_found(id));
    }

    security_log!(
        "WARN",
        "user_deleted",
        user_id = id,
        by = current_user.username.clone()
    );
    Ok(Json(true))
}
