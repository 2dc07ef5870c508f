//! Authentication Handlers
//!
//! Login issues a JWT both in the body and as an HttpOnly cookie.

use std::time::Duration;

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, HeaderValue, header::SET_COOKIE},
};
use shared::client::{LoginRequest, LoginResponse, UserInfo};

use crate::auth::permissions::permissions_for;
use crate::auth::{CurrentUser, TOKEN_COOKIE};
use crate::core::ServerState;
use crate::db::repository::UserRepository;
use crate::security_log;
use crate::utils::{AppError, ErrorCode};

/// Every login attempt takes at least this long, found or not
const AUTH_FIXED_DELAY_MS: u64 = 200;

fn session_cookie(token: &str, max_age: i64, secure: bool) -> Result<HeaderValue, AppError> {
    let mut cookie = format!("{TOKEN_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|e| AppError::internal(format!("Invalid cookie: {e}")))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<LoginResponse>), AppError> {
    let repo = UserRepository::new(state.get_db());
    let username = req.username.trim().to_string();
    let user = repo.find_by_username(&username).await?;

    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Same message for unknown user and wrong password
    let user = match user {
        Some(u) => {
            let valid = u
                .verify_password(&req.password)
                .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;
            if !valid {
                security_log!("WARN", "login_failed", username = username.clone(), reason = "invalid_password");
                return Err(AppError::invalid_credentials());
            }
            u
        }
        None => {
            security_log!("WARN", "login_failed", username = username.clone(), reason = "user_not_found");
            return Err(AppError::invalid_credentials());
        }
    };

    if !user.is_active {
        security_log!("WARN", "login_disabled", username = username.clone());
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let permissions = permissions_for(user.role);
    let token = state
        .jwt_service
        .generate_token(user.id, &user.username, user.role, &permissions)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;
    let expires_in = state.jwt_service.expires_in_seconds();

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        session_cookie(&token, expires_in, state.config.is_production())?,
    );

    tracing::info!(user_id = user.id, username = %user.username, role = %user.role, "User logged in");

    Ok((
        headers,
        Json(LoginResponse {
            token,
            expires_in,
            user: UserInfo {
                id: user.id,
                username: user.username,
                role: user.role,
                permissions,
            },
        }),
    ))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<UserInfo>, AppError> {
    // Deleted or disabled accounts lose access even with a live token
    let record = UserRepository::new(state.get_db())
        .find_by_id(user.id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(AppError::unauthorized)?;

    Ok(Json(UserInfo {
        id: record.id,
        username: record.username,
        role: record.role,
        permissions: user.permissions,
    }))
}

/// POST /api/auth/logout - clears the session cookie
pub async fn logout(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<(HeaderMap, Json<bool>), AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, session_cookie("", 0, state.config.is_production())?);
    tracing::info!(user_id = user.id, username = %user.username, "User logged out");
    Ok((headers, Json(true)))
}
