//! JWT Extractor
//!
//! Lets handlers take a [`CurrentUser`] argument directly.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::AppError;
use crate::auth::CurrentUser;
use crate::auth::middleware::{reject, token_from_headers};
use crate::core::ServerState;
use crate::security_log;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Already validated by the middleware
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let Some(token) = token_from_headers(&parts.headers)? else {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
            return Err(AppError::unauthorized());
        };

        let claims = state
            .jwt_service
            .validate_token(&token)
            .map_err(|e| reject(e, &parts.uri))?;
        let user = CurrentUser::try_from(claims).map_err(|e| reject(e, &parts.uri))?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
