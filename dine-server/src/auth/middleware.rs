//! Authentication middleware
//!
//! Axum middleware for JWT authentication and authorization.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::Method;

use crate::AppError;
use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;

/// Name of the session cookie set at login
pub const TOKEN_COOKIE: &str = "token";

/// Routes reachable without a token: `(method, pattern)`, `{}` matches one
/// path segment.
pub const PUBLIC_ROUTES: &[(&str, &str)] = &[
    ("POST", "/api/auth/login"),
    ("GET", "/api/health"),
    ("GET", "/api/restaurant"),
    ("GET", "/api/menus"),
    ("GET", "/api/menus/{}"),
    ("GET", "/api/tables/number/{}"),
    ("GET", "/api/cart/{}"),
    ("DELETE", "/api/cart/{}"),
    ("POST", "/api/cart/{}/items"),
    ("PUT", "/api/cart/{}/items/{}"),
    ("DELETE", "/api/cart/{}/items/{}"),
    ("POST", "/api/orders/checkout"),
    ("GET", "/api/orders/table/{}"),
    ("GET", "/api/orders/{}"),
    ("DELETE", "/api/orders/{}"),
    ("POST", "/api/orders/{}/complete"),
    ("POST", "/api/payment/notification"),
    ("POST", "/api/reviews"),
    ("GET", "/api/image/{}"),
];

fn pattern_matches(pattern: &str, path: &str) -> bool {
    let mut pat = pattern.trim_end_matches('/').split('/');
    let mut seg = path.trim_end_matches('/').split('/');
    loop {
        match (pat.next(), seg.next()) {
            (None, None) => return true,
            (Some("{}"), Some(s)) if !s.is_empty() => {}
            (Some(p), Some(s)) if p == s => {}
            _ => return false,
        }
    }
}

/// Whether `method path` is served without authentication
pub fn is_public_route(method: &Method, path: &str) -> bool {
    // Literal segments win over `{}`: `/api/orders/history` is not `/api/orders/{}`
    if path == "/api/orders/history" {
        return false;
    }
    PUBLIC_ROUTES
        .iter()
        .any(|(m, pattern)| *m == method.as_str() && pattern_matches(pattern, path))
}

/// Pull the token from `Authorization: Bearer` or the session cookie
pub fn token_from_headers(headers: &http::HeaderMap) -> Result<Option<String>, AppError> {
    if let Some(header) = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        return JwtService::extract_from_header(header)
            .map(|t| Some(t.to_string()))
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"));
    }

    let cookie_token = headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|v| !v.is_empty());

    Ok(cookie_token)
}

/// Map a validation failure to the API error and log it
pub(crate) fn reject(e: JwtError, uri: &http::Uri) -> AppError {
    security_log!(
        "WARN",
        "auth_failed",
        error = format!("{}", e),
        uri = format!("{:?}", uri)
    );
    match e {
        JwtError::ExpiredToken => AppError::token_expired(),
        _ => AppError::invalid_token("Invalid token"),
    }
}

/// Authentication middleware
///
/// Validates the token on every `/api/` route not listed in
/// [`PUBLIC_ROUTES`] and injects [`CurrentUser`] into the request
/// extensions. `OPTIONS` and non-API paths pass through.
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    if req.method() == Method::OPTIONS || !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    if is_public_route(req.method(), path) {
        return Ok(next.run(req).await);
    }

    let Some(token) = token_from_headers(req.headers())? else {
        security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
        return Err(AppError::unauthorized());
    };

    let claims = state
        .jwt_service
        .validate_token(&token)
        .map_err(|e| reject(e, req.uri()))?;
    let user = CurrentUser::try_from(claims).map_err(|e| reject(e, req.uri()))?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Permission middleware
///
/// ```ignore
/// Router::new()
///     .route("/", post(handler::create))
///     .layer(middleware::from_fn(require_permission("menu:manage")));
/// ```
///
/// Missing permission is 403.
pub fn require_permission(
    permission: &'static str,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or(AppError::unauthorized())?;

            if !user.has_permission(permission) {
                security_log!(
                    "WARN",
                    "permission_denied",
                    user_id = user.id,
                    username = user.username.clone(),
                    required_permission = permission
                );
                return Err(AppError::forbidden(format!(
                    "Permission denied: {}",
                    permission
                )));
            }

            Ok(next.run(req).await)
        })
    }
}

/// Admin-only middleware
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::unauthorized())?;
    if !user.is_admin() {
        security_log!(
            "WARN",
            "admin_required",
            user_id = user.id,
            username = user.username.clone()
        );
        return Err(AppError::new(shared::ErrorCode::AdminRequired));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_routes() {
        assert!(is_public_route(&Method::POST, "/api/auth/login"));
        assert!(is_public_route(&Method::GET, "/api/menus"));
        assert!(is_public_route(&Method::GET, "/api/menus/123"));
        assert!(is_public_route(&Method::POST, "/api/cart/5/items"));
        assert!(is_public_route(&Method::GET, "/api/orders/table/5"));
        assert!(is_public_route(&Method::POST, "/api/payment/notification"));

        assert!(!is_public_route(&Method::POST, "/api/menus"));
        assert!(!is_public_route(&Method::POST, "/api/cart/5/activate"));
        assert!(!is_public_route(&Method::GET, "/api/orders"));
        assert!(!is_public_route(&Method::GET, "/api/orders/history"));
        assert!(!is_public_route(&Method::PUT, "/api/orders/5/status"));
        assert!(!is_public_route(&Method::GET, "/api/tables/5"));
        assert!(!is_public_route(&Method::GET, "/api/auth/me"));
    }

    #[test]
    fn test_token_from_cookie() {
        let mut headers = http::HeaderMap::new();
        headers.insert(
            http::header::COOKIE,
            "theme=dark; token=abc.def.ghi".parse().unwrap(),
        );
        assert_eq!(
            token_from_headers(&headers).unwrap().as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn test_bearer_wins_over_cookie() {
        let mut headers = http::HeaderMap::new();
        headers.insert(http::header::AUTHORIZATION, "Bearer xyz".parse().unwrap());
        headers.insert(http::header::COOKIE, "token=abc".parse().unwrap());
        assert_eq!(token_from_headers(&headers).unwrap().as_deref(), Some("xyz"));

        headers.insert(http::header::AUTHORIZATION, "Token xyz".parse().unwrap());
        assert!(token_from_headers(&headers).is_err());
    }
}
