//! Login, session cookie and permission checks

mod common;

use axum::body::Body;
use common::{ADMIN_PASS, ADMIN_USER, TestApp};
use http::{Request, StatusCode, header};
use serde_json::json;
use shared::ErrorCode;
use tower::ServiceExt;

#[tokio::test]
async fn test_login_returns_token_and_cookie() {
    let app = TestApp::new().await;
    let req = Request::post("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "username": ADMIN_USER, "password": ADMIN_PASS }).to_string(),
        ))
        .unwrap();

    let response = app.app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_wrong_password_and_unknown_user_look_the_same() {
    let app = TestApp::new().await;

    let (status, wrong) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "username": ADMIN_USER, "password": "nope" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "username": "ghost", "password": "nope" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
    assert_eq!(
        common::error_code(&wrong),
        u64::from(ErrorCode::InvalidCredentials.code())
    );
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        common::error_code(&body),
        u64::from(ErrorCode::NotAuthenticated.code())
    );

    let token = app.admin_token().await;
    let (status, me) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], ADMIN_USER);
    assert_eq!(me["role"], "admin");
}

#[tokio::test]
async fn test_cookie_session_is_accepted() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let req = Request::get("/api/auth/me")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_staff_cannot_manage_menu_or_users() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let staff = app.staff_token(&admin).await;

    let (status, body) = app
        .post(
            "/api/menus",
            Some(&staff),
            json!({ "name": "Soto", "price": 20000 }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        common::error_code(&body),
        u64::from(ErrorCode::PermissionDenied.code())
    );

    let (status, _) = app.get("/api/users", Some(&staff)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_disabled_account_cannot_log_in() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (_, user) = app
        .post(
            "/api/users",
            Some(&admin),
            json!({ "username": "temp", "password": "temp-pass" }),
        )
        .await;

    let (status, _) = app
        .put(
            &format!("/api/users/{}", user["id"]),
            Some(&admin),
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "username": "temp", "password": "temp-pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        common::error_code(&body),
        u64::from(ErrorCode::AccountDisabled.code())
    );
}
