//! Dining tables and their QR codes

mod common;

use common::TestApp;
use http::StatusCode;
use serde_json::json;
use shared::ErrorCode;

#[tokio::test]
async fn test_qr_is_stable_until_forced() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let table_id = app.create_table(&admin, 3).await;
    let uri = format!("/api/tables/{table_id}/qr");

    let (status, first) = app.get(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    let target = first["target_url"].as_str().unwrap();
    assert!(target.starts_with("http://dine.test/table/3?t="));
    assert!(first["image_data_url"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));

    let (_, again) = app.get(&uri, Some(&admin)).await;
    assert_eq!(again, first);

    let (_, forced) = app
        .get(&format!("{uri}?force_regenerate=true"), Some(&admin))
        .await;
    assert_ne!(forced["target_url"], first["target_url"]);

    let (_, after) = app.get(&uri, Some(&admin)).await;
    assert_eq!(after, forced);
}

#[tokio::test]
async fn test_delete_qr_then_regenerate() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let table_id = app.create_table(&admin, 4).await;
    let uri = format!("/api/tables/{table_id}/qr");

    let (_, first) = app.get(&uri, Some(&admin)).await;
    let (status, table) = app.delete(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(table["qr"].is_null());

    let (_, second) = app.get(&uri, Some(&admin)).await;
    assert_ne!(second["target_url"], first["target_url"]);
}

#[tokio::test]
async fn test_duplicate_number_conflicts() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    app.create_table(&admin, 9).await;

    let (status, body) = app
        .post("/api/tables", Some(&admin), json!({ "number": 9 }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        common::error_code(&body),
        u64::from(ErrorCode::TableNumberExists.code())
    );
}

#[tokio::test]
async fn test_public_lookup_by_number_hides_qr() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let table_id = app.create_table(&admin, 15).await;
    let (_, qr) = app
        .get(&format!("/api/tables/{table_id}/qr"), Some(&admin))
        .await;
    let token = qr["session_token"].as_str().unwrap();

    let (status, table) = app
        .get(&format!("/api/tables/number/15?t={token}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(table["id"], table_id);
    assert_eq!(table["name"], "Table 15");
    assert!(table["qr"].is_null());

    let (status, _) = app.get("/api/tables/number/16?t=abc", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn assert_expired(status: StatusCode, body: &serde_json::Value) {
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
    assert_eq!(
        common::error_code(body),
        u64::from(ErrorCode::QrCodeExpired.code())
    );
}

#[tokio::test]
async fn test_regenerated_qr_retires_printed_code() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let table_id = app.create_table(&admin, 21).await;
    let qr_uri = format!("/api/tables/{table_id}/qr");

    // No code generated yet: nothing to scan
    let (status, body) = app.get("/api/tables/number/21", None).await;
    assert_expired(status, &body);

    let (_, printed) = app.get(&qr_uri, Some(&admin)).await;
    let old_token = printed["session_token"].as_str().unwrap().to_string();
    assert!(printed["target_url"]
        .as_str()
        .unwrap()
        .ends_with(&format!("?t={old_token}")));

    let (status, body) = app.get("/api/tables/number/21", None).await;
    assert_expired(status, &body);
    let (status, body) = app.get("/api/tables/number/21?t=guess", None).await;
    assert_expired(status, &body);

    let (_, fresh) = app
        .get(&format!("{qr_uri}?force_regenerate=true"), Some(&admin))
        .await;
    let new_token = fresh["session_token"].as_str().unwrap();
    assert_ne!(new_token, old_token);

    let (status, body) = app
        .get(&format!("/api/tables/number/21?t={old_token}"), None)
        .await;
    assert_expired(status, &body);
    let (status, _) = app
        .get(&format!("/api/tables/number/21?t={new_token}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Deleting the code retires it as well
    app.delete(&qr_uri, Some(&admin)).await;
    let (status, body) = app
        .get(&format!("/api/tables/number/21?t={new_token}"), None)
        .await;
    assert_expired(status, &body);
}

#[tokio::test]
async fn test_table_management_requires_permission() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let staff = app.staff_token(&admin).await;

    let (status, _) = app.get("/api/tables", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Staff can read but not manage
    let (status, _) = app.get("/api/tables", Some(&staff)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .post("/api/tables", Some(&staff), json!({ "number": 1 }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_renumber_clears_qr_and_delete_removes_table() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let table_id = app.create_table(&admin, 20).await;
    app.get(&format!("/api/tables/{table_id}/qr"), Some(&admin))
        .await;

    let (status, table) = app
        .put(
            &format!("/api/tables/{table_id}"),
            Some(&admin),
            json!({ "number": 21 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(table["number"], 21);
    assert!(table["qr"].is_null());

    let (status, _) = app
        .delete(&format!("/api/tables/{table_id}"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .get(&format!("/api/tables/{table_id}"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
