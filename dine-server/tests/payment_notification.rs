//! Gateway webhook and manual status refresh

mod common;

use common::TestApp;
use dine_server::orders::reconcile::expected_signature;
use dine_server::services::GatewayNotification;
use http::StatusCode;
use serde_json::json;

async fn pending_order(app: &TestApp) -> (String, serde_json::Value) {
    let admin = app.admin_token().await;
    let table_id = app.create_table(&admin, 12).await;
    let item_id = app.create_menu_item(&admin, "Mie Ayam", 25_000, 5).await;
    app.add_to_cart(table_id, item_id, "Mie Ayam", 25_000, 2).await;
    (admin, app.checkout(table_id).await)
}

#[tokio::test]
async fn test_missing_fields_are_bad_request() {
    let app = TestApp::new().await;
    let (status, ack) = app
        .post("/api/payment/notification", None, json!({ "order_id": "DINE-1-1" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(ack["success"], false);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = TestApp::new().await;
    let (status, ack) = app
        .post("/api/payment/notification", None, json!("not an object"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(ack["success"], false);
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let app = TestApp::new().await;
    let (status, ack) = app.notify("DINE-99-12345", "settlement").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(ack["success"], false);
}

#[tokio::test]
async fn test_unknown_status_is_rejected() {
    let app = TestApp::new().await;
    let (_, order) = pending_order(&app).await;
    let (status, _) = app
        .notify(order["gateway_order_id"].as_str().unwrap(), "teleported")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pending_notification_keeps_order_pending() {
    let app = TestApp::new().await;
    let (_, order) = pending_order(&app).await;
    let (status, ack) = app
        .notify(order["gateway_order_id"].as_str().unwrap(), "pending")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "pending");

    let (_, current) = app.get(&format!("/api/orders/{}", order["id"]), None).await;
    assert_eq!(current["gateway_status"], "pending");
}

#[tokio::test]
async fn test_refund_is_recorded_without_status_change() {
    let app = TestApp::new().await;
    let (_, order) = pending_order(&app).await;
    let gateway_id = order["gateway_order_id"].as_str().unwrap();
    app.notify(gateway_id, "settlement").await;

    let (status, ack) = app.notify(gateway_id, "refund").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "queue");

    let (_, current) = app.get(&format!("/api/orders/{}", order["id"]), None).await;
    assert_eq!(current["status"], "queue");
    assert_eq!(current["gateway_status"], "refund");
}

#[tokio::test]
async fn test_signature_enforced_when_enabled() {
    let app = TestApp::with_config(|c| c.midtrans.verify_signature = true).await;
    let (_, order) = pending_order(&app).await;
    let gateway_id = order["gateway_order_id"].as_str().unwrap();

    let (status, body) = app.notify(gateway_id, "settlement").await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let signature = expected_signature(gateway_id, "200", "50000.00", "test-server-key");
    let (status, ack) = app
        .post(
            "/api/payment/notification",
            None,
            json!({
                "order_id": gateway_id,
                "transaction_status": "settlement",
                "status_code": "200",
                "gross_amount": "50000.00",
                "signature_key": signature,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "queue");
}

#[tokio::test]
async fn test_status_refresh_reconciles_missed_webhook() {
    let app = TestApp::with_config(|c| c.midtrans.verify_signature = true).await;
    let (admin, order) = pending_order(&app).await;
    *app.gateway.status.lock().unwrap() = Some(GatewayNotification {
        transaction_status: "settlement".into(),
        status_code: Some("200".into()),
        gross_amount: Some("50000.00".into()),
        ..Default::default()
    });

    let uri = format!("/api/payment/status/{}", order["id"]);
    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Pulled from the gateway, so no signature is required
    let (status, ack) = app.get(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK, "{ack}");
    assert_eq!(ack["status"], "queue");
}

#[tokio::test]
async fn test_status_refresh_for_unknown_order() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (status, ack) = app.get("/api/payment/status/777", Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(ack["success"], false);
}
