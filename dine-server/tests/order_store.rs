//! Transactional order writes at the repository level

mod common;

use common::TestApp;
use dine_server::db::models::ReviewQuery;
use dine_server::db::repository::review::new_review;
use dine_server::db::repository::{OrderRepository, ReviewRepository};
use http::StatusCode;
use serde_json::json;
use shared::order::OrderStatus;

/// Table 3 with 2 x Sate (30 000) in the cart, stock 10, checked out
async fn pending_order(app: &TestApp) -> (String, i64, i64, i64) {
    let admin = app.admin_token().await;
    let table_id = app.create_table(&admin, 3).await;
    let item_id = app.create_menu_item(&admin, "Sate", 30_000, 10).await;
    app.add_to_cart(table_id, item_id, "Sate", 30_000, 2).await;
    let order = app.checkout(table_id).await;
    (admin, table_id, item_id, order["id"].as_i64().unwrap())
}

#[tokio::test]
async fn test_settle_on_cancelled_order_changes_nothing() {
    let app = TestApp::new().await;
    let (admin, table_id, item_id, order_id) = pending_order(&app).await;
    let orders = OrderRepository::new(app.state.db.clone());

    let order = orders.find_by_id(order_id).await.unwrap().unwrap();
    let (status, _) = app.notify(&order.gateway_order_id, "cancel").await;
    assert_eq!(status, StatusCode::OK);

    // Stale snapshot still says pending; the guarded update must reject it
    assert_eq!(order.status, OrderStatus::Pending);
    let settled = orders.settle(&order, "settlement").await.unwrap();
    assert!(!settled);

    let current = orders.find_by_id(order_id).await.unwrap().unwrap();
    assert_eq!(current.status, OrderStatus::Cancelled);

    let (_, cart) = app.get(&format!("/api/cart/{table_id}"), None).await;
    assert_eq!(cart["is_active"], false);
    assert!(cart["queue_status"].is_null());
    assert_eq!(cart["items"][0]["quantity"], 2);

    let (_, table) = app
        .get(&format!("/api/tables/{table_id}"), Some(&admin))
        .await;
    assert_eq!(table["status"], "available");
    assert!(table["active_order_id"].is_null());

    let (_, item) = app.get(&format!("/api/menus/{item_id}"), None).await;
    assert_eq!(item["stock"], 10);
}

#[tokio::test]
async fn test_settle_applies_every_effect() {
    let app = TestApp::new().await;
    let (_, table_id, item_id, order_id) = pending_order(&app).await;
    let orders = OrderRepository::new(app.state.db.clone());

    let order = orders.find_by_id(order_id).await.unwrap().unwrap();
    assert!(orders.settle(&order, "capture").await.unwrap());

    let current = orders.find_by_id(order_id).await.unwrap().unwrap();
    assert_eq!(current.status, OrderStatus::Queue);
    assert_eq!(current.gateway_status.as_deref(), Some("capture"));

    let (_, cart) = app.get(&format!("/api/cart/{table_id}"), None).await;
    assert_eq!(cart["is_active"], true);
    assert!(cart["items"].as_array().unwrap().is_empty());

    let (_, item) = app.get(&format!("/api/menus/{item_id}"), None).await;
    assert_eq!(item["stock"], 8);
}

#[tokio::test]
async fn test_failed_review_write_keeps_order_served() {
    let app = TestApp::new().await;
    let (admin, table_id, _, order_id) = pending_order(&app).await;
    let orders = OrderRepository::new(app.state.db.clone());
    let reviews = ReviewRepository::new(app.state.db.clone());

    let order = orders.find_by_id(order_id).await.unwrap().unwrap();
    app.notify(&order.gateway_order_id, "settlement").await;
    for next in ["cooking", "served"] {
        let (status, _) = app
            .put(
                &format!("/api/orders/{order_id}/status"),
                Some(&admin),
                json!({ "status": next }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    let served = orders.find_by_id(order_id).await.unwrap().unwrap();
    assert_eq!(served.status, OrderStatus::Served);

    // Reusing an existing review key makes the insert fail inside the transaction
    let existing = reviews.create(order_id, table_id, 4, None).await.unwrap();
    let mut clash = new_review(order_id, table_id, 5, Some("Enak".into()));
    clash.id = existing.id;
    assert!(orders.complete(&served, clash).await.is_err());

    let current = orders.find_by_id(order_id).await.unwrap().unwrap();
    assert_eq!(current.status, OrderStatus::Served);
    let stored = reviews
        .find_all(&ReviewQuery {
            order_id: Some(order_id),
        })
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);

    // The customer can still complete
    let (status, done) = app
        .post(
            &format!("/api/orders/{order_id}/complete"),
            None,
            json!({ "rating": 5 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{done}");
    assert_eq!(done["order"]["status"], "done");
}

#[tokio::test]
async fn test_complete_on_order_that_left_served_is_skipped() {
    let app = TestApp::new().await;
    let (_, table_id, _, order_id) = pending_order(&app).await;
    let orders = OrderRepository::new(app.state.db.clone());
    let reviews = ReviewRepository::new(app.state.db.clone());

    let order = orders.find_by_id(order_id).await.unwrap().unwrap();
    let review = new_review(order_id, table_id, 5, None);
    assert!(!orders.complete(&order, review).await.unwrap());

    let stored = reviews
        .find_all(&ReviewQuery {
            order_id: Some(order_id),
        })
        .await
        .unwrap();
    assert!(stored.is_empty());
    let current = orders.find_by_id(order_id).await.unwrap().unwrap();
    assert_eq!(current.status, OrderStatus::Pending);
}
