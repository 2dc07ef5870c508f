//! Menu CRUD and nutrition estimates

mod common;

use common::TestApp;
use http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_create_with_estimated_nutrition() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let (status, item) = app
        .post(
            "/api/menus",
            Some(&admin),
            json!({
                "name": "Nasi Ayam",
                "price": 30000,
                "stock": 5,
                "composition": "Nasi 200g, Ayam 50g",
                "generate_nutrition": true,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{item}");
    assert_eq!(item["status"], "available");
    assert_eq!(item["nutrition"]["calories"], 379.5);
    assert_eq!(item["nutrition"]["protein"], 18.9);
}

#[tokio::test]
async fn test_estimate_endpoint_falls_back_to_keywords() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let (status, n) = app
        .post(
            "/api/menus/nutrition",
            Some(&admin),
            json!({ "composition": "Nasi 200g, Ayam 50g" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(n["carbs"], 56.0);

    let (status, _) = app
        .post("/api/menus/nutrition", Some(&admin), json!({ "composition": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_menu_is_public_and_filterable() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    app.create_menu_item(&admin, "Es Jeruk", 8_000, 0).await;
    let soto = app.create_menu_item(&admin, "Soto", 20_000, 3).await;

    let (status, all) = app.get("/api/menus", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, available) = app.get("/api/menus?available=true", None).await;
    let available = available.as_array().unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0]["id"], soto);
}

#[tokio::test]
async fn test_update_stock_refreshes_status() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let id = app.create_menu_item(&admin, "Bakso", 18_000, 2).await;

    let (status, item) = app
        .put(&format!("/api/menus/{id}"), Some(&admin), json!({ "stock": 0 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["stock"], 0);
    assert_eq!(item["status"], "unavailable");
    assert_eq!(item["name"], "Bakso");
}

#[tokio::test]
async fn test_delete_then_not_found() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let id = app.create_menu_item(&admin, "Gado-gado", 22_000, 4).await;

    let (status, _) = app.delete(&format!("/api/menus/{id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/api/menus/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&format!("/api/menus/{id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_rejects_out_of_stock_item() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let table_id = app.create_table(&admin, 30).await;
    let id = app.create_menu_item(&admin, "Rendang", 40_000, 1).await;
    app.add_to_cart(table_id, id, "Rendang", 40_000, 3).await;

    let (status, body) = app
        .post("/api/orders/checkout", None, json!({ "table_id": table_id }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["available"], 1);
    assert_eq!(body["details"]["requested"], 3);
}
