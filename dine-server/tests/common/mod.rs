//! Shared harness: a real app on a temp RocksDB with a fake gateway

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use dine_server::core::config::AdminSeed;
use dine_server::db::DbService;
use dine_server::db::models::Order;
use dine_server::services::{
    GatewayNotification, KeywordEstimator, PaymentError, PaymentGateway, SnapTransaction,
};
use dine_server::{Config, ServerState};
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASS: &str = "admin-secret";

/// Gateway double: fixed session, optional outage, scripted status
#[derive(Default)]
pub struct FakeGateway {
    pub fail: AtomicBool,
    pub status: std::sync::Mutex<Option<GatewayNotification>>,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_transaction(&self, order: &Order) -> Result<SnapTransaction, PaymentError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PaymentError::Rejected {
                status: 500,
                message: "gateway down".into(),
            });
        }
        Ok(SnapTransaction {
            token: format!("snap-{}", order.gateway_order_id),
            redirect_url: format!("https://pay.test/{}", order.gateway_order_id),
        })
    }

    async fn transaction_status(
        &self,
        gateway_order_id: &str,
    ) -> Result<GatewayNotification, PaymentError> {
        let scripted = self.status.lock().unwrap().clone();
        scripted
            .map(|mut n| {
                n.order_id = gateway_order_id.to_string();
                n
            })
            .ok_or_else(|| PaymentError::InvalidResponse("no scripted status".into()))
    }
}

pub struct TestApp {
    pub app: Router,
    pub state: ServerState,
    pub gateway: Arc<FakeGateway>,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(tweak: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::with_overrides(dir.path().to_string_lossy(), 0);
        config.public_base_url = "http://dine.test".into();
        config.midtrans.verify_signature = false;
        config.midtrans.server_key = "test-server-key".into();
        config.admin = AdminSeed {
            username: ADMIN_USER.into(),
            password: ADMIN_PASS.into(),
            email: None,
        };
        tweak(&mut config);
        config.ensure_work_dir_structure().unwrap();

        let db = DbService::new(&dir.path().join("test.db")).await.unwrap().db;
        let gateway = Arc::new(FakeGateway::default());
        let state = ServerState::with_services(
            config,
            db,
            gateway.clone(),
            Arc::new(KeywordEstimator),
        );
        state.seed_admin().await.unwrap();

        Self {
            app: dine_server::api::build_app(state.clone()),
            state,
            gateway,
            _dir: dir,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, token, None).await
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .post(
                "/api/auth/login",
                None,
                json!({ "username": username, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_USER, ADMIN_PASS).await
    }

    /// Create a staff account and log in as it
    pub async fn staff_token(&self, admin: &str) -> String {
        let (status, body) = self
            .post(
                "/api/users",
                Some(admin),
                json!({ "username": "kitchen", "password": "kitchen-pass", "role": "staff" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create staff failed: {body}");
        self.login("kitchen", "kitchen-pass").await
    }

    pub async fn create_table(&self, admin: &str, number: i32) -> i64 {
        let (status, body) = self
            .post("/api/tables", Some(admin), json!({ "number": number }))
            .await;
        assert_eq!(status, StatusCode::OK, "create table failed: {body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn create_menu_item(&self, admin: &str, name: &str, price: i64, stock: i32) -> i64 {
        let (status, body) = self
            .post(
                "/api/menus",
                Some(admin),
                json!({ "name": name, "price": price, "stock": stock }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create menu item failed: {body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn add_to_cart(&self, table_id: i64, item_id: i64, name: &str, price: i64, qty: i32) {
        let (status, body) = self
            .post(
                &format!("/api/cart/{table_id}/items"),
                None,
                json!({ "item_id": item_id, "name": name, "price": price, "quantity": qty }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "add to cart failed: {body}");
    }

    pub async fn checkout(&self, table_id: i64) -> Value {
        let (status, body) = self
            .post("/api/orders/checkout", None, json!({ "table_id": table_id }))
            .await;
        assert_eq!(status, StatusCode::OK, "checkout failed: {body}");
        body
    }

    pub async fn notify(&self, gateway_order_id: &str, transaction_status: &str) -> (StatusCode, Value) {
        self.post(
            "/api/payment/notification",
            None,
            json!({
                "order_id": gateway_order_id,
                "transaction_status": transaction_status,
                "status_code": "200",
                "gross_amount": "50000.00",
            }),
        )
        .await
    }
}

pub fn parse<T: DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).unwrap()
}

pub fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap()
}

pub fn error_code(body: &Value) -> u64 {
    body["code"].as_u64().unwrap_or_default()
}
