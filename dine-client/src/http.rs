//! HTTP client for the Dine REST API
//!
//! Success bodies are the resource itself; error bodies are
//! `{ code, message, details }` and surface as [`ClientError::Api`].

use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::client::{CompletedOrder, LoginRequest, LoginResponse, NotificationAck, UserInfo};
use shared::models::{
    AddCartItem, Cart, CheckoutRequest, CompleteOrderRequest, DiningTable, HistoryQuery, MenuItem,
    MenuQuery, Order, RestaurantProfile, StatusUpdateRequest, TableLookupQuery, UpdateCartItem,
};
use shared::order::OrderStatus;

use crate::{ClientConfig, ClientError, ClientResult};

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let request = self.client.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::from_response(status.as_u16(), &text));
        }
        serde_json::from_str(&text).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        Self::send(self.request(Method::GET, path)).await
    }

    pub async fn get_with<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ClientResult<T> {
        Self::send(self.request(Method::GET, path).query(query)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        Self::send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        Self::send(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        Self::send(self.request(Method::DELETE, path)).await
    }

    // ========== Auth API ==========

    pub async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.post("/api/auth/login", &request).await
    }

    pub async fn me(&self) -> ClientResult<UserInfo> {
        self.get("/api/auth/me").await
    }

    // ========== Customer API ==========

    pub async fn restaurant(&self) -> ClientResult<RestaurantProfile> {
        self.get("/api/restaurant").await
    }

    pub async fn menu(&self, query: &MenuQuery) -> ClientResult<Vec<MenuItem>> {
        self.get_with("/api/menus", query).await
    }

    /// Resolve a scanned table; `token` is the `t` parameter of the QR URL
    pub async fn table_by_number(&self, number: i32, token: &str) -> ClientResult<DiningTable> {
        let query = TableLookupQuery {
            t: Some(token.to_string()),
        };
        self.get_with(&format!("/api/tables/number/{number}"), &query)
            .await
    }

    pub async fn cart(&self, table_id: i64) -> ClientResult<Cart> {
        self.get(&format!("/api/cart/{table_id}")).await
    }

    pub async fn add_to_cart(&self, table_id: i64, item: &AddCartItem) -> ClientResult<Cart> {
        self.post(&format!("/api/cart/{table_id}/items"), item).await
    }

    /// `quantity <= 0` removes the line
    pub async fn set_cart_quantity(
        &self,
        table_id: i64,
        item_id: i64,
        quantity: i32,
    ) -> ClientResult<Cart> {
        self.put(
            &format!("/api/cart/{table_id}/items/{item_id}"),
            &UpdateCartItem { quantity },
        )
        .await
    }

    pub async fn remove_from_cart(&self, table_id: i64, item_id: i64) -> ClientResult<Cart> {
        self.delete(&format!("/api/cart/{table_id}/items/{item_id}"))
            .await
    }

    pub async fn clear_cart(&self, table_id: i64) -> ClientResult<Cart> {
        self.delete(&format!("/api/cart/{table_id}")).await
    }

    pub async fn checkout(&self, request: &CheckoutRequest) -> ClientResult<Order> {
        self.post("/api/orders/checkout", request).await
    }

    /// Orders of a table, newest first
    pub async fn table_orders(&self, table_id: i64) -> ClientResult<Vec<Order>> {
        self.get(&format!("/api/orders/table/{table_id}")).await
    }

    pub async fn order(&self, id: i64) -> ClientResult<Order> {
        self.get(&format!("/api/orders/{id}")).await
    }

    /// Only while the order is pending
    pub async fn cancel_order(&self, id: i64) -> ClientResult<bool> {
        self.delete(&format!("/api/orders/{id}")).await
    }

    pub async fn complete_order(
        &self,
        id: i64,
        request: &CompleteOrderRequest,
    ) -> ClientResult<CompletedOrder> {
        self.post(&format!("/api/orders/{id}/complete"), request)
            .await
    }

    // ========== Staff API ==========

    pub async fn update_order_status(&self, id: i64, status: OrderStatus) -> ClientResult<Order> {
        self.put(
            &format!("/api/orders/{id}/status"),
            &StatusUpdateRequest { status },
        )
        .await
    }

    pub async fn order_history(&self, query: &HistoryQuery) -> ClientResult<Vec<Order>> {
        self.get_with("/api/orders/history", query).await
    }

    /// Ask the server to pull the gateway status for a missed webhook
    pub async fn refresh_payment(&self, order_id: i64) -> ClientResult<NotificationAck> {
        self.get(&format!("/api/payment/status/{order_id}")).await
    }
}
