//! Integration test support for the Emporium storefront client.
//!
//! [`FakeShop`] is an in-process `axum` stand-in for the remote catalog,
//! inventory, order, and user services. Tests point a real [`Storefront`]
//! (HTTP transport, file-backed state) at it.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p emporium-integration-tests
//! cargo test -p emporium-integration-tests --features dev-auth-fallback
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use emporium_storefront::Storefront;
use emporium_storefront::config::StorefrontConfig;
use emporium_storefront::gateway::REQUEST_ID_HEADER;

#[derive(Debug, Clone)]
struct StoredUser {
    id: i64,
    email: String,
    name: String,
    phone: Option<String>,
    password: String,
}

impl StoredUser {
    fn to_json(&self) -> Value {
        let mut user = json!({
            "id": self.id,
            "email": self.email,
            "name": self.name,
            "active": true,
        });
        if let Some(phone) = &self.phone {
            user["phone"] = json!(phone);
        }
        user
    }
}

#[derive(Debug, Clone)]
struct StoredProduct {
    id: i64,
    name: String,
    description: Option<String>,
    price_cents: i64,
    category: String,
}

impl StoredProduct {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "price": money(self.price_cents),
            "category": self.category,
            "active": true,
        })
    }
}

#[derive(Debug, Default)]
struct ShopData {
    next_id: i64,
    users: Vec<StoredUser>,
    products: BTreeMap<i64, StoredProduct>,
    stock: HashMap<i64, u32>,
    orders: Vec<Value>,
    tokens: HashMap<String, i64>,
    login_disabled: bool,
    request_ids: Vec<String>,
}

impl ShopData {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn authorized(&self, headers: &HeaderMap) -> Option<i64> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let token = value.strip_prefix("Bearer ")?;
        self.tokens.get(token).copied()
    }
}

type Shared = Arc<Mutex<ShopData>>;

/// A running fake of the remote services.
pub struct FakeShop {
    addr: SocketAddr,
    data: Shared,
}

impl FakeShop {
    /// Bind to an ephemeral local port and start serving.
    pub async fn start() -> Self {
        let data: Shared = Arc::default();
        let router = Router::new()
            .route("/api/users", post(create_user))
            .route("/api/users/email/{email}", get(user_by_email))
            .route("/api/auth/login", post(login))
            .route("/api/products", get(list_products).post(create_product))
            .route(
                "/api/products/{id}",
                get(get_product).put(update_product).delete(delete_product),
            )
            .route("/api/inventory/check", get(check_inventory))
            .route("/api/orders", post(create_order))
            .route("/api/orders/user/{user_id}", get(orders_for_user))
            .layer(axum::middleware::from_fn_with_state(
                Arc::clone(&data),
                record_request_id,
            ))
            .with_state(Arc::clone(&data));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, data }
    }

    /// Base URL including the `/api` prefix.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/api", self.addr)).unwrap()
    }

    /// Configuration pointing at this shop with state kept under `dir`.
    #[must_use]
    pub fn config(&self, dir: &Path) -> StorefrontConfig {
        StorefrontConfig::new(self.base_url()).with_state_path(dir.join("state.json"))
    }

    /// A storefront over real HTTP and a state file under `dir`.
    #[must_use]
    pub fn storefront(&self, dir: &Path) -> Storefront {
        Storefront::new(self.config(dir)).unwrap()
    }

    /// Add a product with `stock` units available. Returns its id.
    ///
    /// Seeded products have no description and are served with
    /// `"description": null`.
    pub fn seed_product(&self, name: &str, price_cents: i64, category: &str, stock: u32) -> i64 {
        let mut data = self.lock();
        let id = data.next_id();
        data.products.insert(
            id,
            StoredProduct {
                id,
                name: name.to_string(),
                description: None,
                price_cents,
                category: category.to_string(),
            },
        );
        data.stock.insert(id, stock);
        id
    }

    /// Add a user account. Returns its id.
    pub fn seed_user(&self, email: &str, name: &str, password: &str) -> i64 {
        let mut data = self.lock();
        let id = data.next_id();
        data.users.push(StoredUser {
            id,
            email: email.to_string(),
            name: name.to_string(),
            phone: None,
            password: password.to_string(),
        });
        id
    }

    /// Make `POST /auth/login` answer 404, as if it were not deployed.
    pub fn disable_login(&self) {
        self.lock().login_disabled = true;
    }

    /// Invalidate every issued token.
    pub fn revoke_tokens(&self) {
        self.lock().tokens.clear();
    }

    /// Units of a product still in stock.
    #[must_use]
    pub fn stock(&self, product_id: i64) -> u32 {
        self.lock().stock.get(&product_id).copied().unwrap_or(0)
    }

    /// Orders accepted so far.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        self.lock().orders.clone()
    }

    /// Whether a product exists.
    #[must_use]
    pub fn has_product(&self, product_id: i64) -> bool {
        self.lock().products.contains_key(&product_id)
    }

    /// `x-request-id` values seen so far, in arrival order.
    #[must_use]
    pub fn request_ids(&self) -> Vec<String> {
        self.lock().request_ids.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ShopData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock(data: &Shared) -> MutexGuard<'_, ShopData> {
    data.lock().unwrap_or_else(PoisonError::into_inner)
}

#[allow(clippy::cast_precision_loss)]
fn money(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[allow(clippy::cast_possible_truncation)]
fn cents(value: &Value) -> Option<i64> {
    let amount = value.as_f64().or_else(|| value.as_str()?.parse().ok())?;
    Some((amount * 100.0).round() as i64)
}

fn error(status: StatusCode, message: &str, uri: &Uri) -> Response {
    let body = json!({
        "status": status.as_u16(),
        "error": status.canonical_reason().unwrap_or_default(),
        "message": message,
        "path": uri.path(),
    });
    (status, Json(body)).into_response()
}

async fn record_request_id(
    State(data): State<Shared>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    if let Some(id) = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        lock(&data).request_ids.push(id.to_string());
    }
    next.run(request).await
}

async fn create_user(State(data): State<Shared>, uri: Uri, Json(body): Json<Value>) -> Response {
    let mut data = lock(&data);
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if data.users.iter().any(|u| u.email.eq_ignore_ascii_case(&email)) {
        return error(StatusCode::CONFLICT, "Email already registered", &uri);
    }

    let id = data.next_id();
    let user = StoredUser {
        id,
        email,
        name: body["name"].as_str().unwrap_or_default().to_string(),
        phone: body["phone"].as_str().map(str::to_string),
        password: body["password"].as_str().unwrap_or_default().to_string(),
    };
    let json = user.to_json();
    data.users.push(user);
    (StatusCode::CREATED, Json(json)).into_response()
}

async fn user_by_email(
    State(data): State<Shared>,
    uri: Uri,
    UrlPath(email): UrlPath<String>,
) -> Response {
    let data = lock(&data);
    data.users
        .iter()
        .find(|u| u.email.eq_ignore_ascii_case(&email))
        .map_or_else(
            || error(StatusCode::NOT_FOUND, "User not found", &uri),
            |u| Json(u.to_json()).into_response(),
        )
}

async fn login(State(data): State<Shared>, uri: Uri, Json(body): Json<Value>) -> Response {
    let mut data = lock(&data);
    if data.login_disabled {
        return error(StatusCode::NOT_FOUND, "No handler found", &uri);
    }

    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let Some(user) = data
        .users
        .iter()
        .find(|u| u.email.eq_ignore_ascii_case(email) && u.password == password)
        .cloned()
    else {
        return error(StatusCode::UNAUTHORIZED, "Invalid email or password", &uri);
    };

    let serial = data.next_id();
    let token = format!("tok-{}-{serial}", user.id);
    data.tokens.insert(token.clone(), user.id);
    Json(json!({ "token": token, "user": user.to_json() })).into_response()
}

#[derive(Deserialize)]
struct CategoryQuery {
    category: Option<String>,
}

async fn list_products(
    State(data): State<Shared>,
    Query(query): Query<CategoryQuery>,
) -> Response {
    let data = lock(&data);
    let products: Vec<Value> = data
        .products
        .values()
        .filter(|p| {
            query
                .category
                .as_deref()
                .is_none_or(|c| p.category.eq_ignore_ascii_case(c))
        })
        .map(StoredProduct::to_json)
        .collect();
    Json(products).into_response()
}

async fn get_product(State(data): State<Shared>, uri: Uri, UrlPath(id): UrlPath<i64>) -> Response {
    let data = lock(&data);
    data.products.get(&id).map_or_else(
        || error(StatusCode::NOT_FOUND, "Product not found", &uri),
        |p| Json(p.to_json()).into_response(),
    )
}

async fn create_product(
    State(data): State<Shared>,
    headers: HeaderMap,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    let mut data = lock(&data);
    if data.authorized(&headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Authentication required", &uri);
    }
    let Some(price_cents) = cents(&body["price"]) else {
        return error(StatusCode::BAD_REQUEST, "Price is required", &uri);
    };

    let id = data.next_id();
    let product = StoredProduct {
        id,
        name: body["name"].as_str().unwrap_or_default().to_string(),
        description: body["description"].as_str().map(str::to_string),
        price_cents,
        category: body["category"].as_str().unwrap_or_default().to_string(),
    };
    let json = product.to_json();
    data.products.insert(id, product);
    data.stock.insert(id, 0);
    (StatusCode::CREATED, Json(json)).into_response()
}

async fn update_product(
    State(data): State<Shared>,
    headers: HeaderMap,
    uri: Uri,
    UrlPath(id): UrlPath<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut data = lock(&data);
    if data.authorized(&headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Authentication required", &uri);
    }
    let Some(product) = data.products.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, "Product not found", &uri);
    };

    if let Some(name) = body["name"].as_str() {
        product.name = name.to_string();
    }
    if let Some(description) = body["description"].as_str() {
        product.description = Some(description.to_string());
    }
    if let Some(price_cents) = cents(&body["price"]) {
        product.price_cents = price_cents;
    }
    if let Some(category) = body["category"].as_str() {
        product.category = category.to_string();
    }
    Json(product.to_json()).into_response()
}

async fn delete_product(
    State(data): State<Shared>,
    headers: HeaderMap,
    uri: Uri,
    UrlPath(id): UrlPath<i64>,
) -> Response {
    let mut data = lock(&data);
    if data.authorized(&headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Authentication required", &uri);
    }
    if data.products.remove(&id).is_none() {
        return error(StatusCode::NOT_FOUND, "Product not found", &uri);
    }
    data.stock.remove(&id);
    StatusCode::NO_CONTENT.into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InventoryQuery {
    product_id: i64,
    quantity: u32,
}

async fn check_inventory(
    State(data): State<Shared>,
    Query(query): Query<InventoryQuery>,
) -> Response {
    let data = lock(&data);
    let available = data.stock.get(&query.product_id).copied().unwrap_or(0);
    Json(available >= query.quantity).into_response()
}

async fn create_order(
    State(data): State<Shared>,
    headers: HeaderMap,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    let mut data = lock(&data);
    if data.authorized(&headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Authentication required", &uri);
    }

    let user_id = body["userId"].as_i64().unwrap_or_default();
    let requested: Vec<(i64, u32)> = body["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|i| {
                    let quantity = i["quantity"].as_u64().unwrap_or_default();
                    (
                        i["productId"].as_i64().unwrap_or_default(),
                        u32::try_from(quantity).unwrap_or(u32::MAX),
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    let mut lines = Vec::new();
    let mut total_cents = 0;
    for (product_id, quantity) in &requested {
        let Some(product) = data.products.get(product_id) else {
            return error(StatusCode::NOT_FOUND, "Product not found", &uri);
        };
        if data.stock.get(product_id).copied().unwrap_or(0) < *quantity {
            let message = format!("Insufficient inventory for product: {}", product.name);
            return error(StatusCode::BAD_REQUEST, &message, &uri);
        }
        let subtotal = product.price_cents * i64::from(*quantity);
        total_cents += subtotal;
        lines.push(json!({
            "productId": product_id,
            "quantity": quantity,
            "unitPrice": money(product.price_cents),
            "subtotal": money(subtotal),
        }));
    }
    for (product_id, quantity) in &requested {
        if let Some(stock) = data.stock.get_mut(product_id) {
            *stock -= quantity;
        }
    }

    let id = data.next_id();
    let order = json!({
        "id": id,
        "userId": user_id,
        "status": "PENDING",
        "totalAmount": money(total_cents),
        "items": lines,
        "createdAt": format!("2024-05-01T10:00:{:02}", data.orders.len() % 60),
    });
    data.orders.push(order.clone());
    (StatusCode::CREATED, Json(order)).into_response()
}

async fn orders_for_user(
    State(data): State<Shared>,
    headers: HeaderMap,
    uri: Uri,
    UrlPath(user_id): UrlPath<i64>,
) -> Response {
    let data = lock(&data);
    if data.authorized(&headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Authentication required", &uri);
    }
    let orders: Vec<Value> = data
        .orders
        .iter()
        .filter(|o| o["userId"].as_i64() == Some(user_id))
        .cloned()
        .collect();
    Json(orders).into_response()
}
