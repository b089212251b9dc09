//! Integration tests for the marketplace storefront.
//!
//! Everything runs in-process against the in-memory backend, so no Firebase
//! project or network access is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marketplace-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `address_book` - Default address bookkeeping across operation sequences
//! - `reviews` - Eligibility scan and rating aggregation
//! - `support_chat` - Live subscription delivery
//! - `wallet` - Balance and ledger consistency
//! - `http_api` - Full request flows through the router

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use marketplace_core::{OrderId, OrderStatus, ProductId, UserId};
use marketplace_storefront::backend::Backend;
use marketplace_storefront::config::{BackendMode, MapConfig, StorefrontConfig};
use marketplace_storefront::db::{OrderRepository, ProductRepository};
use marketplace_storefront::models::{AddressInput, Order, OrderItem, Product};
use marketplace_storefront::routes;
use marketplace_storefront::state::AppState;

/// Largest response body the helpers will buffer.
const MAX_BODY: usize = 1024 * 1024;

/// Configuration for an in-memory storefront on plain HTTP.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3000".to_owned(),
        backend: BackendMode::Memory,
        firebase: None,
        map: MapConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A product priced at `price` with no reviews yet.
#[must_use]
pub fn product(id: &str, price: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        description: String::new(),
        price: Decimal::from(price),
        category: "General".to_owned(),
        images: Vec::new(),
        seller_id: None,
        stock: 10,
        rating: 0.0,
        review_count: 0,
        created_at: Utc::now(),
    }
}

/// An order for `user` holding one unit of each product.
#[must_use]
pub fn order(id: &str, user: &str, status: OrderStatus, products: &[&str]) -> Order {
    let items: Vec<OrderItem> = products
        .iter()
        .map(|p| OrderItem {
            product_id: ProductId::new(*p),
            name: format!("Product {p}"),
            price: Decimal::TEN,
            quantity: 1,
            image: None,
        })
        .collect();

    Order {
        id: OrderId::new(id),
        user_id: UserId::new(user),
        order_number: format!("MP-{id}"),
        status,
        total_amount: Decimal::TEN * Decimal::from(items.len()),
        items,
        created_at: Utc::now() - Duration::days(1),
    }
}

/// Write products and orders straight to the document store.
pub async fn seed(backend: &Backend, products: &[Product], orders: &[Order]) {
    let product_repo = ProductRepository::new(backend.documents.as_ref());
    for p in products {
        product_repo.put(p).await.unwrap();
    }
    let order_repo = OrderRepository::new(backend.documents.as_ref());
    for o in orders {
        order_repo.put(o).await.unwrap();
    }
}

/// A minimal valid address.
#[must_use]
pub fn address(name: &str, is_default: bool) -> AddressInput {
    AddressInput {
        full_name: name.to_owned(),
        phone_number: "555-0100".to_owned(),
        address_line1: "1 Main St".to_owned(),
        city: "Springfield".to_owned(),
        state: "IL".to_owned(),
        postal_code: "62701".to_owned(),
        country: "US".to_owned(),
        is_default,
        ..AddressInput::default()
    }
}

/// Response captured by [`TestApp::send`].
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `name=value` part of the session cookie, if one was set.
    pub cookie: Option<String>,
    pub body: Value,
}

/// The full router over an in-memory backend.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    client_ip: &'static str,
}

impl TestApp {
    /// Build an app whose requests appear to come from `client_ip`.
    #[must_use]
    pub fn new(client_ip: &'static str) -> Self {
        let state = AppState::new(test_config(), Backend::in_memory());
        let router = routes::app(state.clone());
        Self {
            state,
            router,
            client_ip,
        }
    }

    /// The backend shared with the router.
    #[must_use]
    pub fn backend(&self) -> &Backend {
        self.state.backend()
    }

    /// Send one request, optionally with a JSON body and session cookie.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("x-forwarded-for", self.client_ip);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                )
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_owned);
        let bytes = to_bytes(response.into_body(), MAX_BODY).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            cookie,
            body,
        }
    }

    /// Register an account and return its session cookie and user ID.
    pub async fn register(&self, email: &str) -> (String, String) {
        let body = serde_json::json!({
            "email": email,
            "password": "correct horse battery",
            "displayName": "Test Shopper",
        });
        let response = self
            .send(Method::POST, "/auth/register", Some(&body), None)
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

        let uid = response.body["id"].as_str().unwrap().to_owned();
        (response.cookie.unwrap(), uid)
    }
}
