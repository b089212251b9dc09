//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (document store reachable)
//!
//! # Auth (strict rate limit)
//! POST /auth/register          - Create account and log in
//! POST /auth/login             - Log in
//! POST /auth/logout            - Log out
//! POST /auth/password-reset    - Send reset email
//!
//! # Catalog (public)
//! GET  /api/products                    - Product listing (filter, search, sort)
//! GET  /api/products/{id}               - Product detail
//! GET  /api/products/{id}/reviews       - Reviews with rating summary
//! POST /api/reviews/{id}/vote           - Helpfulness vote (requires auth)
//!
//! # Account (requires auth)
//! GET/PATCH /api/account/profile        - Profile
//! POST /api/account/profile/avatar      - Avatar upload (multipart)
//! GET  /api/account/orders              - Order history
//! GET  /api/account/orders/{id}         - Order detail
//! GET/POST /api/account/addresses       - Address book
//! GET/PUT/DELETE /api/account/addresses/{id}
//! POST /api/account/addresses/{id}/default
//! GET  /api/account/wallet              - Balance
//! GET  /api/account/wallet/transactions - Ledger
//! POST /api/account/wallet/deposit      - Credit
//! POST /api/account/wallet/pay          - Debit
//! GET/POST /api/account/reviews         - Own reviews / new review
//! GET  /api/account/reviews/reviewable  - Products awaiting a review
//! PUT/DELETE /api/account/reviews/{id}
//! POST /api/account/reviews/images      - Review photo upload (multipart)
//!
//! # Support
//! GET  /api/support/faq                 - FAQs (optional category)
//! GET  /api/support/faq/categories
//! GET  /api/support/faq/grouped
//! GET  /api/support/faq/search?q=
//! GET  /api/support/chat                - Thread and messages (requires auth)
//! POST /api/support/chat/messages       - Send message
//! POST /api/support/chat/read           - Mark replies read
//! POST /api/support/chat/close          - Close thread
//! GET  /api/support/chat/stream         - Live messages (SSE)
//!
//! # Map
//! GET  /api/map/config                  - Map picker defaults
//! ```

pub mod account;
pub mod addresses;
pub mod auth;
pub mod health;
pub mod map;
pub mod products;
pub mod reviews;
pub mod support;
pub mod wallet;

use axum::{
    Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart},
    http::Request,
    middleware::from_fn,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::middleware::{
    api_rate_limiter, auth_rate_limiter, create_session_layer, request_id_middleware,
    security_headers_middleware,
};
use crate::services::uploads::MAX_IMAGE_BYTES;
use crate::state::AppState;

/// Multipart field carrying the uploaded file.
const UPLOAD_FIELD: &str = "file";

/// Read the `file` field of a multipart upload.
///
/// Returns the bytes and the declared content type.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for malformed bodies or a missing field.
pub async fn read_upload(mut multipart: Multipart) -> Result<(Vec<u8>, String), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid upload: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("invalid upload: {e}")))?;
        return Ok((bytes.to_vec(), content_type));
    }

    Err(AppError::BadRequest(format!(
        "missing multipart field '{UPLOAD_FIELD}'"
    )))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/password-reset", post(auth::password_reset))
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/{id}/reviews", get(products::reviews))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    let uploads = Router::new()
        .route("/profile/avatar", post(account::upload_avatar))
        .route("/reviews/images", post(reviews::upload_image))
        // Room for the multipart framing around a maximum-size image
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024));

    Router::new()
        .route(
            "/profile",
            get(account::profile).patch(account::update_profile),
        )
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .route(
            "/addresses",
            get(addresses::index).post(addresses::create),
        )
        .route(
            "/addresses/{id}",
            get(addresses::show)
                .put(addresses::update)
                .delete(addresses::delete),
        )
        .route("/addresses/{id}/default", post(addresses::set_default))
        .route("/wallet", get(wallet::show))
        .route("/wallet/transactions", get(wallet::transactions))
        .route("/wallet/deposit", post(wallet::deposit))
        .route("/wallet/pay", post(wallet::pay))
        .route("/reviews", get(reviews::mine).post(reviews::create))
        .route("/reviews/reviewable", get(reviews::reviewable))
        .route(
            "/reviews/{id}",
            put(reviews::update).delete(reviews::delete),
        )
        .merge(uploads)
}

/// Create the support routes router.
pub fn support_routes() -> Router<AppState> {
    Router::new()
        .route("/faq", get(support::faqs))
        .route("/faq/categories", get(support::faq_categories))
        .route("/faq/grouped", get(support::faq_grouped))
        .route("/faq/search", get(support::faq_search))
        .route("/chat", get(support::chat))
        .route("/chat/messages", post(support::send_message))
        .route("/chat/read", post(support::mark_read))
        .route("/chat/close", post(support::close))
        .route("/chat/stream", get(support::stream))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .route("/reviews/{id}/vote", post(reviews::vote))
        .nest("/account", account_routes())
        .nest("/support", support_routes())
        .route("/map/config", get(map::config))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes().layer(auth_rate_limiter()))
        .nest("/api", api_routes().layer(api_rate_limiter()))
}

/// The complete application: routes, sessions and cross-cutting middleware.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    routes()
        .layer(from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                // `request_id` is filled in by request_id_middleware
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
