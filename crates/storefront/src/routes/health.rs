//! Health check endpoints.

use axum::{extract::State, http::StatusCode};

use crate::backend::{CollectionPath, Query};
use crate::db::collections;
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Runs a one-document query against the document store.
/// Returns 503 Service Unavailable if the backend is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    let ping = Query::new(CollectionPath::root(collections::FAQ_CATEGORIES)).limit(1);
    match state.backend().documents.query(&ping).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
