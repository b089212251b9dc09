//! Firebase backend over REST.
//!
//! - [`FirestoreStore`] - Cloud Firestore `v1` documents API
//! - [`FirebaseStorage`] - Cloud Storage for Firebase `v0` objects API
//! - [`IdentityToolkit`] - Firebase Auth email/password endpoints
//!
//! Requests carry the web API key as `key=` and, when configured, a server
//! bearer token. Firestore has no REST push channel, so [`DocumentStore::listen`]
//! polls the query and emits when the result set changes.

mod auth;
mod storage;
pub mod value;

pub use auth::IdentityToolkit;
pub use storage::FirebaseStorage;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use super::{
    BackendError, CollectionPath, Direction, DocumentPath, DocumentSnapshot, DocumentStore,
    Fields, Query, Subscription,
};
use crate::config::FirebaseConfig;

/// Buffered snapshots per listener before the poller waits.
const LISTENER_BUFFER: usize = 16;

// =============================================================================
// Shared helpers
// =============================================================================

/// Error envelope used by every Google API.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Turn a non-success response into a `BackendError`.
async fn error_from_response(response: Response) -> BackendError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());

    match status {
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::PermissionDenied(message),
        StatusCode::CONFLICT => BackendError::AlreadyExists(message),
        StatusCode::TOO_MANY_REQUESTS => BackendError::RateLimited,
        StatusCode::BAD_REQUEST => BackendError::InvalidArgument(message),
        other => BackendError::Unexpected {
            status: other.as_u16(),
            message,
        },
    }
}

/// Attach the API key and optional bearer token.
fn authorize(
    builder: RequestBuilder,
    api_key: &SecretString,
    access_token: Option<&SecretString>,
) -> RequestBuilder {
    let builder = builder.query(&[("key", api_key.expose_secret())]);
    match access_token {
        Some(token) => builder.bearer_auth(token.expose_secret()),
        None => builder,
    }
}

// =============================================================================
// Firestore
// =============================================================================

/// Document as returned by the Firestore REST API.
#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl FirestoreDocument {
    fn into_snapshot(self) -> Result<DocumentSnapshot, BackendError> {
        let id = self
            .name
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_owned();
        Ok(DocumentSnapshot {
            id,
            fields: value::decode_fields(&self.fields)?,
        })
    }
}

/// One element of a `runQuery` response stream.
#[derive(Debug, Deserialize)]
struct RunQueryItem {
    document: Option<FirestoreDocument>,
}

/// Cloud Firestore document store.
#[derive(Clone)]
pub struct FirestoreStore {
    inner: Arc<FirestoreInner>,
}

struct FirestoreInner {
    http: reqwest::Client,
    /// `https://firestore.googleapis.com/v1/projects/{p}/databases/(default)/documents`
    documents_url: String,
    api_key: SecretString,
    access_token: Option<SecretString>,
    poll_interval: Duration,
}

impl FirestoreStore {
    /// Create a Firestore client for the configured project.
    #[must_use]
    pub fn new(http: reqwest::Client, config: &FirebaseConfig) -> Self {
        Self {
            inner: Arc::new(FirestoreInner {
                http,
                documents_url: format!(
                    "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents",
                    config.project_id
                ),
                api_key: config.api_key.clone(),
                access_token: config.access_token.clone(),
                poll_interval: config.listen_poll_interval,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.documents_url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        authorize(
            builder,
            &self.inner.api_key,
            self.inner.access_token.as_ref(),
        )
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, BackendError> {
        let response = self.authorized(builder).send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }
}

/// Build the `structuredQuery` body for a query.
fn structured_query(query: &Query) -> Value {
    let mut structured = Map::new();
    structured.insert(
        "from".into(),
        json!([{ "collectionId": query.collection.collection_id() }]),
    );

    let filters: Vec<Value> = query
        .filters
        .iter()
        .map(|f| {
            json!({
                "fieldFilter": {
                    "field": { "fieldPath": f.field },
                    "op": "EQUAL",
                    "value": value::encode_field(&f.field, &f.value),
                }
            })
        })
        .collect();

    match filters.len() {
        0 => {}
        1 => {
            if let Some(only) = filters.into_iter().next() {
                structured.insert("where".into(), only);
            }
        }
        _ => {
            structured.insert(
                "where".into(),
                json!({ "compositeFilter": { "op": "AND", "filters": filters } }),
            );
        }
    }

    if !query.order_by.is_empty() {
        let order: Vec<Value> = query
            .order_by
            .iter()
            .map(|(field, direction)| {
                let direction = match direction {
                    Direction::Ascending => "ASCENDING",
                    Direction::Descending => "DESCENDING",
                };
                json!({ "field": { "fieldPath": field }, "direction": direction })
            })
            .collect();
        structured.insert("orderBy".into(), Value::Array(order));
    }

    if let Some(limit) = query.limit {
        structured.insert("limit".into(), json!(limit));
    }

    json!({ "structuredQuery": structured })
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    #[instrument(skip(self), fields(path = %path))]
    async fn get(&self, path: &DocumentPath) -> Result<Option<DocumentSnapshot>, BackendError> {
        let request = self.inner.http.get(self.url(&path.to_string()));
        match self.send(request).await {
            Ok(response) => {
                let document: FirestoreDocument = response.json().await?;
                Ok(Some(document.into_snapshot()?))
            }
            Err(BackendError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, data), fields(collection = %collection))]
    async fn add(&self, collection: &CollectionPath, data: Fields) -> Result<String, BackendError> {
        let request = self
            .inner
            .http
            .post(self.url(collection.as_str()))
            .json(&json!({ "fields": value::encode_fields(&data) }));
        let document: FirestoreDocument = self.send(request).await?.json().await?;
        let snapshot = document.into_snapshot()?;
        debug!(id = %snapshot.id, "document created");
        Ok(snapshot.id)
    }

    #[instrument(skip(self, data), fields(path = %path))]
    async fn set(&self, path: &DocumentPath, data: Fields) -> Result<(), BackendError> {
        // PATCH without an update mask replaces the document, creating it if needed
        let request = self
            .inner
            .http
            .patch(self.url(&path.to_string()))
            .json(&json!({ "fields": value::encode_fields(&data) }));
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self, data), fields(path = %path))]
    async fn update(&self, path: &DocumentPath, data: Fields) -> Result<(), BackendError> {
        let mut params: Vec<(&str, &str)> = data
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.as_str()))
            .collect();
        params.push(("currentDocument.exists", "true"));

        let request = self
            .inner
            .http
            .patch(self.url(&path.to_string()))
            .query(&params)
            .json(&json!({ "fields": value::encode_fields(&data) }));

        match self.send(request).await {
            Ok(_) => Ok(()),
            // A failed existence precondition is reported as 400/404 depending on region
            Err(BackendError::InvalidArgument(message) | BackendError::NotFound(message)) => {
                Err(BackendError::NotFound(format!("{path}: {message}")))
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn delete(&self, path: &DocumentPath) -> Result<(), BackendError> {
        let request = self.inner.http.delete(self.url(&path.to_string()));
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self, query), fields(collection = %query.collection))]
    async fn query(&self, query: &Query) -> Result<Vec<DocumentSnapshot>, BackendError> {
        let url = match query.collection.parent() {
            Some(parent) => format!("{}:runQuery", self.url(parent)),
            None => format!("{}:runQuery", self.inner.documents_url),
        };

        let request = self.inner.http.post(url).json(&structured_query(query));
        let items: Vec<RunQueryItem> = self.send(request).await?.json().await?;

        items
            .into_iter()
            .filter_map(|item| item.document)
            .map(FirestoreDocument::into_snapshot)
            .collect()
    }

    fn listen(&self, query: Query) -> Subscription {
        let (tx, rx) = mpsc::channel(LISTENER_BUFFER);
        let store = self.clone();
        let interval = self.inner.poll_interval;

        let task = tokio::spawn(async move {
            let mut last: Option<Vec<DocumentSnapshot>> = None;
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match store.query(&query).await {
                    Ok(docs) => {
                        if last.as_ref() != Some(&docs) {
                            if tx.send(Ok(docs.clone())).await.is_err() {
                                return;
                            }
                            last = Some(docs);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, collection = %query.collection, "listener poll failed");
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }
        });

        Subscription::new(rx, task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_query_single_filter() {
        let query = Query::new(CollectionPath::root("reviews"))
            .where_eq("productId", "p1")
            .order_by("createdAt", Direction::Descending)
            .limit(10);

        let body = structured_query(&query);
        assert_eq!(
            body,
            json!({"structuredQuery": {
                "from": [{"collectionId": "reviews"}],
                "where": {"fieldFilter": {
                    "field": {"fieldPath": "productId"},
                    "op": "EQUAL",
                    "value": {"stringValue": "p1"}
                }},
                "orderBy": [{"field": {"fieldPath": "createdAt"}, "direction": "DESCENDING"}],
                "limit": 10
            }})
        );
    }

    #[test]
    fn test_structured_query_composite_filter_on_subcollection() {
        let query = Query::new(
            CollectionPath::root("supportChats")
                .doc("u1")
                .subcollection("messages"),
        )
        .where_eq("isFromUser", false)
        .where_eq("read", false);

        let body = structured_query(&query);
        assert_eq!(
            body["structuredQuery"]["from"],
            json!([{"collectionId": "messages"}])
        );
        assert_eq!(body["structuredQuery"]["where"]["compositeFilter"]["op"], "AND");
        assert_eq!(
            body["structuredQuery"]["where"]["compositeFilter"]["filters"]
                .as_array()
                .map(Vec::len),
            Some(2)
        );
    }

    #[test]
    fn test_document_name_to_id() {
        let document = FirestoreDocument {
            name: "projects/p/databases/(default)/documents/users/u1/addresses/a9".into(),
            fields: Map::new(),
        };
        let snapshot = document.into_snapshot().expect("snapshot");
        assert_eq!(snapshot.id, "a9");
    }
}
