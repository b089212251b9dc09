//! Backend-as-a-service seam.
//!
//! Every piece of persistent state lives in a managed platform: accounts in its
//! auth service, entities in its document store, images in its file storage.
//! This module defines the three traits the rest of the crate talks to, plus
//! two implementations of each:
//!
//! - [`memory`] - in-process, for tests and local development
//! - [`firebase`] - Firestore, Firebase Storage and Identity Toolkit over REST
//!
//! # Paths
//!
//! Documents are addressed Firestore-style: a collection path with an odd number
//! of segments (`users/u1/addresses`) and a document path with an even number
//! (`users/u1/addresses/a1`).

pub mod firebase;
pub mod memory;
pub mod query;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use query::{Direction, Filter, Query};

/// Field map of a stored document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Errors surfaced by the backend platform.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The addressed document or file does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The platform's security rules rejected the call.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A document or account with this key already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Email/password did not match an account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The platform rejected the request payload.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The platform throttled the caller.
    #[error("rate limited by backend")]
    RateLimited,

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A typed value could not be converted to or from the wire format.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The platform answered with an unexpected status.
    #[error("backend returned {status}: {message}")]
    Unexpected {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },
}

// =============================================================================
// Paths
// =============================================================================

/// Path to a collection, e.g. `orders` or `users/u1/addresses`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// A top-level collection.
    #[must_use]
    pub fn root(name: &str) -> Self {
        Self(name.to_owned())
    }

    /// Address a document in this collection.
    #[must_use]
    pub fn doc(&self, id: &str) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.to_owned(),
        }
    }

    /// The full slash-separated path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last path segment (Firestore's `collectionId`).
    #[must_use]
    pub fn collection_id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The document this collection is nested under, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.0.rsplit_once('/').map(|(parent, _)| parent)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path to a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl DocumentPath {
    /// The collection holding this document.
    #[must_use]
    pub const fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    /// The document key.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// A subcollection under this document.
    #[must_use]
    pub fn subcollection(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{}/{}/{name}", self.collection.0, self.id))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection.0, self.id)
    }
}

// =============================================================================
// Snapshots and subscriptions
// =============================================================================

/// A document as read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    /// Document key within its collection.
    pub id: String,
    /// Stored fields.
    pub fields: Fields,
}

impl DocumentSnapshot {
    /// Deserialize the fields into a document type.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the fields do not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(self.fields.clone()))
    }
}

/// Item delivered by a live subscription: the full current result set.
pub type SnapshotResult = Result<Vec<DocumentSnapshot>, BackendError>;

/// A live query subscription.
///
/// Owns the task feeding it; dropping the subscription stops the listener.
pub struct Subscription {
    receiver: mpsc::Receiver<SnapshotResult>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Wrap a listener task and the channel it feeds.
    #[must_use]
    pub const fn new(receiver: mpsc::Receiver<SnapshotResult>, task: JoinHandle<()>) -> Self {
        Self { receiver, task }
    }

    /// Wait for the next snapshot. Returns `None` once the listener has stopped.
    pub async fn next(&mut self) -> Option<SnapshotResult> {
        self.receiver.recv().await
    }

    /// Convert into a `Stream` that keeps the listener alive while polled.
    pub fn into_stream(self) -> impl Stream<Item = SnapshotResult> + Send {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .next()
                .await
                .map(|item| (item, subscription))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// =============================================================================
// Traits
// =============================================================================

/// Schema-less document storage with queries and live listeners.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document.
    async fn get(&self, path: &DocumentPath) -> Result<Option<DocumentSnapshot>, BackendError>;

    /// Insert a document under a generated key and return the key.
    async fn add(&self, collection: &CollectionPath, fields: Fields) -> Result<String, BackendError>;

    /// Create or fully replace a document.
    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<(), BackendError>;

    /// Overwrite the given fields of an existing document.
    ///
    /// Fails with `BackendError::NotFound` if the document does not exist.
    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), BackendError>;

    /// Delete a document. Deleting a missing document is not an error.
    async fn delete(&self, path: &DocumentPath) -> Result<(), BackendError>;

    /// Run a query against one collection.
    async fn query(&self, query: &Query) -> Result<Vec<DocumentSnapshot>, BackendError>;

    /// Subscribe to a query. The first item is the current result set; later
    /// items are sent whenever the result set changes.
    fn listen(&self, query: Query) -> Subscription;
}

/// Binary object storage.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store an object and return a public download URL.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BackendError>;
}

/// Account as known to the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthAccount {
    /// Provider-assigned user ID; also the key of the user's profile document.
    pub uid: String,
    /// Email on the account.
    pub email: String,
    /// Whether the email address has been verified.
    pub email_verified: bool,
}

/// Email/password authentication.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create an account. Fails with `AlreadyExists` if the email is taken.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthAccount, BackendError>;

    /// Verify credentials. Fails with `InvalidCredentials` on mismatch.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthAccount, BackendError>;

    /// Send a password-reset email. Fails with `NotFound` for unknown emails.
    async fn send_password_reset(&self, email: &str) -> Result<(), BackendError>;
}

// =============================================================================
// Backend bundle
// =============================================================================

/// Handles to the three backend services, shared across the application.
#[derive(Clone)]
pub struct Backend {
    /// Document store.
    pub documents: Arc<dyn DocumentStore>,
    /// File storage.
    pub files: Arc<dyn FileStorage>,
    /// Auth provider.
    pub auth: Arc<dyn AuthProvider>,
}

impl Backend {
    /// A fully in-process backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            documents: Arc::new(memory::MemoryDocumentStore::new()),
            files: Arc::new(memory::MemoryFileStorage::default()),
            auth: Arc::new(memory::MemoryAuthProvider::default()),
        }
    }

    /// Firebase backend built from configuration.
    #[must_use]
    pub fn firebase(config: &crate::config::FirebaseConfig) -> Self {
        let http = reqwest::Client::new();
        Self {
            documents: Arc::new(firebase::FirestoreStore::new(http.clone(), config)),
            files: Arc::new(firebase::FirebaseStorage::new(http.clone(), config)),
            auth: Arc::new(firebase::IdentityToolkit::new(http, config)),
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}
