//! In-process backend used by tests and local development.
//!
//! Mirrors the platform's observable behavior closely enough for the services
//! built on top: generated document keys, "update requires existence",
//! query semantics from [`Query::apply`], and listeners that fire after every
//! write to the subscribed collection.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast, mpsc};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use super::{
    AuthAccount, AuthProvider, BackendError, CollectionPath, DocumentPath, DocumentSnapshot,
    DocumentStore, Fields, FileStorage, Query, Subscription,
};

/// Capacity of the change-notification channel shared by all listeners.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Buffered snapshots per listener before the listener task waits.
const LISTENER_BUFFER: usize = 16;

// =============================================================================
// Documents
// =============================================================================

/// In-memory document store.
///
/// Cheap to clone; clones share the same data.
#[derive(Clone)]
pub struct MemoryDocumentStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    /// Collection path -> (document key -> fields).
    collections: RwLock<HashMap<String, BTreeMap<String, Fields>>>,
    /// Paths of collections that were just written.
    changes: broadcast::Sender<String>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(MemoryInner {
                collections: RwLock::new(HashMap::new()),
                changes,
            }),
        }
    }

    fn notify(&self, collection: &CollectionPath) {
        // No receivers is fine
        let _ = self.inner.changes.send(collection.as_str().to_owned());
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<DocumentSnapshot>, BackendError> {
        let collections = self.inner.collections.read().await;
        Ok(collections
            .get(path.collection().as_str())
            .and_then(|docs| docs.get(path.id()))
            .map(|fields| DocumentSnapshot {
                id: path.id().to_owned(),
                fields: fields.clone(),
            }))
    }

    async fn add(&self, collection: &CollectionPath, fields: Fields) -> Result<String, BackendError> {
        let id = Uuid::new_v4().simple().to_string();
        self.inner
            .collections
            .write()
            .await
            .entry(collection.as_str().to_owned())
            .or_default()
            .insert(id.clone(), fields);
        self.notify(collection);
        Ok(id)
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<(), BackendError> {
        self.inner
            .collections
            .write()
            .await
            .entry(path.collection().as_str().to_owned())
            .or_default()
            .insert(path.id().to_owned(), fields);
        self.notify(path.collection());
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), BackendError> {
        {
            let mut collections = self.inner.collections.write().await;
            let existing = collections
                .get_mut(path.collection().as_str())
                .and_then(|docs| docs.get_mut(path.id()))
                .ok_or_else(|| BackendError::NotFound(path.to_string()))?;
            existing.extend(fields);
        }
        self.notify(path.collection());
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), BackendError> {
        let removed = self
            .inner
            .collections
            .write()
            .await
            .get_mut(path.collection().as_str())
            .and_then(|docs| docs.remove(path.id()))
            .is_some();
        if removed {
            self.notify(path.collection());
        }
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<DocumentSnapshot>, BackendError> {
        let documents = {
            let collections = self.inner.collections.read().await;
            collections
                .get(query.collection.as_str())
                .map(|docs| {
                    docs.iter()
                        .map(|(id, fields)| DocumentSnapshot {
                            id: id.clone(),
                            fields: fields.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default()
        };
        Ok(query.apply(documents))
    }

    fn listen(&self, query: Query) -> Subscription {
        let (tx, rx) = mpsc::channel(LISTENER_BUFFER);
        // Subscribe before the first read so no write can slip in between
        let mut changes = self.inner.changes.subscribe();
        let store = self.clone();

        let task = tokio::spawn(async move {
            let mut last: Option<Vec<DocumentSnapshot>> = None;
            loop {
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
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }

                loop {
                    match changes.recv().await {
                        Ok(path) if path == query.collection.as_str() => break,
                        Ok(_) => {}
                        // Missed notifications: re-read to be safe
                        Err(RecvError::Lagged(_)) => break,
                        Err(RecvError::Closed) => return,
                    }
                }
            }
        });

        Subscription::new(rx, task)
    }
}

// =============================================================================
// Files
// =============================================================================

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-memory object storage. URLs use the `memory://` scheme.
#[derive(Clone, Default)]
pub struct MemoryFileStorage {
    files: Arc<RwLock<HashMap<String, StoredFile>>>,
}

impl MemoryFileStorage {
    /// Read back an uploaded object.
    pub async fn get(&self, path: &str) -> Option<StoredFile> {
        self.files.read().await.get(path).cloned()
    }
}

#[async_trait]
impl FileStorage for MemoryFileStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BackendError> {
        self.files.write().await.insert(
            path.to_owned(),
            StoredFile {
                bytes,
                content_type: content_type.to_owned(),
            },
        );
        Ok(format!("memory://{path}"))
    }
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Clone)]
struct MemoryAccount {
    uid: String,
    password_hash: String,
    email_verified: bool,
}

/// In-memory email/password accounts, hashed with Argon2id.
#[derive(Clone, Default)]
pub struct MemoryAuthProvider {
    accounts: Arc<RwLock<HashMap<String, MemoryAccount>>>,
    reset_requests: Arc<RwLock<Vec<String>>>,
}

impl MemoryAuthProvider {
    /// Emails that password resets were requested for, oldest first.
    pub async fn reset_requests(&self) -> Vec<String> {
        self.reset_requests.read().await.clone()
    }

    /// Mark an account's email as verified.
    pub async fn verify_email(&self, email: &str) {
        if let Some(account) = self.accounts.write().await.get_mut(email) {
            account.email_verified = true;
        }
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthAccount, BackendError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(email) {
            return Err(BackendError::AlreadyExists(email.to_owned()));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| BackendError::Encoding(format!("password hashing failed: {e}")))?
            .to_string();

        let account = MemoryAccount {
            uid: Uuid::new_v4().simple().to_string(),
            password_hash,
            email_verified: false,
        };
        accounts.insert(email.to_owned(), account.clone());

        Ok(AuthAccount {
            uid: account.uid,
            email: email.to_owned(),
            email_verified: account.email_verified,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthAccount, BackendError> {
        let account = self
            .accounts
            .read()
            .await
            .get(email)
            .cloned()
            .ok_or(BackendError::InvalidCredentials)?;

        let parsed =
            PasswordHash::new(&account.password_hash).map_err(|_| BackendError::InvalidCredentials)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| BackendError::InvalidCredentials)?;

        Ok(AuthAccount {
            uid: account.uid,
            email: email.to_owned(),
            email_verified: account.email_verified,
        })
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), BackendError> {
        if !self.accounts.read().await.contains_key(email) {
            return Err(BackendError::NotFound(email.to_owned()));
        }
        self.reset_requests.write().await.push(email.to_owned());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::backend::Direction;

    fn fields(value: serde_json::Value) -> Fields {
        match value {
            serde_json::Value::Object(map) => map,
            _ => Fields::new(),
        }
    }

    #[tokio::test]
    async fn test_add_get_update_delete() {
        let store = MemoryDocumentStore::new();
        let faqs = CollectionPath::root("faqs");

        let id = store
            .add(&faqs, fields(json!({"question": "Returns?", "order": 1})))
            .await
            .unwrap();
        let path = faqs.doc(&id);

        store
            .update(&path, fields(json!({"order": 2})))
            .await
            .unwrap();
        let snapshot = store.get(&path).await.unwrap().unwrap();
        assert_eq!(snapshot.fields["question"], "Returns?");
        assert_eq!(snapshot.fields["order"], 2);

        store.delete(&path).await.unwrap();
        assert!(store.get(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = MemoryDocumentStore::new();
        let path = CollectionPath::root("wallets").doc("nobody");
        let err = store.update(&path, Fields::new()).await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_subcollections_are_isolated() {
        let store = MemoryDocumentStore::new();
        let users = CollectionPath::root("users");
        let a = users.doc("a").subcollection("addresses");
        let b = users.doc("b").subcollection("addresses");

        store.add(&a, fields(json!({"city": "Oslo"}))).await.unwrap();

        assert_eq!(store.query(&Query::new(a)).await.unwrap().len(), 1);
        assert!(store.query(&Query::new(b)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listener_receives_initial_and_updated_snapshots() {
        let store = MemoryDocumentStore::new();
        let messages = CollectionPath::root("supportChats")
            .doc("u1")
            .subcollection("messages");

        let mut subscription = store.listen(
            Query::new(messages.clone()).order_by("timestamp", Direction::Ascending),
        );

        let initial = subscription.next().await.unwrap().unwrap();
        assert!(initial.is_empty());

        store
            .add(
                &messages,
                fields(json!({"content": "hi", "timestamp": "2024-01-01T00:00:00.000Z"})),
            )
            .await
            .unwrap();

        let updated = tokio::time::timeout(Duration::from_secs(1), subscription.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].fields["content"], "hi");
    }

    #[tokio::test]
    async fn test_file_storage_round_trip() {
        let storage = MemoryFileStorage::default();
        let url = storage
            .upload("avatars/u1/a.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        assert_eq!(url, "memory://avatars/u1/a.png");
        assert_eq!(
            storage.get("avatars/u1/a.png").await.unwrap().content_type,
            "image/png"
        );
        assert!(storage.get("avatars/u1/b.png").await.is_none());
    }

    #[tokio::test]
    async fn test_auth_sign_up_and_sign_in() {
        let auth = MemoryAuthProvider::default();
        let account = auth.sign_up("buyer@example.com", "hunter22").await.unwrap();
        assert!(!account.email_verified);

        let signed_in = auth.sign_in("buyer@example.com", "hunter22").await.unwrap();
        assert_eq!(signed_in.uid, account.uid);

        let err = auth.sign_in("buyer@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidCredentials));

        let err = auth.sign_up("buyer@example.com", "again123").await.unwrap_err();
        assert!(matches!(err, BackendError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_password_reset_requires_account() {
        let auth = MemoryAuthProvider::default();
        assert!(matches!(
            auth.send_password_reset("ghost@example.com").await,
            Err(BackendError::NotFound(_))
        ));

        auth.sign_up("buyer@example.com", "hunter22").await.unwrap();
        auth.send_password_reset("buyer@example.com").await.unwrap();
        assert_eq!(auth.reset_requests().await, vec!["buyer@example.com"]);
    }
}
