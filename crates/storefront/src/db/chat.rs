//! Support chat repository (`supportChats/{uid}` and its `messages`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use marketplace_core::{ChatMessageId, ChatThreadStatus, UserId};

use super::{
    RepositoryError, collections, decode, fields, format_timestamp, timestamp, to_fields,
};
use crate::backend::{
    CollectionPath, Direction, DocumentPath, DocumentSnapshot, DocumentStore, Query,
    Subscription,
};
use crate::models::chat::{ChatMessage, ChatThread};

// =============================================================================
// Stored Documents
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadDocument {
    #[serde(default)]
    status: ChatThreadStatus,
    #[serde(default)]
    unread_count: u32,
    #[serde(default)]
    last_message: Option<String>,
    #[serde(default, with = "timestamp::option")]
    last_message_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageDocument {
    content: String,
    #[serde(with = "timestamp")]
    timestamp: DateTime<Utc>,
    is_from_user: bool,
    #[serde(default)]
    read: bool,
}

fn into_message(snapshot: &DocumentSnapshot) -> Result<ChatMessage, RepositoryError> {
    let doc: MessageDocument = decode(snapshot)?;
    Ok(ChatMessage {
        id: ChatMessageId::new(snapshot.id.clone()),
        content: doc.content,
        timestamp: doc.timestamp,
        is_from_user: doc.is_from_user,
        read: doc.read,
    })
}

/// Decode a message list as delivered by a live subscription.
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` if any message is invalid.
pub fn decode_messages(snapshots: &[DocumentSnapshot]) -> Result<Vec<ChatMessage>, RepositoryError> {
    snapshots.iter().map(into_message).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for support chat threads.
pub struct ChatRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ChatRepository<'a> {
    /// Create a new chat repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    fn thread_path(user_id: &UserId) -> DocumentPath {
        CollectionPath::root(collections::SUPPORT_CHATS).doc(user_id.as_str())
    }

    fn messages(user_id: &UserId) -> CollectionPath {
        Self::thread_path(user_id).subcollection(collections::MESSAGES)
    }

    /// The user's message list in chronological order.
    #[must_use]
    pub fn messages_query(user_id: &UserId) -> Query {
        Query::new(Self::messages(user_id)).order_by("timestamp", Direction::Ascending)
    }

    /// Get the user's thread.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the read fails.
    pub async fn get_thread(&self, user_id: &UserId) -> Result<Option<ChatThread>, RepositoryError> {
        let Some(snapshot) = self.store.get(&Self::thread_path(user_id)).await? else {
            return Ok(None);
        };
        let doc: ThreadDocument = decode(&snapshot)?;

        Ok(Some(ChatThread {
            user_id: user_id.clone(),
            status: doc.status,
            unread_count: doc.unread_count,
            last_message: doc.last_message,
            last_message_time: doc.last_message_time,
        }))
    }

    /// Create an empty active thread.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the write fails.
    pub async fn create_thread(&self, user_id: &UserId) -> Result<ChatThread, RepositoryError> {
        let document = ThreadDocument {
            status: ChatThreadStatus::Active,
            unread_count: 0,
            last_message: None,
            last_message_time: None,
        };
        self.store
            .set(&Self::thread_path(user_id), to_fields(&document)?)
            .await?;

        Ok(ChatThread {
            user_id: user_id.clone(),
            status: document.status,
            unread_count: 0,
            last_message: None,
            last_message_time: None,
        })
    }

    /// Append a message to the thread.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the write fails.
    pub async fn add_message(
        &self,
        user_id: &UserId,
        content: &str,
        is_from_user: bool,
        timestamp: DateTime<Utc>,
    ) -> Result<ChatMessage, RepositoryError> {
        let document = MessageDocument {
            content: content.to_owned(),
            timestamp,
            is_from_user,
            read: false,
        };
        let id = self
            .store
            .add(&Self::messages(user_id), to_fields(&document)?)
            .await?;

        Ok(ChatMessage {
            id: ChatMessageId::new(id),
            content: document.content,
            timestamp,
            is_from_user,
            read: false,
        })
    }

    /// Record the latest message on the thread summary.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the thread does not exist.
    pub async fn record_last_message(
        &self,
        user_id: &UserId,
        content: &str,
        time: DateTime<Utc>,
        unread_count: u32,
        status: ChatThreadStatus,
    ) -> Result<(), RepositoryError> {
        self.store
            .update(
                &Self::thread_path(user_id),
                fields(json!({
                    "lastMessage": content,
                    "lastMessageTime": format_timestamp(&time),
                    "unreadCount": unread_count,
                    "status": status.as_str(),
                })),
            )
            .await
            .map_err(RepositoryError::missing_as_not_found)
    }

    /// Change the thread status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the thread does not exist.
    pub async fn set_status(
        &self,
        user_id: &UserId,
        status: ChatThreadStatus,
    ) -> Result<(), RepositoryError> {
        self.store
            .update(
                &Self::thread_path(user_id),
                fields(json!({ "status": status.as_str() })),
            )
            .await
            .map_err(RepositoryError::missing_as_not_found)
    }

    /// Reset the thread's unread counter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the thread does not exist.
    pub async fn reset_unread(&self, user_id: &UserId) -> Result<(), RepositoryError> {
        self.store
            .update(
                &Self::thread_path(user_id),
                fields(json!({ "unreadCount": 0 })),
            )
            .await
            .map_err(RepositoryError::missing_as_not_found)
    }

    /// All messages in chronological order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    pub async fn list_messages(&self, user_id: &UserId) -> Result<Vec<ChatMessage>, RepositoryError> {
        decode_messages(&self.store.query(&Self::messages_query(user_id)).await?)
    }

    /// IDs of support replies the user has not read yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    pub async fn unread_replies(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ChatMessageId>, RepositoryError> {
        let query = Query::new(Self::messages(user_id))
            .where_eq("isFromUser", false)
            .where_eq("read", false);

        Ok(self
            .store
            .query(&query)
            .await?
            .into_iter()
            .map(|snapshot| ChatMessageId::new(snapshot.id))
            .collect())
    }

    /// Flag one message as read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the message does not exist.
    pub async fn mark_message_read(
        &self,
        user_id: &UserId,
        message_id: &ChatMessageId,
    ) -> Result<(), RepositoryError> {
        self.store
            .update(
                &Self::messages(user_id).doc(message_id.as_str()),
                fields(json!({ "read": true })),
            )
            .await
            .map_err(RepositoryError::missing_as_not_found)
    }

    /// Live view of the message list.
    #[must_use]
    pub fn subscribe(&self, user_id: &UserId) -> Subscription {
        self.store.listen(Self::messages_query(user_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::backend::memory::MemoryDocumentStore;

    #[tokio::test]
    async fn test_messages_are_chronological() {
        let store = MemoryDocumentStore::new();
        let chat = ChatRepository::new(&store);
        let user = UserId::new("u1");
        let now = Utc::now();

        chat.create_thread(&user).await.unwrap();
        chat.add_message(&user, "second", true, now).await.unwrap();
        chat.add_message(&user, "first", false, now - Duration::seconds(5))
            .await
            .unwrap();

        let messages = chat.list_messages(&user).await.unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["first", "second"]);
    }

    #[tokio::test]
    async fn test_unread_replies_only_counts_support_messages() {
        let store = MemoryDocumentStore::new();
        let chat = ChatRepository::new(&store);
        let user = UserId::new("u1");
        let now = Utc::now();

        chat.create_thread(&user).await.unwrap();
        chat.add_message(&user, "help", true, now).await.unwrap();
        let reply = chat.add_message(&user, "hi!", false, now).await.unwrap();

        let unread = chat.unread_replies(&user).await.unwrap();
        assert_eq!(unread, vec![reply.id.clone()]);

        chat.mark_message_read(&user, &reply.id).await.unwrap();
        assert!(chat.unread_replies(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_thread() {
        let store = MemoryDocumentStore::new();
        let chat = ChatRepository::new(&store);
        assert!(chat.get_thread(&UserId::new("u1")).await.unwrap().is_none());
        assert!(matches!(
            chat.reset_unread(&UserId::new("u1")).await.unwrap_err(),
            RepositoryError::NotFound
        ));
    }
}
