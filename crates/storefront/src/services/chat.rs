//! Support chat service.
//!
//! One thread per user, keyed by the user ID. The thread summary carries the
//! last message and an unread counter; the message list itself lives in a
//! subcollection and can be followed live through [`ChatService::subscribe`].

use futures::StreamExt;
use futures::stream::BoxStream;
use thiserror::Error;
use tracing::{info, instrument};

use marketplace_core::{ChatThreadStatus, UserId};

use crate::backend::Backend;
use crate::db::chat::decode_messages;
use crate::db::{ChatRepository, RepositoryError, now};
use crate::models::{ChatMessage, ChatThread};

/// Errors that can occur during chat operations.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,

    #[error("chat thread not found")]
    NotFound,

    #[error("repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ChatError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// Live message list updates.
pub type MessageStream = BoxStream<'static, Result<Vec<ChatMessage>, ChatError>>;

/// Support chat service.
pub struct ChatService<'a> {
    chat: ChatRepository<'a>,
}

impl<'a> ChatService<'a> {
    /// Create a new chat service.
    #[must_use]
    pub fn new(backend: &'a Backend) -> Self {
        Self {
            chat: ChatRepository::new(backend.documents.as_ref()),
        }
    }

    /// The user's thread, created as `active` on first use.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Repository` if the read or write fails.
    #[instrument(skip(self))]
    pub async fn get_or_create_thread(&self, user_id: &UserId) -> Result<ChatThread, ChatError> {
        if let Some(thread) = self.chat.get_thread(user_id).await? {
            return Ok(thread);
        }
        info!(%user_id, "Opening support chat thread");
        Ok(self.chat.create_thread(user_id).await?)
    }

    /// Send a message from the user. A closed thread is reopened.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::EmptyMessage` for blank content.
    #[instrument(skip(self, content))]
    pub async fn send_message(
        &self,
        user_id: &UserId,
        content: &str,
    ) -> Result<ChatMessage, ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let thread = self.get_or_create_thread(user_id).await?;
        let message = self.chat.add_message(user_id, content, true, now()).await?;
        self.chat
            .record_last_message(
                user_id,
                content,
                message.timestamp,
                thread.unread_count.saturating_add(1),
                ChatThreadStatus::Active,
            )
            .await?;

        Ok(message)
    }

    /// All messages, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_messages(&self, user_id: &UserId) -> Result<Vec<ChatMessage>, ChatError> {
        Ok(self.chat.list_messages(user_id).await?)
    }

    /// Mark every support reply as read and reset the unread counter.
    ///
    /// Returns the number of messages flagged.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::NotFound` if the user has no thread.
    #[instrument(skip(self))]
    pub async fn mark_read(&self, user_id: &UserId) -> Result<usize, ChatError> {
        let unread = self.chat.unread_replies(user_id).await?;
        for message_id in &unread {
            self.chat.mark_message_read(user_id, message_id).await?;
        }
        self.chat.reset_unread(user_id).await?;
        Ok(unread.len())
    }

    /// Close the thread. Sending a new message reopens it.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::NotFound` if the user has no thread.
    #[instrument(skip(self))]
    pub async fn close_thread(&self, user_id: &UserId) -> Result<(), ChatError> {
        self.chat.set_status(user_id, ChatThreadStatus::Closed).await?;
        info!(%user_id, "Support chat thread closed");
        Ok(())
    }

    /// Follow the message list. The listener stops when the stream is dropped.
    #[must_use]
    pub fn subscribe(&self, user_id: &UserId) -> MessageStream {
        self.chat
            .subscribe(user_id)
            .into_stream()
            .map(|snapshots| -> Result<Vec<ChatMessage>, ChatError> {
                let snapshots = snapshots.map_err(RepositoryError::from)?;
                Ok(decode_messages(&snapshots)?)
            })
            .boxed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_send_message_creates_thread_and_counts_unread() {
        let backend = Backend::in_memory();
        let chat = ChatService::new(&backend);
        let user = UserId::new("u1");

        chat.send_message(&user, "  Where is my parcel?  ").await.unwrap();
        chat.send_message(&user, "Hello?").await.unwrap();

        let thread = chat.get_or_create_thread(&user).await.unwrap();
        assert_eq!(thread.status, ChatThreadStatus::Active);
        assert_eq!(thread.unread_count, 2);
        assert_eq!(thread.last_message.as_deref(), Some("Hello?"));

        let messages = chat.list_messages(&user).await.unwrap();
        assert_eq!(messages[0].content, "Where is my parcel?");
        assert!(messages.iter().all(|m| m.is_from_user && !m.read));
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let backend = Backend::in_memory();
        let err = ChatService::new(&backend)
            .send_message(&UserId::new("u1"), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));
    }

    #[tokio::test]
    async fn test_closed_thread_reopens_on_send() {
        let backend = Backend::in_memory();
        let chat = ChatService::new(&backend);
        let user = UserId::new("u1");

        chat.send_message(&user, "first").await.unwrap();
        chat.close_thread(&user).await.unwrap();
        assert_eq!(
            chat.get_or_create_thread(&user).await.unwrap().status,
            ChatThreadStatus::Closed
        );

        chat.send_message(&user, "again").await.unwrap();
        assert_eq!(
            chat.get_or_create_thread(&user).await.unwrap().status,
            ChatThreadStatus::Active
        );
    }

    #[tokio::test]
    async fn test_mark_read_flags_support_replies() {
        let backend = Backend::in_memory();
        let chat = ChatService::new(&backend);
        let repo = ChatRepository::new(backend.documents.as_ref());
        let user = UserId::new("u1");

        chat.send_message(&user, "help").await.unwrap();
        repo.add_message(&user, "on it", false, now()).await.unwrap();
        repo.add_message(&user, "done", false, now()).await.unwrap();

        assert_eq!(chat.mark_read(&user).await.unwrap(), 2);
        assert_eq!(chat.get_or_create_thread(&user).await.unwrap().unread_count, 0);
        let messages = chat.list_messages(&user).await.unwrap();
        assert!(messages.iter().filter(|m| !m.is_from_user).all(|m| m.read));
        assert!(messages.iter().filter(|m| m.is_from_user).all(|m| !m.read));
    }

    #[tokio::test]
    async fn test_close_without_thread_is_not_found() {
        let backend = Backend::in_memory();
        let err = ChatService::new(&backend)
            .close_thread(&UserId::new("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotFound));
    }

    #[tokio::test]
    async fn test_subscription_sees_new_messages() {
        let backend = Backend::in_memory();
        let chat = ChatService::new(&backend);
        let user = UserId::new("u1");
        let mut stream = chat.subscribe(&user);

        chat.send_message(&user, "ping").await.unwrap();

        let delivered = tokio::time::timeout(Duration::from_secs(2), async {
            while let Some(update) = stream.next().await {
                let messages = update.unwrap();
                if messages.iter().any(|m| m.content == "ping") {
                    return true;
                }
            }
            false
        })
        .await
        .unwrap();
        assert!(delivered);
    }
}
