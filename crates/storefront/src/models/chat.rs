//! Support chat types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use marketplace_core::{ChatMessageId, ChatThreadStatus, UserId};

/// A user's support conversation (`supportChats/{uid}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatThread {
    /// Owner; also the thread key.
    pub user_id: UserId,
    pub status: ChatThreadStatus,
    /// Unread message counter.
    pub unread_count: u32,
    pub last_message: Option<String>,
    pub last_message_time: Option<DateTime<Utc>>,
}

/// One message in a support thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: ChatMessageId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// `true` when sent by the customer, `false` when sent by support.
    pub is_from_user: bool,
    pub read: bool,
}
