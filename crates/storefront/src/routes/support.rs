//! Help center and support chat route handlers.
//!
//! FAQ routes are public; chat routes act on the logged-in user's thread.
//! `GET /api/support/chat/stream` is a server-sent event stream that emits the
//! full message list whenever it changes and stops when the client goes away.

use std::convert::Infallible;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{
        Sse,
        sse::{Event, KeepAlive},
    },
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{ChatMessage, ChatThread, Faq, FaqCategory, FaqGroup};
use crate::services::{ChatService, FaqService};
use crate::state::AppState;

// =============================================================================
// FAQ
// =============================================================================

/// FAQ list filter.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FaqQuery {
    pub category: Option<String>,
}

/// FAQ search term.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub q: String,
}

/// FAQs in display order.
///
/// GET /api/support/faq?category=
///
/// # Errors
///
/// Returns `AppError::Repository` if the FAQs cannot be read.
pub async fn faqs(
    State(state): State<AppState>,
    Query(query): Query<FaqQuery>,
) -> Result<Json<Vec<Faq>>> {
    let faqs = FaqService::new(state.backend())
        .list_faqs(query.category.as_deref())
        .await?;
    Ok(Json(faqs))
}

/// FAQ categories.
///
/// GET /api/support/faq/categories
///
/// # Errors
///
/// Returns `AppError::Repository` if the categories cannot be read.
pub async fn faq_categories(State(state): State<AppState>) -> Result<Json<Vec<FaqCategory>>> {
    let categories = FaqService::new(state.backend()).list_categories().await?;
    Ok(Json(categories))
}

/// FAQs grouped by category.
///
/// GET /api/support/faq/grouped
///
/// # Errors
///
/// Returns `AppError::Repository` if the FAQs cannot be read.
pub async fn faq_grouped(State(state): State<AppState>) -> Result<Json<Vec<FaqGroup>>> {
    let groups = FaqService::new(state.backend()).grouped().await?;
    Ok(Json(groups))
}

/// Search FAQs.
///
/// GET /api/support/faq/search?q=
///
/// # Errors
///
/// Returns `AppError::Repository` if the FAQs cannot be read.
pub async fn faq_search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Faq>>> {
    let faqs = FaqService::new(state.backend()).search(&query.q).await?;
    Ok(Json(faqs))
}

// =============================================================================
// Chat
// =============================================================================

/// Thread summary with its messages.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub thread: ChatThread,
    pub messages: Vec<ChatMessage>,
}

/// Request to send a chat message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// The user's thread, opened on first visit.
///
/// GET /api/support/chat
///
/// # Errors
///
/// Returns `AppError::Chat` if the thread cannot be read or created.
pub async fn chat(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ChatResponse>> {
    let chat = ChatService::new(state.backend());
    let thread = chat.get_or_create_thread(&user.id).await?;
    let messages = chat.list_messages(&user.id).await?;
    Ok(Json(ChatResponse { thread, messages }))
}

/// Send a message to support.
///
/// POST /api/support/chat/messages
///
/// # Errors
///
/// Returns `400` for an empty message.
pub async fn send_message(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessage>)> {
    let message = ChatService::new(state.backend())
        .send_message(&user.id, &request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Mark support replies as read.
///
/// POST /api/support/chat/read
///
/// # Errors
///
/// Returns `404` if the user has no thread.
pub async fn mark_read(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<StatusCode> {
    ChatService::new(state.backend()).mark_read(&user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Close the thread.
///
/// POST /api/support/chat/close
///
/// # Errors
///
/// Returns `404` if the user has no thread.
pub async fn close(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<StatusCode> {
    ChatService::new(state.backend())
        .close_thread(&user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Follow the message list.
///
/// GET /api/support/chat/stream
///
/// Emits `messages` events carrying the whole list as JSON, and an `error`
/// event if the listener fails.
pub async fn stream(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let updates = ChatService::new(state.backend()).subscribe(&user.id);

    let events = updates.map(|update| {
        let event = match update {
            Ok(messages) => Event::default()
                .event("messages")
                .json_data(&messages)
                .unwrap_or_else(|e| Event::default().event("error").data(e.to_string())),
            Err(e) => {
                tracing::warn!(error = %e, "Chat subscription failed");
                Event::default().event("error").data(e.to_string())
            }
        };
        Ok(event)
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
