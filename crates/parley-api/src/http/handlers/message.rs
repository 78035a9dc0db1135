//! Message listing, turn submission and deletion handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use parley_core::chat::orchestrator::TurnOutcome;
use parley_types::error::{Resource, ValidationError};
use parley_types::id::{ConversationId, MessageId};
use parley_types::message::Message;

use super::parse_id;
use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::extractors::json::ApiJson;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesQuery {
    pub conversation_id: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Resolve the requested page size: default when absent, capped at `max`.
fn page_limit(raw: Option<&str>, default: u32, max: u32) -> Result<u32, ValidationError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default.min(max));
    };
    match raw.parse::<u32>() {
        Ok(0) | Err(_) => Err(ValidationError::new(
            "limit",
            "limit must be a positive integer",
        )),
        Ok(n) => Ok(n.min(max)),
    }
}

/// GET /api/v1/messages?conversationId=&limit=
pub async fn list_messages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListMessagesQuery>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let raw_id = query
        .conversation_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ValidationError::new("conversationId", "conversationId is required"))?;
    let conversation_id: ConversationId = parse_id(raw_id, Resource::Conversation)?;
    let limit = page_limit(
        query.limit.as_deref(),
        state.chat.message_page_limit,
        state.chat.max_message_page,
    )?;

    let messages = state
        .messages
        .list(&user.id, &conversation_id, limit)
        .await?;
    Ok(Json(ApiResponse::list(messages)))
}

/// POST /api/v1/messages
///
/// Runs a full turn: the user message is stored, the model replies, and both
/// are returned with the refreshed conversation summary.
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<SendMessageRequest>,
) -> Result<Json<ApiResponse<TurnOutcome>>, AppError> {
    let raw_id = body
        .conversation_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ValidationError::new("conversationId", "conversationId is required"))?;
    let conversation_id: ConversationId = parse_id(raw_id, Resource::Conversation)?;
    let content = body.content.unwrap_or_default();

    let outcome = state
        .turns
        .submit(&user.id, &conversation_id, &content)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// DELETE /api/v1/messages/{id}
pub async fn delete_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    let id: MessageId = parse_id(&id, Resource::Message)?;
    let deleted = state.messages.delete(&user.id, &id).await?;
    Ok(Json(ApiResponse::success(deleted).with_message("Message deleted")))
}
