//! Conversation CRUD handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use parley_types::conversation::Conversation;
use parley_types::error::{Resource, ValidationError};
use parley_types::id::ConversationId;

use super::parse_id;
use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::extractors::json::ApiJson;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateConversationRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// POST /api/v1/conversations
pub async fn create_conversation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Option<ApiJson<CreateConversationRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<Conversation>>), AppError> {
    let body = body.map(|ApiJson(body)| body).unwrap_or_default();
    let conversation = state
        .conversations
        .create(&user.id, body.title.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(conversation))))
}

/// GET /api/v1/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<Vec<Conversation>>>, AppError> {
    let conversations = state.conversations.list(&user.id).await?;
    Ok(Json(ApiResponse::list(conversations)))
}

/// GET /api/v1/conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let id: ConversationId = parse_id(&id, Resource::Conversation)?;
    let conversation = state.conversations.get(&user.id, &id).await?;
    Ok(Json(ApiResponse::success(conversation)))
}

/// PUT /api/v1/conversations/{id}
///
/// Only the title can be changed.
pub async fn update_conversation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateConversationRequest>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let id: ConversationId = parse_id(&id, Resource::Conversation)?;
    let title = body
        .title
        .ok_or_else(|| ValidationError::new("title", "title is required"))?;

    let conversation = state.conversations.rename(&user.id, &id, &title).await?;
    Ok(Json(ApiResponse::success(conversation)))
}

/// DELETE /api/v1/conversations/{id}
pub async fn delete_conversation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id: ConversationId = parse_id(&id, Resource::Conversation)?;
    state.conversations.soft_delete(&user.id, &id).await?;
    Ok(Json(ApiResponse::message("Conversation deleted")))
}
