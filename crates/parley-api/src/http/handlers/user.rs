//! Account handlers: registration, login and self-service profile management.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use parley_core::service::user::Session;
use parley_types::error::Resource;
use parley_types::id::UserId;
use parley_types::user::{NewUser, User, UserUpdate};

use super::parse_id;
use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::extractors::json::ApiJson;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionBody {
    pub user: User,
    pub token: String,
}

impl From<Session> for SessionBody {
    fn from(session: Session) -> Self {
        Self {
            user: session.user,
            token: session.token,
        }
    }
}

/// POST /api/v1/users/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<ApiResponse<SessionBody>>), AppError> {
    let session = state.users.register(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(SessionBody::from(session))),
    ))
}

/// POST /api/v1/users/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<SessionBody>>, AppError> {
    let session = state.users.login(&body.email, &body.password).await?;
    Ok(Json(ApiResponse::success(SessionBody::from(session))))
}

/// GET /api/v1/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let id: UserId = parse_id(&id, Resource::User)?;
    let user = state.users.get_profile(&caller.id, &id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// PUT /api/v1/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UserUpdate>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let id: UserId = parse_id(&id, Resource::User)?;
    let user = state.users.update_profile(&caller.id, &id, body).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// DELETE /api/v1/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id: UserId = parse_id(&id, Resource::User)?;
    state.users.delete_account(&caller.id, &id).await?;
    Ok(Json(ApiResponse::message("User deleted")))
}
