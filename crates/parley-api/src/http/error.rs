//! Application error type mapping to HTTP status codes and envelope format.
//!
//! ```json
//! { "success": false, "error": "Conversation not found", "code": "NOT_FOUND" }
//! ```

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use parley_types::error::{AiError, AuthError, ChatError, Resource, UserError, ValidationError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Chat(ChatError),
    User(UserError),
    Auth(AuthError),
    Validation(ValidationError),
    /// A path or query identifier that is not a UUID.
    InvalidId(Resource),
    /// Body could not be decoded.
    BadRequest(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<UserError> for AppError {
    fn from(e: UserError) -> Self {
        AppError::User(e)
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

struct Rendered {
    status: StatusCode,
    code: &'static str,
    message: String,
    data: Option<Value>,
}

impl Rendered {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            data: None,
        }
    }

    fn internal(detail: &str) -> Self {
        tracing::error!(error = %detail, "Internal error while handling request");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal server error",
        )
    }
}

fn not_found_message(resource: Resource) -> &'static str {
    match resource {
        Resource::Conversation => "Conversation not found",
        Resource::Message => "Message not found",
        Resource::User => "User not found",
    }
}

fn render_ai(err: &AiError) -> Rendered {
    let (status, code) = match err {
        AiError::InvalidCredential => (StatusCode::BAD_GATEWAY, "AI_INVALID_CREDENTIAL"),
        AiError::ContentBlocked => (StatusCode::BAD_GATEWAY, "AI_CONTENT_BLOCKED"),
        AiError::QuotaExceeded => (StatusCode::SERVICE_UNAVAILABLE, "AI_QUOTA_EXCEEDED"),
        AiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "AI_UNAVAILABLE"),
    };
    let message = match err {
        // Provider detail stays in the logs
        AiError::Unavailable(detail) => {
            tracing::warn!(error = %detail, "AI service unavailable");
            "Failed to get AI response".to_string()
        }
        other => other.to_string(),
    };
    Rendered::new(status, code, message)
}

fn render_auth(err: &AuthError) -> Rendered {
    let code = match err {
        AuthError::MissingToken => "MISSING_TOKEN",
        AuthError::InvalidToken => "INVALID_TOKEN",
        AuthError::TokenExpired => "TOKEN_EXPIRED",
        AuthError::UserNotFound => "UNAUTHORIZED",
        AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
        AuthError::Signing(detail) => return Rendered::internal(detail),
    };
    Rendered::new(StatusCode::UNAUTHORIZED, code, err.to_string())
}

fn render_validation(err: &ValidationError) -> Rendered {
    let mut rendered = Rendered::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.message.clone());
    rendered.data = Some(json!({ "field": err.field }));
    rendered
}

impl AppError {
    fn render(&self) -> Rendered {
        match self {
            AppError::Chat(e) => match e {
                ChatError::Validation(v) => render_validation(v),
                ChatError::InvalidId(_) => {
                    Rendered::new(StatusCode::BAD_REQUEST, "INVALID_ID", e.to_string())
                }
                ChatError::NotFound(resource) => {
                    Rendered::new(StatusCode::NOT_FOUND, "NOT_FOUND", not_found_message(*resource))
                }
                ChatError::Forbidden(_) => {
                    Rendered::new(StatusCode::FORBIDDEN, "FORBIDDEN", e.to_string())
                }
                ChatError::ConversationInactive => Rendered::new(
                    StatusCode::CONFLICT,
                    "CONVERSATION_INACTIVE",
                    "Conversation has been deleted",
                ),
                ChatError::TurnFailed {
                    user_message,
                    source,
                } => {
                    let mut rendered = render_ai(source);
                    rendered.data = Some(json!({ "userMessage": user_message }));
                    rendered
                }
                ChatError::Storage(detail) => Rendered::internal(detail),
            },
            AppError::User(e) => match e {
                UserError::Validation(v) => render_validation(v),
                UserError::InvalidId => {
                    Rendered::new(StatusCode::BAD_REQUEST, "INVALID_ID", e.to_string())
                }
                UserError::NotFound => Rendered::new(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    not_found_message(Resource::User),
                ),
                UserError::Forbidden => {
                    Rendered::new(StatusCode::FORBIDDEN, "FORBIDDEN", e.to_string())
                }
                UserError::Conflict(msg) => {
                    Rendered::new(StatusCode::CONFLICT, "CONFLICT", msg.clone())
                }
                UserError::Auth(a) => render_auth(a),
                UserError::Hashing(detail) | UserError::Storage(detail) => {
                    Rendered::internal(detail)
                }
            },
            AppError::Auth(e) => render_auth(e),
            AppError::Validation(v) => render_validation(v),
            AppError::InvalidId(resource) => Rendered::new(
                StatusCode::BAD_REQUEST,
                "INVALID_ID",
                ChatError::InvalidId(*resource).to_string(),
            ),
            AppError::BadRequest(msg) => {
                Rendered::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let rendered = self.render();

        let mut body = json!({
            "success": false,
            "error": rendered.message,
            "code": rendered.code,
        });
        if let Some(data) = rendered.data {
            body["data"] = data;
        }

        (rendered.status, Json(body)).into_response()
    }
}
