use thiserror::Error;

use std::fmt;

use crate::message::Message;

/// Kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Conversation,
    Message,
    User,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Conversation => write!(f, "conversation"),
            Resource::Message => write!(f, "message"),
            Resource::User => write!(f, "user"),
        }
    }
}

/// A single field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    /// The target row exists but has been soft-deleted.
    #[error("entity is inactive")]
    Inactive,
}

/// Provider-agnostic failure of the completion gateway.
///
/// Callers see exactly these four kinds; everything the provider reports is
/// folded into one of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiError {
    #[error("AI service rejected the configured API key")]
    InvalidCredential,

    #[error("AI service quota exceeded, please try again later")]
    QuotaExceeded,

    #[error("AI service blocked the content for safety reasons")]
    ContentBlocked,

    #[error("failed to get AI response: {0}")]
    Unavailable(String),
}

/// Bearer credential failures. All map to 401.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Not authorized, no token provided")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Errors surfaced by conversation, message, and turn operations.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid {0} ID format")]
    InvalidId(Resource),

    #[error("{0} not found")]
    NotFound(Resource),

    #[error("Not authorized to access this {0}")]
    Forbidden(Resource),

    #[error("conversation has been deleted")]
    ConversationInactive,

    /// The user message was stored but no assistant reply could be produced.
    #[error("{source}")]
    TurnFailed {
        user_message: Box<Message>,
        source: AiError,
    },

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<RepositoryError> for ChatError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Inactive => ChatError::ConversationInactive,
            RepositoryError::NotFound => ChatError::NotFound(Resource::Conversation),
            other => ChatError::Storage(other.to_string()),
        }
    }
}

/// Errors surfaced by account operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid user ID format")]
    InvalidId,

    #[error("user not found")]
    NotFound,

    #[error("Not authorized to modify this profile")]
    Forbidden,

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<RepositoryError> for UserError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => UserError::NotFound,
            RepositoryError::Conflict(msg) => UserError::Conflict(msg),
            other => UserError::Storage(other.to_string()),
        }
    }
}
