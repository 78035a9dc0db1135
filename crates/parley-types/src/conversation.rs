//! Conversation records and title rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{ConversationId, UserId};

/// Title assigned to every conversation until it is renamed or summarized.
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Upper bound on title length, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// A conversation owned by exactly one user.
///
/// `message_count` is denormalized: it tracks the number of messages attached
/// to the conversation and is only changed through the store's atomic adjust
/// operation. `is_active == false` marks a soft-deleted conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub owner_id: UserId,
    pub title: String,
    pub message_count: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// A fresh, empty, active conversation.
    pub fn new(owner_id: UserId, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            owner_id,
            title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            message_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_default_title(&self) -> bool {
        self.title == DEFAULT_TITLE
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id,
            title: self.title.clone(),
            message_count: self.message_count,
        }
    }
}

/// The slice of a conversation returned alongside a completed turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: String,
    pub message_count: u32,
}

/// Validate a user-supplied title: trimmed, non-empty, bounded.
pub fn validate_title(raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ValidationError::new("title", "title must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ValidationError::new(
            "title",
            format!("title cannot be more than {MAX_TITLE_CHARS} characters"),
        ));
    }
    Ok(title.to_string())
}

/// Cut `text` to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
