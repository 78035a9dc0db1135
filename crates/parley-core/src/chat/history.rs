//! Bounded, chronologically ordered context for the model.

use parley_types::error::RepositoryError;
use parley_types::id::{ConversationId, MessageId};
use parley_types::message::{Message, Role};

use crate::repository::SortOrder;
use crate::repository::message::MessageRepository;

/// Prior messages sent as context when nothing else is configured.
pub const DEFAULT_HISTORY_WINDOW: u32 = 10;

/// One prior message as the model sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl From<Message> for HistoryEntry {
    fn from(message: Message) -> Self {
        Self {
            role: message.role,
            content: message.content,
        }
    }
}

/// The most recent `max_turns` messages of a conversation, oldest first.
///
/// `exclude` drops one message (the turn currently being answered) before the
/// bound is applied, so it never costs a slot. Older messages fall off silently.
pub async fn window<M: MessageRepository>(
    messages: &M,
    conversation_id: &ConversationId,
    max_turns: u32,
    exclude: Option<&MessageId>,
) -> Result<Vec<HistoryEntry>, RepositoryError> {
    if max_turns == 0 {
        return Ok(Vec::new());
    }

    let fetch = max_turns.saturating_add(u32::from(exclude.is_some()));
    let mut recent = messages
        .list_by_conversation(conversation_id, SortOrder::Desc, fetch)
        .await?;

    if let Some(excluded) = exclude {
        recent.retain(|m| m.id != *excluded);
    }
    recent.truncate(max_turns as usize);
    recent.reverse();

    Ok(recent.into_iter().map(HistoryEntry::from).collect())
}
