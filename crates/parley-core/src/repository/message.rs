//! MessageRepository trait definition.

use parley_types::error::RepositoryError;
use parley_types::id::{ConversationId, MessageId};
use parley_types::message::Message;

use super::SortOrder;

/// Repository trait for message persistence.
///
/// Messages are immutable; the only mutation is deletion. Ordering is by
/// `created_at`, ties broken by id (UUID v7, so still creation order).
pub trait MessageRepository: Send + Sync {
    /// Insert a new message. Content has already been validated by
    /// `MessageContent::parse`.
    fn create(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<Message, RepositoryError>> + Send;

    /// Get a message by its unique ID.
    fn get(
        &self,
        id: &MessageId,
    ) -> impl std::future::Future<Output = Result<Option<Message>, RepositoryError>> + Send;

    /// Messages of one conversation ordered by creation time.
    fn list_by_conversation(
        &self,
        conversation_id: &ConversationId,
        order: SortOrder,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Remove a message, returning the deleted record.
    fn delete(
        &self,
        id: &MessageId,
    ) -> impl std::future::Future<Output = Result<Message, RepositoryError>> + Send;

    /// Number of messages physically attached to a conversation.
    fn count_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
