//! ConversationRepository trait definition.

use parley_types::conversation::Conversation;
use parley_types::error::RepositoryError;
use parley_types::id::{ConversationId, UserId};

/// Repository trait for conversation persistence.
///
/// Implementations live in parley-infra (e.g., `SqliteConversationRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
///
/// Operations that mutate a conversation other than `soft_delete` fail with
/// `RepositoryError::Inactive` when the row has been soft-deleted, and with
/// `RepositoryError::NotFound` when it does not exist. Each successful mutation
/// advances `updated_at`.
pub trait ConversationRepository: Send + Sync {
    /// Insert a new conversation.
    fn create(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Fetch a conversation by id, active or not.
    fn get(
        &self,
        id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// Active conversations of one owner, most recently updated first.
    fn list_active_for_owner(
        &self,
        owner_id: &UserId,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    /// Replace the title of an active conversation.
    fn rename(
        &self,
        id: &ConversationId,
        title: &str,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Mark a conversation inactive. Never removes the row.
    fn soft_delete(
        &self,
        id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Atomically add `delta` (possibly negative) to `message_count`, clamped at zero.
    ///
    /// This is the only way the counter changes. It applies to inactive
    /// conversations too: callers adjust after their message write has
    /// committed, and the count must follow the stored rows.
    fn adjust_message_count(
        &self,
        id: &ConversationId,
        delta: i64,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Set the title only if the conversation holds exactly its first exchange
    /// (`message_count == 2`) and still carries the default title.
    ///
    /// Returns whether the title was changed.
    fn set_title_if_first_turn(
        &self,
        id: &ConversationId,
        title: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
