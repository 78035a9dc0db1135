//! Message listing and deletion.
//!
//! Messages are created only by the turn orchestrator. Deletion is the only
//! other path that touches `message_count`.

use parley_types::error::{ChatError, RepositoryError, Resource};
use parley_types::id::{ConversationId, MessageId, UserId};
use parley_types::message::Message;
use tracing::info;

use crate::auth::guard::authorize;
use crate::repository::SortOrder;
use crate::repository::conversation::ConversationRepository;
use crate::repository::message::MessageRepository;

pub struct MessageService<C: ConversationRepository, M: MessageRepository> {
    conversations: C,
    messages: M,
}

impl<C: ConversationRepository, M: MessageRepository> MessageService<C, M> {
    pub fn new(conversations: C, messages: M) -> Self {
        Self {
            conversations,
            messages,
        }
    }

    /// Access the message repository.
    pub fn messages(&self) -> &M {
        &self.messages
    }

    /// Oldest-first page of a conversation's messages.
    pub async fn list(
        &self,
        caller: &UserId,
        conversation_id: &ConversationId,
        limit: u32,
    ) -> Result<Vec<Message>, ChatError> {
        let conversation = self
            .conversations
            .get(conversation_id)
            .await?
            .ok_or(ChatError::NotFound(Resource::Conversation))?;
        authorize(caller, Some(&conversation.owner_id), Resource::Conversation)?;
        if !conversation.is_active {
            return Err(ChatError::NotFound(Resource::Conversation));
        }

        Ok(self
            .messages
            .list_by_conversation(conversation_id, SortOrder::Asc, limit)
            .await?)
    }

    /// Delete one message and decrement its conversation's count (floored at 0).
    ///
    /// Returns the deleted record.
    pub async fn delete(&self, caller: &UserId, id: &MessageId) -> Result<Message, ChatError> {
        let message = self
            .messages
            .get(id)
            .await?
            .ok_or(ChatError::NotFound(Resource::Message))?;
        let conversation = self.conversations.get(&message.conversation_id).await?;
        authorize(
            caller,
            conversation.as_ref().map(|c| &c.owner_id),
            Resource::Message,
        )?;
        if conversation.is_some_and(|c| !c.is_active) {
            return Err(ChatError::ConversationInactive);
        }

        let deleted = self.messages.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => ChatError::NotFound(Resource::Message),
            other => other.into(),
        })?;
        let conversation = self
            .conversations
            .adjust_message_count(&deleted.conversation_id, -1)
            .await?;

        info!(
            message_id = %id,
            conversation_id = %conversation.id,
            message_count = conversation.message_count,
            "Message deleted"
        );
        Ok(deleted)
    }
}
