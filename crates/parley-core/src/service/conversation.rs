//! Conversation management service.
//!
//! Soft-deleted conversations are invisible to reads (`get`, `soft_delete`
//! answer NotFound) and reject edits with `ConversationInactive`. Ownership is
//! checked before activity, so another user's conversation always answers
//! Forbidden regardless of its state.

use parley_types::conversation::{Conversation, validate_title};
use parley_types::error::{ChatError, RepositoryError, Resource};
use parley_types::id::{ConversationId, UserId};
use tracing::info;

use crate::auth::guard::authorize;
use crate::repository::conversation::ConversationRepository;

pub struct ConversationService<C: ConversationRepository> {
    repo: C,
}

impl<C: ConversationRepository> ConversationService<C> {
    pub fn new(repo: C) -> Self {
        Self { repo }
    }

    /// Access the conversation repository.
    pub fn repo(&self) -> &C {
        &self.repo
    }

    /// Start an empty conversation owned by `caller`.
    pub async fn create(
        &self,
        caller: &UserId,
        title: Option<&str>,
    ) -> Result<Conversation, ChatError> {
        let title = title.map(validate_title).transpose()?;
        let conversation = self.repo.create(&Conversation::new(*caller, title)).await?;
        info!(conversation_id = %conversation.id, user_id = %caller, "Conversation created");
        Ok(conversation)
    }

    /// The caller's active conversations, most recently updated first.
    pub async fn list(&self, caller: &UserId) -> Result<Vec<Conversation>, ChatError> {
        Ok(self.repo.list_active_for_owner(caller).await?)
    }

    pub async fn get(
        &self,
        caller: &UserId,
        id: &ConversationId,
    ) -> Result<Conversation, ChatError> {
        let conversation = self.load_owned(caller, id).await?;
        if !conversation.is_active {
            return Err(ChatError::NotFound(Resource::Conversation));
        }
        Ok(conversation)
    }

    pub async fn rename(
        &self,
        caller: &UserId,
        id: &ConversationId,
        title: &str,
    ) -> Result<Conversation, ChatError> {
        let conversation = self.load_owned(caller, id).await?;
        if !conversation.is_active {
            return Err(ChatError::ConversationInactive);
        }
        let title = validate_title(title)?;
        let renamed = self.repo.rename(id, &title).await?;
        info!(conversation_id = %id, "Conversation renamed");
        Ok(renamed)
    }

    /// Mark the conversation inactive. Messages are kept.
    pub async fn soft_delete(&self, caller: &UserId, id: &ConversationId) -> Result<(), ChatError> {
        let conversation = self.load_owned(caller, id).await?;
        if !conversation.is_active {
            return Err(ChatError::NotFound(Resource::Conversation));
        }
        self.repo.soft_delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => ChatError::NotFound(Resource::Conversation),
            other => other.into(),
        })?;
        info!(conversation_id = %id, "Conversation soft-deleted");
        Ok(())
    }

    async fn load_owned(
        &self,
        caller: &UserId,
        id: &ConversationId,
    ) -> Result<Conversation, ChatError> {
        let conversation = self
            .repo
            .get(id)
            .await?
            .ok_or(ChatError::NotFound(Resource::Conversation))?;
        authorize(caller, Some(&conversation.owner_id), Resource::Conversation)?;
        Ok(conversation)
    }
}
