//! In-memory fakes shared by the unit tests of this crate.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use parley_types::conversation::{Conversation, DEFAULT_TITLE};
use parley_types::error::{AuthError, RepositoryError};
use parley_types::id::{ConversationId, MessageId, UserId};
use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};
use parley_types::message::Message;
use parley_types::user::User;

use crate::auth::token::TokenService;
use crate::llm::provider::LlmProvider;
use crate::repository::SortOrder;
use crate::repository::conversation::ConversationRepository;
use crate::repository::message::MessageRepository;
use crate::repository::user::UserRepository;
use crate::service::password::PasswordHasher;

#[derive(Clone, Default)]
pub struct InMemoryConversations {
    rows: Arc<Mutex<HashMap<ConversationId, Conversation>>>,
}

impl InMemoryConversations {
    pub fn snapshot(&self, id: &ConversationId) -> Conversation {
        self.rows.lock().unwrap()[id].clone()
    }

    pub fn force_count(&self, id: &ConversationId, count: u32) {
        self.rows.lock().unwrap().get_mut(id).unwrap().message_count = count;
    }

    /// Soft-delete without going through the repository trait.
    pub fn deactivate(&self, id: &ConversationId) {
        self.rows.lock().unwrap().get_mut(id).unwrap().is_active = false;
    }

    fn mutate_active<F>(&self, id: &ConversationId, f: F) -> Result<Conversation, RepositoryError>
    where
        F: FnOnce(&mut Conversation),
    {
        let mut rows = self.rows.lock().unwrap();
        let conv = rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if !conv.is_active {
            return Err(RepositoryError::Inactive);
        }
        f(conv);
        conv.updated_at = Utc::now();
        Ok(conv.clone())
    }
}

impl ConversationRepository for InMemoryConversations {
    async fn create(&self, conversation: &Conversation) -> Result<Conversation, RepositoryError> {
        self.rows
            .lock()
            .unwrap()
            .insert(conversation.id, conversation.clone());
        Ok(conversation.clone())
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn list_active_for_owner(
        &self,
        owner_id: &UserId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let mut list: Vec<Conversation> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.owner_id == *owner_id && c.is_active)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(list)
    }

    async fn rename(&self, id: &ConversationId, title: &str) -> Result<Conversation, RepositoryError> {
        self.mutate_active(id, |c| c.title = title.to_string())
    }

    async fn soft_delete(&self, id: &ConversationId) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let conv = rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        conv.is_active = false;
        conv.updated_at = Utc::now();
        Ok(())
    }

    async fn adjust_message_count(
        &self,
        id: &ConversationId,
        delta: i64,
    ) -> Result<Conversation, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let conv = rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        conv.message_count = (i64::from(conv.message_count) + delta).max(0) as u32;
        conv.updated_at = Utc::now();
        Ok(conv.clone())
    }

    async fn set_title_if_first_turn(
        &self,
        id: &ConversationId,
        title: &str,
    ) -> Result<bool, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(id) {
            Some(c) if c.is_active && c.message_count == 2 && c.title == DEFAULT_TITLE => {
                c.title = title.to_string();
                c.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

type WriteHook = Box<dyn Fn() + Send>;

#[derive(Clone, Default)]
pub struct InMemoryMessages {
    rows: Arc<Mutex<Vec<Message>>>,
    after_write: Arc<Mutex<Option<WriteHook>>>,
}

impl InMemoryMessages {
    /// Run `hook` after every committed create or delete.
    pub fn after_write(&self, hook: impl Fn() + Send + 'static) {
        *self.after_write.lock().unwrap() = Some(Box::new(hook));
    }

    fn wrote(&self) {
        if let Some(hook) = self.after_write.lock().unwrap().as_ref() {
            hook();
        }
    }

    pub fn all_for(&self, conversation_id: &ConversationId) -> Vec<Message> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.conversation_id == *conversation_id)
            .cloned()
            .collect()
    }
}

impl MessageRepository for InMemoryMessages {
    async fn create(&self, message: &Message) -> Result<Message, RepositoryError> {
        self.rows.lock().unwrap().push(message.clone());
        self.wrote();
        Ok(message.clone())
    }

    async fn get(&self, id: &MessageId) -> Result<Option<Message>, RepositoryError> {
        Ok(self.rows.lock().unwrap().iter().find(|m| m.id == *id).cloned())
    }

    async fn list_by_conversation(
        &self,
        conversation_id: &ConversationId,
        order: SortOrder,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        let mut list = self.all_for(conversation_id);
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if order == SortOrder::Desc {
            list.reverse();
        }
        list.truncate(limit as usize);
        Ok(list)
    }

    async fn delete(&self, id: &MessageId) -> Result<Message, RepositoryError> {
        let removed = {
            let mut rows = self.rows.lock().unwrap();
            let pos = rows
                .iter()
                .position(|m| m.id == *id)
                .ok_or(RepositoryError::NotFound)?;
            rows.remove(pos)
        };
        self.wrote();
        Ok(removed)
    }

    async fn count_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<u64, RepositoryError> {
        Ok(self.all_for(conversation_id).len() as u64)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryUsers {
    rows: Arc<Mutex<HashMap<UserId, User>>>,
}

impl InMemoryUsers {
    fn taken(rows: &HashMap<UserId, User>, user: &User) -> Option<RepositoryError> {
        rows.values()
            .filter(|u| u.id != user.id)
            .find_map(|u| {
                if u.email == user.email {
                    Some(RepositoryError::Conflict("email already registered".into()))
                } else if u.username == user.username {
                    Some(RepositoryError::Conflict("username already taken".into()))
                } else {
                    None
                }
            })
    }
}

impl UserRepository for InMemoryUsers {
    async fn create(&self, user: &User) -> Result<User, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(err) = Self::taken(&rows, user) {
            return Err(err);
        }
        rows.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn get(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update(&self, user: &User) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        if !rows.contains_key(&user.id) {
            return Err(RepositoryError::NotFound);
        }
        if let Some(err) = Self::taken(&rows, user) {
            return Err(err);
        }
        rows.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<(), RepositoryError> {
        self.rows
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

/// Provider that replays queued results, then answers with a fixed reply.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    queue: Arc<Mutex<VecDeque<Result<CompletionResponse, LlmError>>>>,
    seen: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedProvider {
    pub fn reply(text: &str, total_tokens: u32) -> Result<CompletionResponse, LlmError> {
        Ok(CompletionResponse {
            content: text.to_string(),
            model: "scripted".to_string(),
            stop_reason: StopReason::EndTurn,
            usage: Some(Usage {
                input_tokens: total_tokens / 2,
                output_tokens: total_tokens - total_tokens / 2,
                total_tokens,
            }),
        })
    }

    pub fn push(&self, result: Result<CompletionResponse, LlmError>) -> &Self {
        self.queue.lock().unwrap().push_back(result);
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.seen.lock().unwrap().push(request.clone());
        let next = self.queue.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Self::reply("Scripted reply", 8))
    }
}

/// Reversible "hash" so tests can reason about stored credentials.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, String> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        hash == format!("plain:{password}")
    }
}

/// Tokens are just `token:<user id>`.
pub struct PlainTokens;

impl TokenService for PlainTokens {
    fn issue(&self, user_id: &UserId) -> Result<String, AuthError> {
        Ok(format!("token:{user_id}"))
    }

    fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
        token
            .strip_prefix("token:")
            .and_then(|id| id.parse().ok())
            .ok_or(AuthError::InvalidToken)
    }
}
