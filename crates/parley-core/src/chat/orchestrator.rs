//! Turn orchestration: one user message in, one persisted exchange out.
//!
//! A turn walks these stages in order:
//!
//! `Authorizing -> PersistingUserTurn -> BuildingHistory -> AwaitingCompletion
//!  -> PersistingAiTurn -> UpdatingAggregates -> GeneratingTitle -> Done`
//!
//! Any stage may fail. What was written before the failure stays written: in
//! particular a model failure leaves the user message stored, creates no reply,
//! and leaves `message_count` untouched. The caller receives
//! `ChatError::TurnFailed` carrying the stored user message.
//!
//! Submission is not idempotent; re-sending the same content creates a new pair.

use std::fmt;

use parley_types::conversation::{ConversationSummary, truncate_chars};
use parley_types::error::{AiError, ChatError, Resource};
use parley_types::id::{ConversationId, UserId};
use parley_types::message::{MAX_CONTENT_CHARS, Message, MessageContent, MessageMetadata, Role};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::gateway::CompletionGateway;
use super::history::{self, DEFAULT_HISTORY_WINDOW};
use super::title::summarize_title;
use crate::auth::guard::authorize;
use crate::repository::conversation::ConversationRepository;
use crate::repository::message::MessageRepository;

/// Where a turn currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    Authorizing,
    PersistingUserTurn,
    BuildingHistory,
    AwaitingCompletion,
    PersistingAiTurn,
    UpdatingAggregates,
    GeneratingTitle,
    Done,
}

impl fmt::Display for TurnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnStage::Authorizing => "authorizing",
            TurnStage::PersistingUserTurn => "persisting_user_turn",
            TurnStage::BuildingHistory => "building_history",
            TurnStage::AwaitingCompletion => "awaiting_completion",
            TurnStage::PersistingAiTurn => "persisting_ai_turn",
            TurnStage::UpdatingAggregates => "updating_aggregates",
            TurnStage::GeneratingTitle => "generating_title",
            TurnStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of a completed turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub user_message: Message,
    pub ai_message: Message,
    pub conversation: ConversationSummary,
}

/// Sequences a single exchange between a user and the model.
///
/// Holds no conversation state between calls; every turn re-reads the store.
pub struct TurnOrchestrator<C: ConversationRepository, M: MessageRepository> {
    conversations: C,
    messages: M,
    gateway: CompletionGateway,
    history_window: u32,
}

impl<C: ConversationRepository, M: MessageRepository> TurnOrchestrator<C, M> {
    pub fn new(conversations: C, messages: M, gateway: CompletionGateway) -> Self {
        Self {
            conversations,
            messages,
            gateway,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    /// Override the number of prior messages sent as context.
    pub fn with_history_window(mut self, history_window: u32) -> Self {
        self.history_window = history_window;
        self
    }

    pub fn gateway(&self) -> &CompletionGateway {
        &self.gateway
    }

    /// Run one turn: store `content` as the caller's message, get the model's
    /// reply, store it, and refresh the conversation aggregates.
    pub async fn submit(
        &self,
        caller: &UserId,
        conversation_id: &ConversationId,
        content: &str,
    ) -> Result<TurnOutcome, ChatError> {
        let mut stage = TurnStage::Authorizing;
        match self.run(caller, conversation_id, content, &mut stage).await {
            Ok(outcome) => {
                info!(
                    conversation_id = %conversation_id,
                    message_count = outcome.conversation.message_count,
                    "Turn completed"
                );
                Ok(outcome)
            }
            Err(e) => {
                warn!(conversation_id = %conversation_id, stage = %stage, error = %e, "Turn failed");
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        caller: &UserId,
        conversation_id: &ConversationId,
        content: &str,
        stage: &mut TurnStage,
    ) -> Result<TurnOutcome, ChatError> {
        let conversation = self
            .conversations
            .get(conversation_id)
            .await?
            .ok_or(ChatError::NotFound(Resource::Conversation))?;
        authorize(caller, Some(&conversation.owner_id), Resource::Conversation)?;
        if !conversation.is_active {
            return Err(ChatError::ConversationInactive);
        }

        advance(stage, TurnStage::PersistingUserTurn, conversation_id);
        let content = MessageContent::parse(content)?;
        let user_message = self
            .messages
            .create(&Message::new(
                *conversation_id,
                Role::User,
                content,
                MessageMetadata::default(),
            ))
            .await?;

        advance(stage, TurnStage::BuildingHistory, conversation_id);
        let history = history::window(
            &self.messages,
            conversation_id,
            self.history_window,
            Some(&user_message.id),
        )
        .await?;

        advance(stage, TurnStage::AwaitingCompletion, conversation_id);
        let completion = match self.gateway.complete(&history, &user_message.content).await {
            Ok(completion) => completion,
            Err(source) => {
                return Err(ChatError::TurnFailed {
                    user_message: Box::new(user_message),
                    source,
                });
            }
        };

        advance(stage, TurnStage::PersistingAiTurn, conversation_id);
        let reply = match MessageContent::parse(truncate_chars(&completion.reply, MAX_CONTENT_CHARS)) {
            Ok(reply) => reply,
            Err(e) => {
                return Err(ChatError::TurnFailed {
                    user_message: Box::new(user_message),
                    source: AiError::Unavailable(e.to_string()),
                });
            }
        };
        let ai_message = self
            .messages
            .create(&Message::new(
                *conversation_id,
                Role::Ai,
                reply,
                MessageMetadata {
                    tokens_used: completion.tokens_used,
                    response_time: completion.response_time_ms,
                },
            ))
            .await?;

        advance(stage, TurnStage::UpdatingAggregates, conversation_id);
        let mut conversation = self
            .conversations
            .adjust_message_count(conversation_id, 2)
            .await?;

        if conversation.message_count == 2 && conversation.has_default_title() {
            advance(stage, TurnStage::GeneratingTitle, conversation_id);
            let title = summarize_title(&self.gateway, &user_message.content).await;
            // Both messages are already stored; a failed title write must not fail the turn.
            match self
                .conversations
                .set_title_if_first_turn(conversation_id, &title)
                .await
            {
                Ok(true) => conversation.title = title,
                Ok(false) => {}
                Err(e) => warn!(conversation_id = %conversation_id, error = %e, "Failed to store generated title"),
            }
        }

        advance(stage, TurnStage::Done, conversation_id);
        Ok(TurnOutcome {
            user_message,
            ai_message,
            conversation: conversation.summary(),
        })
    }
}

fn advance(stage: &mut TurnStage, next: TurnStage, conversation_id: &ConversationId) {
    debug!(conversation_id = %conversation_id, from = %stage, to = %next, "Turn stage");
    *stage = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::conversation::{Conversation, DEFAULT_TITLE};
    use parley_types::llm::LlmError;

    use crate::chat::gateway::GatewayOptions;
    use crate::llm::box_provider::BoxLlmProvider;
    use crate::repository::message::MessageRepository as _;
    use crate::testing::{InMemoryConversations, InMemoryMessages, ScriptedProvider};

    struct Harness {
        conversations: InMemoryConversations,
        messages: InMemoryMessages,
        provider: ScriptedProvider,
        orchestrator: TurnOrchestrator<InMemoryConversations, InMemoryMessages>,
        owner: UserId,
        conversation: ConversationId,
    }

    async fn harness() -> Harness {
        let conversations = InMemoryConversations::default();
        let messages = InMemoryMessages::default();
        let provider = ScriptedProvider::default();
        let owner = UserId::new();
        let conv = conversations
            .create(&Conversation::new(owner, None))
            .await
            .unwrap();
        let gateway = CompletionGateway::new(
            BoxLlmProvider::new(provider.clone()),
            GatewayOptions::default(),
        );
        Harness {
            orchestrator: TurnOrchestrator::new(conversations.clone(), messages.clone(), gateway),
            conversations,
            messages,
            provider,
            owner,
            conversation: conv.id,
        }
    }

    #[tokio::test]
    async fn test_first_turn_persists_pair_and_generates_title() {
        let h = harness().await;
        h.provider.push(ScriptedProvider::reply("Hello! How can I help?", 17));
        h.provider.push(ScriptedProvider::reply("\"Friendly Greeting\"", 3));

        let outcome = h.orchestrator.submit(&h.owner, &h.conversation, "Hi").await.unwrap();

        let stored = h.messages.all_for(&h.conversation);
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].role, Role::User);
        assert_eq!(stored[1].role, Role::Ai);
        assert_eq!(outcome.ai_message.content, "Hello! How can I help?");
        assert_eq!(outcome.ai_message.metadata.tokens_used, 17);
        assert_eq!(outcome.user_message.metadata.tokens_used, 0);

        assert_eq!(outcome.conversation.message_count, 2);
        assert_eq!(outcome.conversation.title, "Friendly Greeting");
        let conv = h.conversations.snapshot(&h.conversation);
        assert_eq!(conv.message_count, 2);
        assert_ne!(conv.title, DEFAULT_TITLE);
    }

    #[tokio::test]
    async fn test_quota_failure_keeps_user_turn_only() {
        let h = harness().await;
        h.provider.push(Err(LlmError::RateLimited { retry_after_ms: None }));

        let err = h
            .orchestrator
            .submit(&h.owner, &h.conversation, "Hi")
            .await
            .unwrap_err();

        match err {
            ChatError::TurnFailed { user_message, source } => {
                assert_eq!(source, AiError::QuotaExceeded);
                assert_eq!(user_message.content, "Hi");
            }
            other => panic!("expected TurnFailed, got {other:?}"),
        }
        let stored = h.messages.all_for(&h.conversation);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].role, Role::User);
        let conv = h.conversations.snapshot(&h.conversation);
        assert_eq!(conv.message_count, 0);
        assert_eq!(conv.title, DEFAULT_TITLE);
    }

    #[tokio::test]
    async fn test_title_fallback_when_summary_fails() {
        let h = harness().await;
        let first = "Please help me plan a two week trip across northern Italy";
        h.provider.push(ScriptedProvider::reply("Happy to help!", 9));
        h.provider.push(Err(LlmError::Transport("reset".into())));

        let outcome = h.orchestrator.submit(&h.owner, &h.conversation, first).await.unwrap();

        assert_eq!(
            outcome.conversation.title,
            format!("{}...", first.chars().take(40).collect::<String>())
        );
    }

    #[tokio::test]
    async fn test_second_turn_does_not_retitle() {
        let h = harness().await;
        h.provider.push(ScriptedProvider::reply("one", 1));
        h.provider.push(ScriptedProvider::reply("First Title", 1));
        h.orchestrator.submit(&h.owner, &h.conversation, "first").await.unwrap();

        h.provider.push(ScriptedProvider::reply("two", 1));
        let outcome = h.orchestrator.submit(&h.owner, &h.conversation, "second").await.unwrap();

        assert_eq!(outcome.conversation.message_count, 4);
        assert_eq!(outcome.conversation.title, "First Title");
        // Two chat calls plus one title call.
        assert_eq!(h.provider.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_renamed_conversation_keeps_its_title() {
        let h = harness().await;
        h.conversations.rename(&h.conversation, "My own title").await.unwrap();

        let outcome = h.orchestrator.submit(&h.owner, &h.conversation, "Hi").await.unwrap();

        assert_eq!(outcome.conversation.title, "My own title");
        assert_eq!(h.provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_history_excludes_current_prompt() {
        let h = harness().await;
        h.orchestrator.submit(&h.owner, &h.conversation, "first").await.unwrap();
        h.orchestrator.submit(&h.owner, &h.conversation, "second").await.unwrap();

        // requests: chat #1, title, chat #2
        let chat = &h.provider.requests()[2];
        let contents: Vec<&str> = chat.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "Scripted reply", "second"]);
    }

    #[tokio::test]
    async fn test_history_window_bounds_context() {
        let h = harness().await;
        let orchestrator = TurnOrchestrator::new(
            h.conversations.clone(),
            h.messages.clone(),
            CompletionGateway::new(
                BoxLlmProvider::new(h.provider.clone()),
                GatewayOptions::default(),
            ),
        )
        .with_history_window(2);

        for i in 0..3 {
            orchestrator
                .submit(&h.owner, &h.conversation, &format!("m{i}"))
                .await
                .unwrap();
        }

        let last = h.provider.requests().pop().unwrap();
        assert_eq!(last.messages.len(), 3);
        assert_eq!(last.messages[2].content, "m2");
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden_and_nothing_persisted() {
        let h = harness().await;

        let err = h
            .orchestrator
            .submit(&UserId::new(), &h.conversation, "Hi")
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Forbidden(Resource::Conversation)));
        assert!(h.messages.all_for(&h.conversation).is_empty());
        assert!(h.provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_inactive_conversation_rejects_messages() {
        let h = harness().await;
        h.conversations.soft_delete(&h.conversation).await.unwrap();

        let err = h
            .orchestrator
            .submit(&h.owner, &h.conversation, "Hi")
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::ConversationInactive));
        assert_eq!(h.messages.count_for_conversation(&h.conversation).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_soft_delete_mid_turn_still_reports_stored_pair() {
        let h = harness().await;
        let conversations = h.conversations.clone();
        let id = h.conversation;
        h.messages.after_write(move || conversations.deactivate(&id));

        let outcome = h.orchestrator.submit(&h.owner, &h.conversation, "Hi").await.unwrap();

        assert_eq!(h.messages.all_for(&h.conversation).len(), 2);
        assert_eq!(outcome.conversation.message_count, 2);
        let conv = h.conversations.snapshot(&h.conversation);
        assert!(!conv.is_active);
        assert_eq!(conv.message_count, 2);
        assert_eq!(conv.title, DEFAULT_TITLE);
    }

    #[tokio::test]
    async fn test_missing_conversation_is_not_found() {
        let h = harness().await;
        let err = h
            .orchestrator
            .submit(&h.owner, &ConversationId::new(), "Hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotFound(Resource::Conversation)));
    }

    #[tokio::test]
    async fn test_blank_content_is_rejected_before_persisting() {
        let h = harness().await;
        let err = h
            .orchestrator
            .submit(&h.owner, &h.conversation, "   ")
            .await
            .unwrap_err();

        match err {
            ChatError::Validation(v) => assert_eq!(v.field, "content"),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(h.messages.all_for(&h.conversation).is_empty());
    }

    #[tokio::test]
    async fn test_overlong_reply_is_truncated_to_content_bound() {
        let h = harness().await;
        h.provider.push(ScriptedProvider::reply(&"z".repeat(MAX_CONTENT_CHARS + 50), 1));

        let outcome = h.orchestrator.submit(&h.owner, &h.conversation, "Hi").await.unwrap();
        assert_eq!(outcome.ai_message.content.chars().count(), MAX_CONTENT_CHARS);
    }
}
