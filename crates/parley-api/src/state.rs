//! Application state wiring all services together.
//!
//! Services are generic over repository/hasher/token traits; AppState pins
//! them to the concrete infra implementations.

use std::sync::Arc;

use anyhow::Context;

use parley_core::chat::gateway::{CompletionGateway, GatewayOptions};
use parley_core::chat::orchestrator::TurnOrchestrator;
use parley_core::llm::box_provider::BoxLlmProvider;
use parley_core::service::conversation::ConversationService;
use parley_core::service::message::MessageService;
use parley_core::service::user::UserService;
use parley_infra::auth::jwt::JwtTokenService;
use parley_infra::crypto::password::Argon2PasswordHasher;
use parley_infra::llm::create_provider;
use parley_infra::sqlite::conversation::SqliteConversationRepository;
use parley_infra::sqlite::message::SqliteMessageRepository;
use parley_infra::sqlite::pool::DatabasePool;
use parley_infra::sqlite::user::SqliteUserRepository;
use parley_types::config::{AppConfig, ChatConfig};

pub type ConcreteConversationService = ConversationService<SqliteConversationRepository>;

pub type ConcreteMessageService =
    MessageService<SqliteConversationRepository, SqliteMessageRepository>;

pub type ConcreteTurnOrchestrator =
    TurnOrchestrator<SqliteConversationRepository, SqliteMessageRepository>;

pub type ConcreteUserService =
    UserService<SqliteUserRepository, Argon2PasswordHasher, JwtTokenService>;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub conversations: Arc<ConcreteConversationService>,
    pub messages: Arc<ConcreteMessageService>,
    pub turns: Arc<ConcreteTurnOrchestrator>,
    pub users: Arc<ConcreteUserService>,
    pub chat: ChatConfig,
}

impl AppState {
    /// Connect to the database, build the AI provider and wire services.
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let jwt_secret = config
            .auth
            .jwt_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .context("auth.jwt_secret is not set (use parley.toml or PARLEY_JWT_SECRET)")?;

        let db_pool = DatabasePool::connect(&config.database)
            .await
            .context("failed to open database")?;

        let provider = create_provider(&config.ai).context("failed to build AI provider")?;

        Ok(Self::from_parts(db_pool, provider, config, jwt_secret))
    }

    /// Wire services over an open pool and an already-built provider.
    pub fn from_parts(
        db_pool: DatabasePool,
        provider: BoxLlmProvider,
        config: &AppConfig,
        jwt_secret: &str,
    ) -> Self {
        let gateway = CompletionGateway::new(provider, GatewayOptions::from(&config.ai));

        let turns = TurnOrchestrator::new(
            SqliteConversationRepository::new(db_pool.clone()),
            SqliteMessageRepository::new(db_pool.clone()),
            gateway,
        )
        .with_history_window(config.chat.history_window);

        let messages = MessageService::new(
            SqliteConversationRepository::new(db_pool.clone()),
            SqliteMessageRepository::new(db_pool.clone()),
        );

        let users = UserService::new(
            SqliteUserRepository::new(db_pool.clone()),
            Argon2PasswordHasher::new(),
            JwtTokenService::new(jwt_secret, config.auth.token_ttl_hours),
        );

        let conversations = ConversationService::new(SqliteConversationRepository::new(db_pool));

        Self {
            conversations: Arc::new(conversations),
            messages: Arc::new(messages),
            turns: Arc::new(turns),
            users: Arc::new(users),
            chat: config.chat.clone(),
        }
    }
}
