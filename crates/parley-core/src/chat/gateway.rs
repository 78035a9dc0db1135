//! Completion gateway: the single seam between conversations and the model.
//!
//! Wraps a provider, measures latency, normalizes usage, and folds every
//! provider failure into the four-kind [`AiError`] taxonomy. One attempt per
//! call; no retries.

use std::time::{Duration, Instant};

use parley_types::config::AiConfig;
use parley_types::error::AiError;
use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError, PromptMessage, StopReason};
use tracing::{debug, warn};

use super::history::HistoryEntry;
use crate::llm::box_provider::BoxLlmProvider;

/// Model settings fixed when the gateway is constructed.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub model: String,
    pub max_output_tokens: u32,
    pub temperature: f64,
    pub title_max_tokens: u32,
    pub title_temperature: f64,
    /// `None` leaves the call bounded only by the provider client.
    pub timeout: Option<Duration>,
}

impl From<&AiConfig> for GatewayOptions {
    fn from(config: &AiConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
            title_max_tokens: config.title_max_tokens,
            title_temperature: config.title_temperature,
            timeout: (config.request_timeout_secs > 0)
                .then(|| Duration::from_secs(config.request_timeout_secs)),
        }
    }
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self::from(&AiConfig::default())
    }
}

/// A successful model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub reply: String,
    /// Provider-reported total tokens, 0 when not reported.
    pub tokens_used: u32,
    pub response_time_ms: u64,
}

pub struct CompletionGateway {
    provider: BoxLlmProvider,
    options: GatewayOptions,
}

impl CompletionGateway {
    pub fn new(provider: BoxLlmProvider, options: GatewayOptions) -> Self {
        Self { provider, options }
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Ask the model to answer `prompt` given prior `history` (oldest first).
    #[tracing::instrument(
        name = "gateway.complete",
        skip_all,
        fields(provider = %self.provider.name(), model = %self.options.model, history_len = history.len())
    )]
    pub async fn complete(
        &self,
        history: &[HistoryEntry],
        prompt: &str,
    ) -> Result<Completion, AiError> {
        let mut messages: Vec<PromptMessage> = history
            .iter()
            .map(|entry| PromptMessage {
                role: entry.role.into(),
                content: entry.content.clone(),
            })
            .collect();
        messages.push(PromptMessage::user(prompt));

        let request = CompletionRequest {
            model: self.options.model.clone(),
            messages,
            system: None,
            max_tokens: self.options.max_output_tokens,
            temperature: Some(self.options.temperature),
        };

        let started = Instant::now();
        let result = self.send(&request).await;
        let response_time_ms = started.elapsed().as_millis() as u64;

        let response = result.map_err(|err| {
            let kind = classify(&err);
            warn!(error = %err, kind = ?kind, response_time_ms, "Completion failed");
            kind
        })?;

        if response.content.trim().is_empty() {
            if response.stop_reason == StopReason::Safety {
                return Err(AiError::ContentBlocked);
            }
            return Err(AiError::Unavailable("empty response from model".to_string()));
        }

        let tokens_used = response.usage.map(|u| u.total_tokens).unwrap_or(0);
        debug!(tokens_used, response_time_ms, "Completion received");

        Ok(Completion {
            reply: response.content,
            tokens_used,
            response_time_ms,
        })
    }

    /// Send a raw request through the provider under the configured timeout.
    pub async fn send(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, self.provider.complete(request))
                .await
                .map_err(|_| LlmError::Timeout(limit.as_secs()))?,
            None => self.provider.complete(request).await,
        }
    }
}

/// Map a provider error onto the gateway taxonomy.
///
/// Structured variants map directly; free-form provider messages are
/// inspected for the phrases providers use for the same conditions.
pub fn classify(err: &LlmError) -> AiError {
    match err {
        LlmError::AuthenticationFailed => AiError::InvalidCredential,
        LlmError::RateLimited { .. } => AiError::QuotaExceeded,
        LlmError::ContentBlocked { .. } => AiError::ContentBlocked,
        LlmError::Timeout(_) | LlmError::Transport(_) => AiError::Unavailable(err.to_string()),
        LlmError::Provider { message }
        | LlmError::InvalidRequest(message)
        | LlmError::Deserialization(message) => classify_text(message),
    }
}

fn classify_text(message: &str) -> AiError {
    let lower = message.to_lowercase();
    if lower.contains("api key") {
        AiError::InvalidCredential
    } else if lower.contains("quota") {
        AiError::QuotaExceeded
    } else if lower.contains("safety") {
        AiError::ContentBlocked
    } else {
        AiError::Unavailable(message.to_string())
    }
}
