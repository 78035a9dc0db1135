//! GeminiProvider -- concrete [`LlmProvider`] implementation for Google Gemini.
//!
//! Sends requests to `{base_url}/models/{model}:generateContent` and maps
//! HTTP status, prompt feedback, and finish reasons onto [`LlmError`].
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use parley_core::llm::provider::LlmProvider;
use parley_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, MessageRole, StopReason, Usage,
};

use super::types::{
    GeminiContent, GeminiErrorEnvelope, GeminiPart, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig,
};

/// Finish reasons Gemini uses when output was withheld by a content filter.
const BLOCKING_FINISH_REASONS: &[&str] = &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII", "RECITATION"];

/// Google Gemini LLM provider.
///
/// Without an API key every call fails with `AuthenticationFailed` without
/// touching the network.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
}

impl GeminiProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";

    /// Create a new Gemini provider.
    ///
    /// * `api_key` - Gemini API key, if configured
    /// * `timeout` - HTTP client timeout for a single request
    pub fn new(api_key: Option<SecretString>, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    /// Convert a generic [`CompletionRequest`] into Gemini's request body.
    fn to_gemini_request(request: &CompletionRequest) -> GenerateContentRequest {
        let contents = request
            .messages
            .iter()
            .map(|m| GeminiContent {
                role: Some(
                    match m.role {
                        MessageRole::User => "user",
                        MessageRole::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: Some(m.content.clone()),
                }],
            })
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction: request.system.as_ref().map(|s| GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: Some(s.clone()),
                }],
            }),
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        }
    }

    fn error_for_status(status: reqwest::StatusCode, retry_after: Option<u64>, body: &str) -> LlmError {
        let message = serde_json::from_str::<GeminiErrorEnvelope>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());

        match status.as_u16() {
            401 | 403 => LlmError::AuthenticationFailed,
            429 => LlmError::RateLimited {
                retry_after_ms: retry_after.map(|secs| secs.saturating_mul(1000)),
            },
            400 => LlmError::InvalidRequest(message),
            _ => LlmError::Provider {
                message: format!("HTTP {status}: {message}"),
            },
        }
    }

    fn into_completion(
        response: GenerateContentResponse,
        model: &str,
    ) -> Result<CompletionResponse, LlmError> {
        if let Some(reason) = response.prompt_feedback.as_ref().and_then(|f| f.block_reason.clone()) {
            return Err(LlmError::ContentBlocked { reason });
        }

        let candidate = response.candidates.first().ok_or_else(|| LlmError::Provider {
            message: "response contained no candidates".to_string(),
        })?;
        let content = candidate.text();

        let stop_reason = match candidate.finish_reason.as_deref() {
            None | Some("STOP") => StopReason::EndTurn,
            Some("MAX_TOKENS") => StopReason::MaxTokens,
            Some(r) if BLOCKING_FINISH_REASONS.contains(&r) => StopReason::Safety,
            Some(other) => StopReason::Other(other.to_string()),
        };
        if stop_reason == StopReason::Safety && content.trim().is_empty() {
            return Err(LlmError::ContentBlocked {
                reason: candidate.finish_reason.clone().unwrap_or_default(),
            });
        }

        let usage = response.usage_metadata.map(|u| Usage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(CompletionResponse {
            content,
            model: response.model_version.unwrap_or_else(|| model.to_string()),
            stop_reason,
            usage,
        })
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let api_key = self.api_key.as_ref().ok_or(LlmError::AuthenticationFailed)?;
        let body = Self::to_gemini_request(request);

        let response = self
            .client
            .post(self.url(&request.model))
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let error_body = response.text().await.unwrap_or_default();
            return Err(Self::error_for_status(status, retry_after, &error_body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        Self::into_completion(parsed, &request.model)
    }
}
