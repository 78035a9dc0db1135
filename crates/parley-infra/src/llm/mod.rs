//! LLM provider implementations.
//!
//! Contains the concrete [`LlmProvider`](parley_core::llm::provider::LlmProvider)
//! for Google Gemini and a factory that builds it from [`AiConfig`].

pub mod gemini;

use std::time::Duration;

use secrecy::SecretString;

use parley_core::llm::box_provider::BoxLlmProvider;
use parley_types::config::AiConfig;
use parley_types::llm::LlmError;

use self::gemini::GeminiProvider;

/// HTTP-level timeout; the gateway's own deadline is normally shorter.
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Create a [`BoxLlmProvider`] from the AI section of the configuration.
pub fn create_provider(config: &AiConfig) -> Result<BoxLlmProvider, LlmError> {
    let api_key = config
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .map(|k| SecretString::from(k.to_string()));
    if api_key.is_none() {
        tracing::warn!("No AI API key configured; every completion will fail");
    }

    let provider = GeminiProvider::new(api_key, HTTP_TIMEOUT)?.with_base_url(config.base_url.clone());
    Ok(BoxLlmProvider::new(provider))
}
