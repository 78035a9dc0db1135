//! Conversation title generation via LLM.
//!
//! `summarize_title` turns the first user message into a short title. It never
//! fails: any provider error or unusable reply falls back to a truncation of
//! the message itself.

use parley_types::conversation::{MAX_TITLE_CHARS, truncate_chars};
use parley_types::llm::{CompletionRequest, PromptMessage};
use tracing::warn;

use super::gateway::CompletionGateway;

/// Characters of the first message kept by the fallback title.
pub const FALLBACK_TITLE_CHARS: usize = 40;

/// Generate a title for a conversation from its first user message.
#[tracing::instrument(
    name = "summarize_title",
    skip(gateway, first_message),
    fields(model = %gateway.options().model)
)]
pub async fn summarize_title(gateway: &CompletionGateway, first_message: &str) -> String {
    let options = gateway.options();
    let request = CompletionRequest {
        model: options.model.clone(),
        messages: vec![PromptMessage::user(title_prompt(first_message))],
        system: None,
        max_tokens: options.title_max_tokens,
        temperature: Some(options.title_temperature),
    };

    match gateway.send(&request).await {
        Ok(response) => match clean_title(&response.content) {
            Some(title) => title,
            None => {
                warn!("Title generation returned an empty title, using fallback");
                fallback_title(first_message)
            }
        },
        Err(e) => {
            warn!(error = %e, "Title generation failed, using fallback");
            fallback_title(first_message)
        }
    }
}

fn title_prompt(first_message: &str) -> String {
    format!(
        "Generate a short, concise title (max 6 words) for a conversation that starts with: \
         \"{first_message}\". Only respond with the title, nothing else."
    )
}

/// First line of the reply, without surrounding quotes, capped to the title bound.
fn clean_title(raw: &str) -> Option<String> {
    let line = raw.trim().lines().next().unwrap_or_default();
    let title = line
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '\u{201c}' | '\u{201d}'))
        .trim();
    if title.is_empty() {
        return None;
    }
    Some(truncate_chars(title, MAX_TITLE_CHARS).trim_end().to_string())
}

/// Deterministic title: the first 40 characters, plus `...` when cut.
pub fn fallback_title(first_message: &str) -> String {
    if first_message.chars().count() > FALLBACK_TITLE_CHARS {
        format!("{}...", truncate_chars(first_message, FALLBACK_TITLE_CHARS))
    } else {
        first_message.to_string()
    }
}
