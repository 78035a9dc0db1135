//! Runtime-selected provider handle.
//!
//! [`LlmProvider`] returns `impl Future`, so it has no vtable. The private
//! [`ErasedProvider`] trait boxes that future and is implemented for every
//! provider, which lets [`BoxLlmProvider`] store any backend behind one type.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use super::provider::LlmProvider;

type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;

trait ErasedProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    fn complete_erased<'a>(&'a self, request: &'a CompletionRequest) -> CompletionFuture<'a>;
}

impl<P: LlmProvider> ErasedProvider for P {
    fn provider_name(&self) -> &str {
        self.name()
    }

    fn complete_erased<'a>(&'a self, request: &'a CompletionRequest) -> CompletionFuture<'a> {
        Box::pin(self.complete(request))
    }
}

/// Owned, type-erased [`LlmProvider`].
pub struct BoxLlmProvider(Box<dyn ErasedProvider>);

impl BoxLlmProvider {
    pub fn new<P: LlmProvider + 'static>(provider: P) -> Self {
        Self(Box::new(provider))
    }

    pub fn name(&self) -> &str {
        self.0.provider_name()
    }

    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        self.0.complete_erased(request).await
    }
}

impl fmt::Debug for BoxLlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoxLlmProvider").field(&self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;
    use parley_types::llm::PromptMessage;

    #[tokio::test]
    async fn test_delegates_to_inner_provider() {
        let scripted = ScriptedProvider::default();
        scripted.push(ScriptedProvider::reply("boxed", 4));
        let boxed = BoxLlmProvider::new(scripted.clone());

        let request = CompletionRequest {
            model: "m".into(),
            messages: vec![PromptMessage::user("hello")],
            system: None,
            max_tokens: 16,
            temperature: None,
        };
        let response = boxed.complete(&request).await.unwrap();

        assert_eq!(response.content, "boxed");
        assert_eq!(boxed.name(), "scripted");
        assert_eq!(scripted.requests().len(), 1);
        assert_eq!(format!("{boxed:?}"), r#"BoxLlmProvider("scripted")"#);
    }
}
