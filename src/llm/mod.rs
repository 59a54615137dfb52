//! LLM: completion client for the consultation.
//!
//! DESIGN
//! ======
//! Configured from environment variables. `LlmClient` pins the model
//! identifier and forwards each conversation to the OpenAI-compatible
//! chat completions endpoint. Callers depend on the `LlmChat` trait so the
//! controller can be exercised without a network.

pub mod config;
pub mod openai;
pub mod types;

use config::LlmConfig;
pub use types::LlmChat;
use types::{ChatResponse, LlmError, Message};

// =============================================================================
// CLIENT
// =============================================================================

/// Concrete completion client bound to one model.
pub struct LlmClient {
    inner: openai::OpenAiClient,
    model: String,
}

impl LlmClient {
    /// Build an LLM client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let inner = openai::OpenAiClient::new(config.api_key, &config.base_url, config.timeouts)?;
        Ok(Self { inner, model: config.model })
    }

    /// Return the configured model name (e.g. `"gpt-4o-mini"`).
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl LlmChat for LlmClient {
    async fn chat(&self, messages: &[Message]) -> Result<ChatResponse, LlmError> {
        let response = self.inner.chat(&self.model, messages).await?;
        tracing::debug!(
            model = %response.model,
            finish_reason = %response.finish_reason,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "llm: completion received"
        );
        Ok(response)
    }
}
