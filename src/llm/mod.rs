//! Text completion providers
//!
//! Available providers:
//! - OpenAI-compatible chat completions (OpenAI, OpenRouter, local servers)
//! - Google Gemini `generateContent`

mod gemini;
mod openai;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{ApiKeys, LlmConfig, LlmProvider};
use crate::Result;

pub use gemini::GeminiCompletion;
pub use openai::OpenAiCompletion;

/// A service that turns a prompt into a text completion
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete `prompt` and return the raw model text
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::CompletionFailed`] if the provider cannot be
    /// reached or answers with an error
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Build the configured completion provider
///
/// Returns `None` when the provider's API key is missing; intent extraction
/// then runs on the keyword fallback alone.
#[must_use]
pub fn from_config(config: &LlmConfig, keys: &ApiKeys) -> Option<Arc<dyn CompletionProvider>> {
    match config.provider {
        LlmProvider::OpenAi => keys.openai.clone().map(|key| {
            Arc::new(OpenAiCompletion::new(
                key,
                config.model.clone(),
                config.base_url.clone(),
            )) as Arc<dyn CompletionProvider>
        }),
        LlmProvider::Gemini => keys.gemini.clone().map(|key| {
            Arc::new(GeminiCompletion::new(key, config.model.clone())) as Arc<dyn CompletionProvider>
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_means_no_provider() {
        let config = LlmConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-1.5-flash".to_string(),
            base_url: None,
        };
        let keys = ApiKeys {
            openai: Some("sk-test".to_string()),
            ..ApiKeys::default()
        };
        assert!(from_config(&config, &keys).is_none());
    }

    #[test]
    fn test_provider_selected_by_config() {
        let keys = ApiKeys {
            openai: Some("sk-test".to_string()),
            gemini: Some("g-test".to_string()),
            google_cloud: None,
        };
        let openai = LlmConfig {
            provider: LlmProvider::OpenAi,
            model: "gpt-4o-mini".to_string(),
            base_url: None,
        };
        let gemini = LlmConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-1.5-flash".to_string(),
            base_url: None,
        };
        assert_eq!(from_config(&openai, &keys).unwrap().name(), "openai");
        assert_eq!(from_config(&gemini, &keys).unwrap().name(), "gemini");
    }
}
