//! Completion-backed intent extraction with a local fallback

use std::sync::Arc;

use super::{Intent, fallback_intent_analysis, parse_intent};
use crate::language::{LanguageDetector, LanguageLabel};
use crate::llm::CompletionProvider;
use crate::Result;

/// Build the instruction sent to the completion provider
#[must_use]
pub fn build_prompt(text: &str, detected_language: LanguageLabel) -> String {
    format!(
        r#"You are the order assistant of a food delivery service. Customers speak English, Urdu, or Roman Urdu, often mixed.

Analyze the customer message below and reply with ONLY a JSON object, no prose and no code fences:
{{
  "intent": "order" | "question" | "greeting" | "menu" | "complaint" | "search_restaurant" | "check_status" | "other",
  "entities": {{
    "restaurant": string or null,
    "food_items": [string],
    "quantities": [string],
    "special_instructions": string or null
  }},
  "confidence": "high" | "medium" | "low",
  "detected_language": "{detected_language}"
}}

Use exactly one of the listed intent values. Set "detected_language" to "{detected_language}".

Customer message: "{text}""#
    )
}

/// Turns utterances into [`Intent`]s
///
/// Completion failures and malformed answers are absorbed by the keyword
/// fallback, so extraction always yields an intent.
#[derive(Clone)]
pub struct IntentExtractor {
    completion: Option<Arc<dyn CompletionProvider>>,
    detector: Arc<LanguageDetector>,
}

impl IntentExtractor {
    /// Create an extractor backed by a completion provider
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionProvider>, detector: Arc<LanguageDetector>) -> Self {
        Self {
            completion: Some(completion),
            detector,
        }
    }

    /// Create an extractor that only uses the keyword fallback
    #[must_use]
    pub const fn offline(detector: Arc<LanguageDetector>) -> Self {
        Self {
            completion: None,
            detector,
        }
    }

    /// Create an extractor from an optional provider
    #[must_use]
    pub fn with_provider(
        completion: Option<Arc<dyn CompletionProvider>>,
        detector: Arc<LanguageDetector>,
    ) -> Self {
        Self {
            completion,
            detector,
        }
    }

    /// The detector used to tag utterances
    #[must_use]
    pub fn detector(&self) -> &LanguageDetector {
        &self.detector
    }

    /// Whether a completion provider is configured
    #[must_use]
    pub const fn has_completion(&self) -> bool {
        self.completion.is_some()
    }

    /// Extract the intent of `text`
    ///
    /// `language_hint` is only recorded for tracing; the language is always
    /// detected locally.
    pub async fn extract(&self, text: &str, language_hint: &str) -> Intent {
        let detected_language = self.detector.detect(text);
        tracing::trace!(%detected_language, language_hint, "extracting intent");
        self.extract_detected(text, detected_language).await
    }

    /// Extract the intent of `text` already labeled by [`Self::detector`]
    ///
    /// Callers that have detected the language themselves pass the label in
    /// to avoid a second detection pass.
    pub async fn extract_detected(&self, text: &str, detected_language: LanguageLabel) -> Intent {
        match self.try_completion(text, detected_language).await {
            Ok(intent) => {
                tracing::debug!(
                    intent = %intent.intent,
                    confidence = intent.confidence.as_str(),
                    %detected_language,
                    "intent extracted"
                );
                intent
            }
            Err(e) => {
                let intent = fallback_intent_analysis(text, detected_language);
                tracing::warn!(
                    error = %e,
                    intent = %intent.intent,
                    %detected_language,
                    "intent extraction fell back to keyword rules"
                );
                intent
            }
        }
    }

    async fn try_completion(&self, text: &str, detected_language: LanguageLabel) -> Result<Intent> {
        let Some(completion) = &self.completion else {
            return Err(crate::Error::CompletionFailed(
                "no completion provider configured".to_string(),
            ));
        };

        let prompt = build_prompt(text, detected_language);
        let raw = completion.complete(&prompt).await?;
        tracing::trace!(provider = completion.name(), raw = %raw, "completion received");

        parse_intent(&raw, detected_language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{Confidence, IntentKind};
    use crate::Error;
    use async_trait::async_trait;

    struct Canned(std::result::Result<&'static str, &'static str>);

    #[async_trait]
    impl CompletionProvider for Canned {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.0
                .map(ToString::to_string)
                .map_err(|e| Error::CompletionFailed(e.to_string()))
        }

        fn name(&self) -> &'static str {
            "canned"
        }
    }

    fn extractor(reply: std::result::Result<&'static str, &'static str>) -> IntentExtractor {
        IntentExtractor::new(Arc::new(Canned(reply)), Arc::new(LanguageDetector::default()))
    }

    #[test]
    fn test_prompt_lists_intents_and_language() {
        let prompt = build_prompt("mujhe pizza chahiye", LanguageLabel::Urdu);
        for kind in IntentKind::ALL {
            assert!(prompt.contains(kind.as_str()));
        }
        assert!(prompt.contains("\"detected_language\": \"urdu\""));
        assert!(prompt.contains("mujhe pizza chahiye"));
    }

    #[tokio::test]
    async fn test_completion_result_used() {
        let extractor = extractor(Ok(
            "```json\n{\"intent\":\"check_status\",\"confidence\":\"high\",\"detected_language\":\"urdu\"}\n```",
        ));
        let intent = extractor.extract("where is my order", "en-US").await;
        assert_eq!(intent.intent, IntentKind::CheckStatus);
        assert_eq!(intent.confidence, Confidence::High);
        assert_eq!(intent.detected_language, LanguageLabel::English);
    }

    #[tokio::test]
    async fn test_provider_error_falls_back() {
        let extractor = extractor(Err("quota exceeded"));
        let intent = extractor.extract("hello there", "auto").await;
        assert_eq!(intent.intent, IntentKind::Greeting);
        assert_eq!(intent.confidence, Confidence::Medium);
    }

    #[tokio::test]
    async fn test_garbage_falls_back() {
        let extractor = extractor(Ok("I'm sorry, I can't do that"));
        let intent = extractor.extract("qwerty", "auto").await;
        assert_eq!(intent.intent, IntentKind::Other);
        assert_eq!(intent.confidence, Confidence::Low);
    }

    #[tokio::test]
    async fn test_offline_uses_fallback() {
        let extractor = IntentExtractor::offline(Arc::new(LanguageDetector::default()));
        assert!(!extractor.has_completion());
        let intent = extractor.extract("aap ka menu kya hai", "ur-PK").await;
        assert_eq!(intent.intent, IntentKind::Menu);
        assert_eq!(intent.detected_language, LanguageLabel::Urdu);
    }

    #[tokio::test]
    async fn test_extract_detected_keeps_given_label() {
        let extractor = extractor(Ok(
            "{\"intent\":\"menu\",\"confidence\":\"high\",\"detected_language\":\"english\"}",
        ));
        let intent = extractor
            .extract_detected("aap ka menu kya hai", LanguageLabel::Urdu)
            .await;
        assert_eq!(intent.intent, IntentKind::Menu);
        assert_eq!(intent.detected_language, LanguageLabel::Urdu);
    }
}
