//! Cleaning and parsing of completion output

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::{Confidence, Entities, Intent, IntentKind};
use crate::language::LanguageLabel;
use crate::{Error, Result};

/// Markdown code fence around the whole answer, with optional language tag
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)\s*```$").expect("valid regex")
});

/// Greedy span from the first `{` to the last `}`
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

/// Intent object as a model writes it
///
/// Any `detected_language` the model reports is ignored; the local detector decides.
#[derive(Deserialize)]
struct CompletionIntent {
    intent: IntentKind,
    #[serde(default)]
    entities: Option<Entities>,
    confidence: Confidence,
}

/// Strip code fences and surrounding prose from a completion
#[must_use]
pub fn clean_completion(raw: &str) -> &str {
    let trimmed = raw.trim();

    let unfenced = CODE_FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str().trim());

    JSON_OBJECT
        .find(unfenced)
        .map_or(unfenced, |m| m.as_str())
}

/// Parse a raw completion into an [`Intent`]
///
/// The returned intent always carries `detected_language`, whatever the
/// model claimed.
///
/// # Errors
///
/// Returns [`Error::MalformedCompletionOutput`] if the cleaned text is not
/// an intent object with a known intent and confidence.
pub fn parse_intent(raw: &str, detected_language: LanguageLabel) -> Result<Intent> {
    let cleaned = clean_completion(raw);
    if cleaned.is_empty() {
        return Err(Error::MalformedCompletionOutput("empty completion".to_string()));
    }

    let parsed: CompletionIntent = serde_json::from_str(cleaned)
        .map_err(|e| Error::MalformedCompletionOutput(e.to_string()))?;

    Ok(Intent {
        intent: parsed.intent,
        entities: parsed.entities.unwrap_or_default(),
        confidence: parsed.confidence,
        detected_language,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER_JSON: &str = r#"{"intent":"order","entities":{"restaurant":"Savour Foods","food_items":["pulao"],"quantities":["2"],"special_instructions":null},"confidence":"high","detected_language":"english"}"#;

    #[test]
    fn test_clean_plain_json() {
        assert_eq!(clean_completion(ORDER_JSON), ORDER_JSON);
    }

    #[test]
    fn test_clean_json_fence() {
        let raw = format!("```json\n{ORDER_JSON}\n```");
        assert_eq!(clean_completion(&raw), ORDER_JSON);
    }

    #[test]
    fn test_clean_bare_fence() {
        let raw = format!("  ```\n{ORDER_JSON}\n```  ");
        assert_eq!(clean_completion(&raw), ORDER_JSON);
    }

    #[test]
    fn test_clean_prose_wrapped() {
        let raw = format!("Sure! Here is the analysis:\n{ORDER_JSON}\nLet me know if you need more.");
        assert_eq!(clean_completion(&raw), ORDER_JSON);
    }

    #[test]
    fn test_clean_without_object_returns_text() {
        assert_eq!(clean_completion("  I cannot help with that. "), "I cannot help with that.");
    }

    #[test]
    fn test_parse_overrides_model_language() {
        let intent = parse_intent(ORDER_JSON, LanguageLabel::Urdu).unwrap();
        assert_eq!(intent.intent, IntentKind::Order);
        assert_eq!(intent.confidence, Confidence::High);
        assert_eq!(intent.detected_language, LanguageLabel::Urdu);
        assert_eq!(intent.entities.restaurant.as_deref(), Some("Savour Foods"));
        assert_eq!(intent.entities.food_items, vec!["pulao"]);
    }

    #[test]
    fn test_parse_missing_entities() {
        let intent =
            parse_intent(r#"{"intent":"greeting","confidence":"medium"}"#, LanguageLabel::English)
                .unwrap();
        assert_eq!(intent.intent, IntentKind::Greeting);
        assert!(intent.entities.is_empty());
    }

    #[test]
    fn test_parse_unknown_intent_is_malformed() {
        let err = parse_intent(r#"{"intent":"dance","confidence":"high"}"#, LanguageLabel::English)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedCompletionOutput(_)));
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        for raw in ["", "not json at all", "{broken", "```json\n```", "[1, 2, 3]"] {
            let err = parse_intent(raw, LanguageLabel::English).unwrap_err();
            assert!(matches!(err, Error::MalformedCompletionOutput(_)), "input: {raw:?}");
        }
    }
}
