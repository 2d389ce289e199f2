//! Keyword rules used when no completion provider answer is usable

use super::{Confidence, Intent, IntentKind};
use crate::language::LanguageLabel;

/// Ordered rules; the first rule with a matching keyword wins
const RULES: &[(IntentKind, &[&str])] = &[
    (IntentKind::Greeting, &["hello", "hi", "assalam", "namaste"]),
    (IntentKind::Order, &["order", "kar", "chahiye", "want"]),
    (IntentKind::Menu, &["menu", "kya hai", "what"]),
];

/// Classify `text` with first-match-wins substring rules
///
/// Matched rules yield `medium` confidence, the catch-all yields `other`
/// with `low` confidence. Entities are always empty.
#[must_use]
pub fn fallback_intent_analysis(text: &str, detected_language: LanguageLabel) -> Intent {
    let lowered = text.to_lowercase();

    let matched = RULES.iter().find_map(|(kind, keywords)| {
        keywords
            .iter()
            .any(|keyword| lowered.contains(keyword))
            .then_some(*kind)
    });

    match matched {
        Some(kind) => Intent::bare(kind, Confidence::Medium, detected_language),
        None => Intent::bare(IntentKind::Other, Confidence::Low, detected_language),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(text: &str) -> IntentKind {
        fallback_intent_analysis(text, LanguageLabel::English).intent
    }

    #[test]
    fn test_greeting_precedes_order() {
        let intent = fallback_intent_analysis("hi there, I want to order", LanguageLabel::English);
        assert_eq!(intent.intent, IntentKind::Greeting);
        assert_eq!(intent.confidence, Confidence::Medium);
    }

    #[test]
    fn test_order_keywords() {
        assert_eq!(kind("do biryani order karna"), IntentKind::Order);
        assert_eq!(kind("I want food"), IntentKind::Order);
        assert_eq!(kind("ORDER two burgers"), IntentKind::Order);
    }

    #[test]
    fn test_menu_keywords() {
        assert_eq!(kind("aaj ka menu"), IntentKind::Menu);
        assert_eq!(kind("specials kya hai"), IntentKind::Menu);
    }

    #[test]
    fn test_substring_rules_are_naive() {
        // "chahiye" contains "hi"
        assert_eq!(kind("mujhe biryani chahiye"), IntentKind::Greeting);
    }

    #[test]
    fn test_catch_all_is_low_confidence() {
        let intent = fallback_intent_analysis("zzz", LanguageLabel::Urdu);
        assert_eq!(intent.intent, IntentKind::Other);
        assert_eq!(intent.confidence, Confidence::Low);
        assert_eq!(intent.detected_language, LanguageLabel::Urdu);
        assert!(intent.entities.is_empty());
    }

    #[test]
    fn test_detected_language_is_carried_through() {
        let intent = fallback_intent_analysis("hello", LanguageLabel::Urdu);
        assert_eq!(intent.detected_language, LanguageLabel::Urdu);
    }
}
