//! Reply composition from intent, language and entities

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::intent::{Intent, IntentKind};
use crate::language::LanguageLabel;
use crate::{Error, Result};

/// Key used for the catch-all template in overrides
pub const DEFAULT_TEMPLATE_KEY: &str = "default";

static DEFAULT_COMPOSER: LazyLock<ResponseComposer> = LazyLock::new(ResponseComposer::default);

const ENGLISH_TEMPLATES: [(IntentKind, &str); 8] = [
    (
        IntentKind::Greeting,
        "Hello! Welcome to our food delivery service. How can I help you today?",
    ),
    (
        IntentKind::Order,
        "Sure, I can help you place an order. What would you like to have?",
    ),
    (
        IntentKind::Menu,
        "Here is what's on the menu today. Tell me what catches your eye.",
    ),
    (
        IntentKind::Question,
        "Good question! Let me find that information for you.",
    ),
    (
        IntentKind::Complaint,
        "I'm really sorry about that. Let me help you sort it out right away.",
    ),
    (
        IntentKind::SearchRestaurant,
        "Let me look up restaurants for you.",
    ),
    (
        IntentKind::CheckStatus,
        "Let me check the status of your order.",
    ),
    (
        IntentKind::Other,
        "I'm not sure I understood that. Could you please say it again?",
    ),
];

const ENGLISH_DEFAULT: &str = "How can I help you with your food order?";

const URDU_TEMPLATES: [(IntentKind, &str); 8] = [
    (
        IntentKind::Greeting,
        "Assalam-o-Alaikum! Hamari food delivery service mein khush aamdeed. Main aap ki kya madad kar sakta hoon?",
    ),
    (
        IntentKind::Order,
        "Ji zaroor, main aap ka order laga deta hoon. Aap kya khana pasand karenge?",
    ),
    (
        IntentKind::Menu,
        "Yeh raha aaj ka menu. Bataiye aap ko kya pasand aaya.",
    ),
    (
        IntentKind::Question,
        "Acha sawal hai! Main aap ke liye maloomat dhoondta hoon.",
    ),
    (
        IntentKind::Complaint,
        "Maazrat chahta hoon. Main abhi aap ka masla hal karne ki koshish karta hoon.",
    ),
    (
        IntentKind::SearchRestaurant,
        "Main aap ke liye restaurants talaash karta hoon.",
    ),
    (
        IntentKind::CheckStatus,
        "Main aap ke order ka status check karta hoon.",
    ),
    (
        IntentKind::Other,
        "Maaf kijiye, main samajh nahi saka. Kya aap dobara bata sakte hain?",
    ),
];

const URDU_DEFAULT: &str = "Main aap ke khane ke order mein kaise madad kar sakta hoon?";

/// Per-language reply templates keyed by intent, with a catch-all entry
#[derive(Debug, Clone)]
pub struct TemplateTable {
    entries: HashMap<IntentKind, String>,
    default: String,
}

impl TemplateTable {
    fn from_builtin(entries: &[(IntentKind, &str)], default: &str) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(kind, text)| (*kind, (*text).to_string()))
                .collect(),
            default: default.to_string(),
        }
    }

    /// Built-in English templates
    #[must_use]
    pub fn english() -> Self {
        Self::from_builtin(&ENGLISH_TEMPLATES, ENGLISH_DEFAULT)
    }

    /// Built-in Roman Urdu templates
    #[must_use]
    pub fn urdu() -> Self {
        Self::from_builtin(&URDU_TEMPLATES, URDU_DEFAULT)
    }

    /// Built-in templates for a language
    #[must_use]
    pub fn builtin(language: LanguageLabel) -> Self {
        match language {
            LanguageLabel::Urdu => Self::urdu(),
            LanguageLabel::English => Self::english(),
        }
    }

    /// Replace entries with overrides keyed by intent name or `default`
    ///
    /// # Errors
    ///
    /// Returns error if a key is neither an intent name nor `default`, or a
    /// template is blank
    pub fn with_overrides(mut self, overrides: &HashMap<String, String>) -> Result<Self> {
        for (key, text) in overrides {
            if text.trim().is_empty() {
                return Err(Error::Config(format!("response template '{key}' is empty")));
            }
            if key == DEFAULT_TEMPLATE_KEY {
                self.default.clone_from(text);
            } else if let Some(kind) = IntentKind::parse(key) {
                self.entries.insert(kind, text.clone());
            } else {
                return Err(Error::Config(format!(
                    "unknown response template key '{key}'"
                )));
            }
        }
        Ok(self)
    }

    /// Template for `intent`, or the catch-all if none is registered
    #[must_use]
    pub fn lookup(&self, intent: IntentKind) -> &str {
        self.entries.get(&intent).map_or(self.default.as_str(), String::as_str)
    }
}

/// Renders replies from [`Intent`]s
#[derive(Debug, Clone)]
pub struct ResponseComposer {
    english: TemplateTable,
    urdu: TemplateTable,
}

impl Default for ResponseComposer {
    fn default() -> Self {
        Self::new(TemplateTable::english(), TemplateTable::urdu())
    }
}

impl ResponseComposer {
    /// Create a composer from per-language tables
    #[must_use]
    pub const fn new(english: TemplateTable, urdu: TemplateTable) -> Self {
        Self { english, urdu }
    }

    /// Template table for a language
    #[must_use]
    pub const fn table(&self, language: LanguageLabel) -> &TemplateTable {
        match language {
            LanguageLabel::Urdu => &self.urdu,
            LanguageLabel::English => &self.english,
        }
    }

    /// Render the reply for `intent`
    ///
    /// The restaurant clause takes precedence over the food item clause;
    /// at most one clause is appended.
    #[must_use]
    pub fn compose(&self, intent: &Intent, original_text: &str) -> String {
        let language = intent.detected_language;
        let mut reply = self.table(language).lookup(intent.intent).to_string();

        if let Some(restaurant) = &intent.entities.restaurant {
            reply.push_str(&restaurant_clause(language, restaurant));
        } else if !intent.entities.food_items.is_empty() {
            reply.push_str(&food_items_clause(language, &intent.entities.food_items.join(", ")));
        }

        tracing::debug!(
            intent = %intent.intent,
            %language,
            input_chars = original_text.chars().count(),
            "composed reply"
        );

        reply
    }
}

fn restaurant_clause(language: LanguageLabel, restaurant: &str) -> String {
    match language {
        LanguageLabel::Urdu => format!(" Main {restaurant} ke baare mein dekhta hoon."),
        LanguageLabel::English => format!(" I'll check {restaurant} for you."),
    }
}

fn food_items_clause(language: LanguageLabel, items: &str) -> String {
    match language {
        LanguageLabel::Urdu => format!(" Aap ke items: {items}."),
        LanguageLabel::English => format!(" Items noted: {items}."),
    }
}

/// Render a reply with the built-in templates
#[must_use]
pub fn compose_response(intent: &Intent, original_text: &str) -> String {
    DEFAULT_COMPOSER.compose(intent, original_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{Confidence, Entities};

    fn intent(kind: IntentKind, language: LanguageLabel, entities: Entities) -> Intent {
        Intent {
            intent: kind,
            entities,
            confidence: Confidence::High,
            detected_language: language,
        }
    }

    #[test]
    fn test_every_intent_and_language_has_reply() {
        for language in [LanguageLabel::English, LanguageLabel::Urdu] {
            for kind in IntentKind::ALL {
                let reply = compose_response(&intent(kind, language, Entities::default()), "...");
                assert!(!reply.trim().is_empty(), "{kind} / {language}");
            }
        }
    }

    #[test]
    fn test_restaurant_clause() {
        let entities = Entities {
            restaurant: Some("Pizza Hut".to_string()),
            ..Entities::default()
        };
        let reply = compose_response(&intent(IntentKind::Order, LanguageLabel::English, entities), "...");
        assert!(reply.starts_with(ENGLISH_TEMPLATES[1].1));
        assert!(reply.ends_with("I'll check Pizza Hut for you."));
    }

    #[test]
    fn test_restaurant_wins_over_items() {
        let entities = Entities {
            restaurant: Some("Savour".to_string()),
            food_items: vec!["pulao".to_string()],
            ..Entities::default()
        };
        let reply = compose_response(&intent(IntentKind::Order, LanguageLabel::Urdu, entities), "...");
        assert!(reply.contains("Savour"));
        assert!(!reply.contains("pulao"));
    }

    #[test]
    fn test_food_items_joined() {
        let entities = Entities {
            food_items: vec!["biryani".to_string(), "raita".to_string()],
            ..Entities::default()
        };
        let reply = compose_response(&intent(IntentKind::Order, LanguageLabel::Urdu, entities), "...");
        assert!(reply.starts_with(URDU_TEMPLATES[1].1));
        assert!(reply.ends_with("Aap ke items: biryani, raita."));
    }

    #[test]
    fn test_overrides() {
        let overrides = HashMap::from([
            ("greeting".to_string(), "Hi from Bolo!".to_string()),
            ("default".to_string(), "Fallback".to_string()),
        ]);
        let table = TemplateTable::english().with_overrides(&overrides).unwrap();
        assert_eq!(table.lookup(IntentKind::Greeting), "Hi from Bolo!");
        assert_eq!(table.lookup(IntentKind::Menu), ENGLISH_TEMPLATES[2].1);
    }

    #[test]
    fn test_missing_entry_uses_default() {
        let table = TemplateTable {
            entries: HashMap::new(),
            default: "Fallback".to_string(),
        };
        assert_eq!(table.lookup(IntentKind::Complaint), "Fallback");
    }

    #[test]
    fn test_unknown_override_key_rejected() {
        let overrides = HashMap::from([("dance".to_string(), "x".to_string())]);
        assert!(matches!(
            TemplateTable::urdu().with_overrides(&overrides),
            Err(Error::Config(_))
        ));
    }
}
