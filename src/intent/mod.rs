//! Intent model and extraction
//!
//! An [`Intent`] is built once per utterance, either from a completion
//! provider's JSON answer or from the local keyword fallback, and is never
//! mutated afterwards.

mod extractor;
mod fallback;
mod parse;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::language::LanguageLabel;

pub use extractor::{IntentExtractor, build_prompt};
pub use fallback::fallback_intent_analysis;
pub use parse::{clean_completion, parse_intent};

/// What the user is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Order,
    Question,
    Greeting,
    Menu,
    Complaint,
    SearchRestaurant,
    CheckStatus,
    Other,
}

impl IntentKind {
    /// Every intent, in declaration order
    pub const ALL: [Self; 8] = [
        Self::Order,
        Self::Question,
        Self::Greeting,
        Self::Menu,
        Self::Complaint,
        Self::SearchRestaurant,
        Self::CheckStatus,
        Self::Other,
    ];

    /// Wire name of the intent
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Question => "question",
            Self::Greeting => "greeting",
            Self::Menu => "menu",
            Self::Complaint => "complaint",
            Self::SearchRestaurant => "search_restaurant",
            Self::CheckStatus => "check_status",
            Self::Other => "other",
        }
    }

    /// Parse a wire name
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative confidence attached to an intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Wire name of the confidence level
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Parse a wire name
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// Slots filled alongside the intent
///
/// `food_items` and `quantities` are independent lists. Their lengths may
/// differ and index `i` of one does not necessarily describe index `i` of
/// the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entities {
    pub restaurant: Option<String>,
    #[serde(deserialize_with = "string_list")]
    pub food_items: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub quantities: Vec<String>,
    pub special_instructions: Option<String>,
}

impl Entities {
    /// Whether no slot was filled
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.restaurant.is_none()
            && self.food_items.is_empty()
            && self.quantities.is_empty()
            && self.special_instructions.is_none()
    }
}

/// Classified user request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub intent: IntentKind,
    pub entities: Entities,
    pub confidence: Confidence,
    pub detected_language: LanguageLabel,
}

impl Intent {
    /// Intent with no entities
    #[must_use]
    pub fn bare(intent: IntentKind, confidence: Confidence, detected_language: LanguageLabel) -> Self {
        Self {
            intent,
            entities: Entities::default(),
            confidence,
            detected_language,
        }
    }
}

/// Accept `null`, strings and numbers in list slots; models often emit `[2, "1 large"]`
fn string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| match value {
            serde_json::Value::String(s) => {
                let s = s.trim().to_string();
                (!s.is_empty()).then_some(s)
            }
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect())
}
