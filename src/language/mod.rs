//! Heuristic language detection for Roman Urdu, Urdu script and English
//!
//! Detection is lexicon and script based:
//! 1. Empty or whitespace-only text is English.
//! 2. Any Arabic-script character makes the text Urdu.
//! 3. Otherwise marker words from both lexicons are counted and the larger
//!    tally wins.
//! 4. Ties fall back to English.

mod lexicon;

use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

pub use lexicon::{Lexicon, is_arabic_script, is_latin_letter};

/// Share of Latin letters above which a tied utterance is treated as English
pub const LATIN_DOMINANCE_THRESHOLD: f64 = 0.8;

static DEFAULT_DETECTOR: LazyLock<LanguageDetector> = LazyLock::new(LanguageDetector::default);

/// Language assigned to an utterance
///
/// Every utterance gets exactly one label. `Urdu` covers the Urdu/Hindi
/// family in either script; `English` is the default whenever evidence is
/// missing or tied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageLabel {
    Urdu,
    #[default]
    English,
}

impl LanguageLabel {
    /// Map a BCP-47 language code onto its family
    ///
    /// `en-*` codes are English, every other code belongs to the Urdu/Hindi family.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        if code.trim().to_ascii_lowercase().starts_with("en") {
            Self::English
        } else {
            Self::Urdu
        }
    }

    /// Parse a user-facing label or language code
    ///
    /// Accepts `urdu`, `english`, `auto` (returns `None`) and BCP-47 codes.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => None,
            "urdu" | "ur" | "hindi" | "hi" => Some(Self::Urdu),
            "english" | "en" => Some(Self::English),
            code => Some(Self::from_code(code)),
        }
    }

    /// Locale used when speaking this language back to the user
    #[must_use]
    pub const fn default_locale(self) -> &'static str {
        match self {
            Self::Urdu => "ur-PK",
            Self::English => "en-US",
        }
    }

    /// Lowercase name, as serialized
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Urdu => "urdu",
            Self::English => "english",
        }
    }
}

impl fmt::Display for LanguageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule produced a detection result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionBasis {
    /// No non-whitespace input
    Empty,
    /// Arabic-script characters present
    Script,
    /// One lexicon outscored the other
    Lexicon,
    /// Lexicon tie resolved by Latin letter share
    LatinComposition,
    /// Lexicon tie with no dominant script
    Default,
}

/// Outcome of analyzing one utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Detection {
    #[serde(rename = "language")]
    pub label: LanguageLabel,
    pub basis: DetectionBasis,
    pub urdu_matches: usize,
    pub english_matches: usize,
}

impl Detection {
    const fn without_tally(label: LanguageLabel, basis: DetectionBasis) -> Self {
        Self {
            label,
            basis,
            urdu_matches: 0,
            english_matches: 0,
        }
    }
}

/// Lexicon-backed language detector
///
/// Holds no per-call state; share one instance freely.
#[derive(Debug, Clone, Default)]
pub struct LanguageDetector {
    lexicon: Lexicon,
}

impl LanguageDetector {
    /// Create a detector over the given lexicon
    #[must_use]
    pub const fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    /// The lexicon this detector scores against
    #[must_use]
    pub const fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Detect the language of `text`
    #[must_use]
    pub fn detect(&self, text: &str) -> LanguageLabel {
        self.analyze(text).label
    }

    /// Detect the language of `text` and report how the decision was made
    #[must_use]
    pub fn analyze(&self, text: &str) -> Detection {
        if text.trim().is_empty() {
            return Detection::without_tally(LanguageLabel::English, DetectionBasis::Empty);
        }

        if text.chars().any(is_arabic_script) {
            return Detection::without_tally(LanguageLabel::Urdu, DetectionBasis::Script);
        }

        let lowered = text.to_lowercase();
        let urdu_matches = self.lexicon.urdu_matches(&lowered);
        let english_matches = self.lexicon.english_matches(&lowered);

        let (label, basis) = if urdu_matches > english_matches && urdu_matches > 0 {
            (LanguageLabel::Urdu, DetectionBasis::Lexicon)
        } else if english_matches > urdu_matches && english_matches > 0 {
            (LanguageLabel::English, DetectionBasis::Lexicon)
        } else if latin_share(&lowered) > LATIN_DOMINANCE_THRESHOLD {
            (LanguageLabel::English, DetectionBasis::LatinComposition)
        } else {
            // Ties never resolve to Urdu without script evidence
            (LanguageLabel::English, DetectionBasis::Default)
        };

        tracing::trace!(
            %label,
            ?basis,
            urdu_matches,
            english_matches,
            "language detected"
        );

        Detection {
            label,
            basis,
            urdu_matches,
            english_matches,
        }
    }
}

/// Detect the language of `text` with the built-in lexicon
#[must_use]
pub fn detect_language(text: &str) -> LanguageLabel {
    DEFAULT_DETECTOR.detect(text)
}

/// Fraction of non-whitespace characters that are Latin letters
#[allow(clippy::cast_precision_loss)]
fn latin_share(text: &str) -> f64 {
    let (latin, total) = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .fold((0_usize, 0_usize), |(latin, total), c| {
            (latin + usize::from(is_latin_letter(c)), total + 1)
        });

    if total == 0 {
        return 0.0;
    }
    latin as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_symbol_input_defaults_to_english() {
        assert_eq!(detect_language(""), LanguageLabel::English);
        assert_eq!(detect_language("   "), LanguageLabel::English);
        assert_eq!(detect_language("1234 !!! ###"), LanguageLabel::English);
        assert_eq!(detect_language("🍕🍔"), LanguageLabel::English);
    }

    #[test]
    fn test_empty_basis() {
        let detection = LanguageDetector::default().analyze(" \t\n");
        assert_eq!(detection.basis, DetectionBasis::Empty);
    }

    #[test]
    fn test_arabic_script_is_authoritative() {
        let detector = LanguageDetector::default();
        let detection = detector.analyze("hello please order the menu with delivery مجھے");
        assert_eq!(detection.label, LanguageLabel::Urdu);
        assert_eq!(detection.basis, DetectionBasis::Script);
    }

    #[test]
    fn test_roman_urdu_lexicon() {
        let detection = LanguageDetector::default().analyze("kya hal hai");
        assert_eq!(detection.label, LanguageLabel::Urdu);
        assert_eq!(detection.urdu_matches, 3);
        assert_eq!(detection.english_matches, 0);
    }

    #[test]
    fn test_english_lexicon() {
        let detection =
            LanguageDetector::default().analyze("can you please help me order a burger");
        assert_eq!(detection.label, LanguageLabel::English);
        assert_eq!(detection.urdu_matches, 0);
        assert!(detection.english_matches >= 4);
        assert_eq!(detection.basis, DetectionBasis::Lexicon);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(detect_language("KYA HAL HAI"), LanguageLabel::Urdu);
    }

    #[test]
    fn test_tie_with_latin_text_is_english() {
        let detection = LanguageDetector::default().analyze("zxq bvw");
        assert_eq!(detection.label, LanguageLabel::English);
        assert_eq!(detection.basis, DetectionBasis::LatinComposition);
    }

    #[test]
    fn test_tie_without_latin_dominance_is_still_english() {
        let detection = LanguageDetector::default().analyze("नमस्ते दोस्त");
        assert_eq!(detection.label, LanguageLabel::English);
        assert_eq!(detection.basis, DetectionBasis::Default);
    }

    #[test]
    fn test_deterministic() {
        let detector = LanguageDetector::default();
        let text = "mujhe ek pizza chahiye please";
        let first = detector.analyze(text);
        for _ in 0..10 {
            assert_eq!(detector.analyze(text), first);
        }
    }

    #[test]
    fn test_label_from_code() {
        assert_eq!(LanguageLabel::from_code("en-US"), LanguageLabel::English);
        assert_eq!(LanguageLabel::from_code("EN-gb"), LanguageLabel::English);
        assert_eq!(LanguageLabel::from_code("ur-PK"), LanguageLabel::Urdu);
        assert_eq!(LanguageLabel::from_code("hi-IN"), LanguageLabel::Urdu);
    }

    #[test]
    fn test_label_parse() {
        assert_eq!(LanguageLabel::parse("auto"), None);
        assert_eq!(LanguageLabel::parse("Urdu"), Some(LanguageLabel::Urdu));
        assert_eq!(LanguageLabel::parse("en-IN"), Some(LanguageLabel::English));
    }

    #[test]
    fn test_label_serde() {
        assert_eq!(serde_json::to_string(&LanguageLabel::Urdu).unwrap(), "\"urdu\"");
        let label: LanguageLabel = serde_json::from_str("\"english\"").unwrap();
        assert_eq!(label, LanguageLabel::English);
    }
}
