//! Word lists and script ranges used by the language detector

/// Roman-transliterated Urdu/Hindi markers: function words, greetings,
/// food and drink verbs, common expressions
const URDU_MARKERS: &[&str] = &[
    "kya", "hai", "hain", "hal", "aap", "mujhe", "chahiye", "karo", "kar", "nahi", "haan",
    "acha", "theek", "shukriya", "assalam", "salam", "walaikum", "khana", "pani", "chai",
    "kitna", "kitne", "kahan", "kaise", "kyun", "bhai", "yaar", "wala", "mein", "aur", "bhi",
    "dena", "lao", "batao", "dikhao", "abhi", "jaldi", "mera",
];

/// English function words, greetings, wh-words and food delivery nouns
const ENGLISH_MARKERS: &[&str] = &[
    "the", "and", "is", "are", "you", "please", "want", "order", "food", "menu",
    "restaurant", "delivery", "what", "where", "when", "how", "can", "hello", "thank", "with",
    "have", "from", "this", "my", "price",
];

/// Check whether a character belongs to the Arabic script blocks
///
/// Covers Arabic, Arabic Supplement, Arabic Extended-A and both
/// Arabic Presentation Forms blocks.
#[must_use]
pub const fn is_arabic_script(c: char) -> bool {
    matches!(
        c,
        '\u{0600}'..='\u{06FF}'
            | '\u{0750}'..='\u{077F}'
            | '\u{08A0}'..='\u{08FF}'
            | '\u{FB50}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFF}'
    )
}

/// Check whether a character is a Latin letter (ASCII or Latin-1/Extended)
#[must_use]
pub fn is_latin_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || (matches!(c, '\u{00C0}'..='\u{024F}') && c.is_alphabetic())
}

/// Immutable marker-word tables for the two supported languages
#[derive(Debug, Clone)]
pub struct Lexicon {
    urdu: Vec<String>,
    english: Vec<String>,
}

impl Lexicon {
    /// Build a lexicon from custom word lists
    ///
    /// Entries are lowercased and blank entries dropped.
    #[must_use]
    pub fn new<U, E>(urdu: U, english: E) -> Self
    where
        U: IntoIterator,
        U::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Self {
            urdu: normalize(urdu),
            english: normalize(english),
        }
    }

    /// The built-in Roman Urdu / English lexicon
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(URDU_MARKERS, ENGLISH_MARKERS)
    }

    /// Urdu marker entries
    #[must_use]
    pub fn urdu(&self) -> &[String] {
        &self.urdu
    }

    /// English marker entries
    #[must_use]
    pub fn english(&self) -> &[String] {
        &self.english
    }

    /// Count Urdu entries occurring as substrings of already-lowercased text
    #[must_use]
    pub fn urdu_matches(&self, lowered: &str) -> usize {
        count_substring_hits(&self.urdu, lowered)
    }

    /// Count English entries occurring as substrings of already-lowercased text
    #[must_use]
    pub fn english_matches(&self, lowered: &str) -> usize {
        count_substring_hits(&self.english, lowered)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize<I>(words: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    words
        .into_iter()
        .map(|w| w.as_ref().trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

// Every entry counts on its own, even when one entry is a substring of another
fn count_substring_hits(entries: &[String], lowered: &str) -> usize {
    entries
        .iter()
        .filter(|entry| lowered.contains(entry.as_str()))
        .count()
}
