//! Speech recognition and synthesis
//!
//! Recognition and synthesis engines sit behind the [`SpeechRecognizer`] and
//! [`SpeechSynthesizer`] traits; [`SpeechPipeline`] drives recognition across
//! candidate languages and hands the winning transcript to intent extraction.

mod google;
mod openai_tts;
mod pipeline;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

pub use google::{GoogleSpeechToText, GoogleTextToSpeech};
pub use openai_tts::OpenAiTextToSpeech;
pub use pipeline::{
    AudioOptions, EARLY_EXIT_SCORE, MIN_PRIMARY_CONFIDENCE, MIN_TRANSCRIPT_CHARS,
    RecognitionAttempt, RecognitionPhase, RecognitionSettings, SpeechPipeline, Understanding,
    language_score,
};

/// Engine configuration for a single recognition call
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionConfig {
    /// Audio encoding name (e.g. `WEBM_OPUS`, `LINEAR16`)
    pub encoding: String,
    /// Sample rate of the audio
    pub sample_rate_hertz: u32,
    /// Primary BCP-47 language code
    pub language_code: String,
    /// Further languages the engine may pick from
    pub alternative_language_codes: Vec<String>,
    /// Let the engine choose between primary and alternative languages
    pub enable_auto_detection: bool,
    /// Insert punctuation into transcripts
    pub enable_automatic_punctuation: bool,
    /// Domain phrases to bias recognition towards
    pub phrase_hints: Vec<String>,
}

/// One transcript hypothesis returned by a recognizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionAlternative {
    pub transcript: String,
    /// Engine-reported confidence in `[0, 1]`
    pub confidence: f32,
    /// Language the engine picked, when it reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

/// Speech-to-text engine
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe `audio`, best hypothesis first
    ///
    /// An empty list means the engine heard nothing it could transcribe.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SttCallFailed`] if the engine call fails
    async fn recognize(
        &self,
        audio: &[u8],
        config: &RecognitionConfig,
    ) -> Result<Vec<RecognitionAlternative>>;

    /// Engine name for logging
    fn name(&self) -> &'static str;
}

/// Voice gender requested from a synthesizer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    Male,
    #[default]
    Female,
    Neutral,
}

impl VoiceGender {
    /// Parse a gender name, case-insensitively
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }

    /// Upper-case form used by Google Cloud (`MALE`, `FEMALE`, `NEUTRAL`)
    #[must_use]
    pub const fn ssml_name(self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
            Self::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for VoiceGender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Neutral => "neutral",
        })
    }
}

/// Per-user voice settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoicePreferences {
    /// Preferred language code, or `auto` to follow the detected language
    pub language: String,
    pub voice_gender: VoiceGender,
    /// Speed multiplier, 0.25 to 4.0
    pub speaking_rate: f64,
    /// Pitch shift in semitones, -20.0 to 20.0
    pub pitch: f64,
}

impl Default for VoicePreferences {
    fn default() -> Self {
        Self {
            language: "auto".to_string(),
            voice_gender: VoiceGender::default(),
            speaking_rate: 1.0,
            pitch: 0.0,
        }
    }
}

impl VoicePreferences {
    /// Copy with rate and pitch clamped to what synthesizers accept
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.speaking_rate = self.speaking_rate.clamp(0.25, 4.0);
        self.pitch = self.pitch.clamp(-20.0, 20.0);
        if self.language.trim().is_empty() {
            self.language = "auto".to_string();
        }
        self
    }
}

/// Text-to-speech engine
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` in `language_code`, returning encoded audio (MP3)
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Tts`] if synthesis fails
    async fn synthesize(
        &self,
        text: &str,
        language_code: &str,
        voice: &VoicePreferences,
    ) -> Result<Vec<u8>>;

    /// Engine name for logging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_wire_shape() {
        let prefs: VoicePreferences =
            serde_json::from_str(r#"{"language":"ur-PK","voiceGender":"male","speakingRate":1.2}"#)
                .unwrap();
        assert_eq!(prefs.language, "ur-PK");
        assert_eq!(prefs.voice_gender, VoiceGender::Male);
        assert!((prefs.speaking_rate - 1.2).abs() < f64::EPSILON);
        assert!(prefs.pitch.abs() < f64::EPSILON);

        let json = serde_json::to_value(VoicePreferences::default()).unwrap();
        assert_eq!(json["voiceGender"], "female");
        assert_eq!(json["language"], "auto");
    }

    #[test]
    fn test_preferences_clamped() {
        let prefs = VoicePreferences {
            language: " ".to_string(),
            voice_gender: VoiceGender::Neutral,
            speaking_rate: 9.0,
            pitch: -50.0,
        }
        .clamped();
        assert!((prefs.speaking_rate - 4.0).abs() < f64::EPSILON);
        assert!((prefs.pitch + 20.0).abs() < f64::EPSILON);
        assert_eq!(prefs.language, "auto");
    }

    #[test]
    fn test_ssml_gender() {
        assert_eq!(VoiceGender::Male.ssml_name(), "MALE");
        assert_eq!(VoiceGender::default().ssml_name(), "FEMALE");
        assert_eq!(VoiceGender::parse(" Male "), Some(VoiceGender::Male));
        assert_eq!(VoiceGender::parse("robot"), None);
    }
}
