//! Two-phase speech recognition with per-language retry
//!
//! Phase A makes one multi-language call with automatic language detection.
//! When that call fails, hears nothing, or is not confident enough, phase B
//! tries each candidate language in turn, scores every transcript by engine
//! confidence and language plausibility, and stops early on a good enough
//! match. All calls are sequential.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{RecognitionConfig, SpeechRecognizer};
use crate::intent::{Intent, IntentExtractor};
use crate::language::LanguageLabel;
use crate::{Error, Result};

/// Minimum trimmed transcript length accepted from phase A
pub const MIN_TRANSCRIPT_CHARS: usize = 2;

/// Minimum engine confidence accepted from phase A
pub const MIN_PRIMARY_CONFIDENCE: f32 = 0.3;

/// Combined score above which phase B stops trying further languages
pub const EARLY_EXIT_SCORE: f32 = 0.6;

const LANGUAGE_MATCH_SCORE: f32 = 0.8;
const LANGUAGE_MISMATCH_SCORE: f32 = 0.2;

/// Plausibility of a transcript for the language it was recognized in
///
/// 0.8 when the detector's label for the transcript belongs to the
/// candidate code's family, 0.2 otherwise.
#[must_use]
pub fn language_score(detected: LanguageLabel, candidate_code: &str) -> f32 {
    if LanguageLabel::from_code(candidate_code) == detected {
        LANGUAGE_MATCH_SCORE
    } else {
        LANGUAGE_MISMATCH_SCORE
    }
}

/// Languages and hints the pipeline recognizes with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionSettings {
    /// Primary language for the multi-language call
    pub primary_language: String,
    /// Alternatives offered alongside the primary language
    pub alternative_languages: Vec<String>,
    /// Languages tried one by one in phase B, in order
    pub candidate_languages: [String; 3],
    /// Restaurant and food terms to bias recognition
    pub phrase_hints: Vec<String>,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            primary_language: "ur-PK".to_string(),
            alternative_languages: vec!["en-US".to_string(), "hi-IN".to_string()],
            candidate_languages: [
                "ur-PK".to_string(),
                "hi-IN".to_string(),
                "en-US".to_string(),
            ],
            phrase_hints: default_phrase_hints(),
        }
    }
}

/// Built-in domain phrases
#[must_use]
pub fn default_phrase_hints() -> Vec<String> {
    [
        "order", "menu", "restaurant", "delivery", "pizza", "burger", "biryani", "karahi",
        "nihari", "tikka", "kebab", "naan", "roti", "chai", "lassi", "raita", "pulao",
        "haleem", "chahiye", "khana", "mujhe", "deal", "combo",
    ]
    .into_iter()
    .map(ToString::to_string)
    .collect()
}

/// Per-request audio description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioOptions {
    pub encoding: String,
    pub sample_rate_hertz: u32,
    /// Language code to prefer in phase A, or `auto`
    pub language: String,
    /// Offer alternative languages in phase A
    pub enable_auto_detection: bool,
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            encoding: "WEBM_OPUS".to_string(),
            sample_rate_hertz: 48_000,
            language: "auto".to_string(),
            enable_auto_detection: true,
        }
    }
}

/// Which phase produced the accepted transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionPhase {
    MultiLanguage,
    PerLanguage,
}

/// One phase B try against one candidate language
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionAttempt {
    pub language_code: String,
    pub transcript: String,
    pub reported_confidence: f32,
    pub detected_language: LanguageLabel,
    pub language_score: f32,
}

impl RecognitionAttempt {
    /// Mean of engine confidence and language plausibility
    #[must_use]
    pub fn combined_score(&self) -> f32 {
        (self.reported_confidence + self.language_score) / 2.0
    }
}

/// Result of understanding an utterance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Understanding {
    pub text: String,
    pub language: LanguageLabel,
    /// Code the accepted transcript was recognized with
    pub language_code: String,
    pub intent: Intent,
    /// Engine-reported confidence of the accepted transcript
    pub confidence: f32,
    pub phase: RecognitionPhase,
}

/// Speech recognition orchestrator
#[derive(Clone)]
pub struct SpeechPipeline {
    recognizer: Arc<dyn SpeechRecognizer>,
    extractor: IntentExtractor,
    settings: RecognitionSettings,
}

impl SpeechPipeline {
    /// Create a pipeline
    #[must_use]
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        extractor: IntentExtractor,
        settings: RecognitionSettings,
    ) -> Self {
        Self {
            recognizer,
            extractor,
            settings,
        }
    }

    /// Recognition settings in use
    #[must_use]
    pub const fn settings(&self) -> &RecognitionSettings {
        &self.settings
    }

    /// Transcribe `audio` and extract its intent
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecognitionFailed`] if no candidate language produced
    /// a transcript. Every other failure is absorbed.
    pub async fn recognize_and_understand(
        &self,
        audio: &[u8],
        options: &AudioOptions,
    ) -> Result<Understanding> {
        tracing::debug!(
            audio_bytes = audio.len(),
            encoding = %options.encoding,
            sample_rate = options.sample_rate_hertz,
            recognizer = self.recognizer.name(),
            "starting recognition"
        );

        if let Some(understanding) = self.try_multi_language(audio, options).await {
            return Ok(understanding);
        }

        self.try_individual_languages(audio, options).await
    }

    /// Resolve a requested language (`auto`, a name, or a code) to a code
    fn primary_language(&self, requested: &str) -> String {
        let requested = requested.trim();
        match requested.to_ascii_lowercase().as_str() {
            "" | "auto" => self.settings.primary_language.clone(),
            "urdu" => LanguageLabel::Urdu.default_locale().to_string(),
            "english" => LanguageLabel::English.default_locale().to_string(),
            _ => requested.to_string(),
        }
    }

    /// Languages offered alongside `primary` in phase A
    ///
    /// The configured primary stays on offer when the caller asked for
    /// another language first.
    fn alternative_languages(&self, primary: &str) -> Vec<String> {
        let mut alternatives: Vec<String> = self
            .settings
            .alternative_languages
            .iter()
            .filter(|code| *code != primary)
            .cloned()
            .collect();

        let configured = &self.settings.primary_language;
        if configured != primary && !alternatives.contains(configured) {
            alternatives.push(configured.clone());
        }
        alternatives
    }

    /// Phase A; `None` means fall through to phase B
    async fn try_multi_language(&self, audio: &[u8], options: &AudioOptions) -> Option<Understanding> {
        let primary = self.primary_language(&options.language);
        let alternatives = if options.enable_auto_detection {
            self.alternative_languages(&primary)
        } else {
            Vec::new()
        };

        let config = RecognitionConfig {
            encoding: options.encoding.clone(),
            sample_rate_hertz: options.sample_rate_hertz,
            language_code: primary.clone(),
            alternative_language_codes: alternatives,
            enable_auto_detection: options.enable_auto_detection,
            enable_automatic_punctuation: true,
            phrase_hints: self.settings.phrase_hints.clone(),
        };

        let alternatives = match self.recognizer.recognize(audio, &config).await {
            Ok(alternatives) => alternatives,
            Err(e) => {
                tracing::warn!(error = %e, "multi-language recognition failed, trying languages individually");
                return None;
            }
        };

        let Some(top) = alternatives.into_iter().next() else {
            tracing::debug!("multi-language recognition returned no results");
            return None;
        };

        let trimmed_chars = top.transcript.trim().chars().count();
        if trimmed_chars < MIN_TRANSCRIPT_CHARS || top.confidence < MIN_PRIMARY_CONFIDENCE {
            tracing::debug!(
                transcript = %top.transcript,
                confidence = top.confidence,
                "multi-language result rejected"
            );
            return None;
        }

        let language = self.extractor.detector().detect(&top.transcript);
        let intent = self.extractor.extract_detected(&top.transcript, language).await;
        let language_code = top
            .language_code
            .filter(|code| !code.trim().is_empty())
            .unwrap_or_else(|| language.default_locale().to_string());

        tracing::info!(
            transcript = %top.transcript,
            confidence = top.confidence,
            %language,
            %language_code,
            intent = %intent.intent,
            "recognized in multi-language pass"
        );

        Some(Understanding {
            text: top.transcript,
            language,
            language_code,
            intent,
            confidence: top.confidence,
            phase: RecognitionPhase::MultiLanguage,
        })
    }

    /// Phase B
    async fn try_individual_languages(
        &self,
        audio: &[u8],
        options: &AudioOptions,
    ) -> Result<Understanding> {
        let mut best: Option<RecognitionAttempt> = None;

        for code in &self.settings.candidate_languages {
            let config = RecognitionConfig {
                encoding: options.encoding.clone(),
                sample_rate_hertz: options.sample_rate_hertz,
                language_code: code.clone(),
                alternative_language_codes: Vec::new(),
                enable_auto_detection: false,
                enable_automatic_punctuation: true,
                phrase_hints: self.settings.phrase_hints.clone(),
            };

            let top = match self.recognizer.recognize(audio, &config).await {
                Ok(alternatives) => alternatives.into_iter().next(),
                Err(e) => {
                    tracing::warn!(language_code = %code, error = %e, "recognition attempt failed");
                    continue;
                }
            };

            let Some(top) = top.filter(|alt| !alt.transcript.trim().is_empty()) else {
                tracing::debug!(language_code = %code, "no transcript");
                continue;
            };

            let detected_language = self.extractor.detector().detect(&top.transcript);
            let attempt = RecognitionAttempt {
                language_code: code.clone(),
                language_score: language_score(detected_language, code),
                transcript: top.transcript,
                reported_confidence: top.confidence,
                detected_language,
            };
            let score = attempt.combined_score();

            tracing::debug!(
                language_code = %code,
                transcript = %attempt.transcript,
                confidence = attempt.reported_confidence,
                language_score = attempt.language_score,
                score,
                "recognition attempt scored"
            );

            if score > EARLY_EXIT_SCORE {
                return Ok(self.understand(attempt).await);
            }

            if best.as_ref().is_none_or(|b| score > b.combined_score()) {
                best = Some(attempt);
            }
        }

        match best {
            Some(attempt) => Ok(self.understand(attempt).await),
            None => {
                tracing::warn!("no candidate language produced a transcript");
                Err(Error::recognition_failed())
            }
        }
    }

    async fn understand(&self, attempt: RecognitionAttempt) -> Understanding {
        let intent = self
            .extractor
            .extract_detected(&attempt.transcript, attempt.detected_language)
            .await;

        tracing::info!(
            transcript = %attempt.transcript,
            language_code = %attempt.language_code,
            score = attempt.combined_score(),
            intent = %intent.intent,
            "recognized in per-language pass"
        );

        Understanding {
            text: attempt.transcript,
            language: attempt.detected_language,
            language_code: attempt.language_code,
            intent,
            confidence: attempt.reported_confidence,
            phase: RecognitionPhase::PerLanguage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Deaf;

    #[async_trait::async_trait]
    impl SpeechRecognizer for Deaf {
        async fn recognize(
            &self,
            _audio: &[u8],
            _config: &RecognitionConfig,
        ) -> Result<Vec<crate::speech::RecognitionAlternative>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &'static str {
            "deaf"
        }
    }

    fn attempt(confidence: f32, score: f32) -> RecognitionAttempt {
        RecognitionAttempt {
            language_code: "ur-PK".to_string(),
            transcript: "kya hal hai".to_string(),
            reported_confidence: confidence,
            detected_language: LanguageLabel::Urdu,
            language_score: score,
        }
    }

    #[test]
    fn test_language_score() {
        assert!((language_score(LanguageLabel::English, "en-US") - 0.8).abs() < f32::EPSILON);
        assert!((language_score(LanguageLabel::Urdu, "en-US") - 0.2).abs() < f32::EPSILON);
        assert!((language_score(LanguageLabel::Urdu, "ur-PK") - 0.8).abs() < f32::EPSILON);
        assert!((language_score(LanguageLabel::Urdu, "hi-IN") - 0.8).abs() < f32::EPSILON);
        assert!((language_score(LanguageLabel::English, "hi-IN") - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_combined_score_is_mean() {
        assert!((attempt(0.5, 0.8).combined_score() - 0.65).abs() < 1e-6);
        assert!((attempt(0.2, 0.2).combined_score() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_requested_language_keeps_configured_primary_on_offer() {
        let pipeline = SpeechPipeline::new(
            Arc::new(Deaf),
            IntentExtractor::offline(Arc::new(crate::language::LanguageDetector::default())),
            RecognitionSettings::default(),
        );
        assert_eq!(pipeline.alternative_languages("ur-PK"), vec!["en-US", "hi-IN"]);
        assert_eq!(pipeline.alternative_languages("en-US"), vec!["hi-IN", "ur-PK"]);
        assert_eq!(
            pipeline.alternative_languages("ar-SA"),
            vec!["en-US", "hi-IN", "ur-PK"]
        );
    }

    #[test]
    fn test_default_settings() {
        let settings = RecognitionSettings::default();
        assert_eq!(settings.candidate_languages[2], "en-US");
        assert!(settings.phrase_hints.iter().any(|p| p == "biryani"));
    }

    #[test]
    fn test_audio_options_wire_shape() {
        let options: AudioOptions =
            serde_json::from_str(r#"{"encoding":"LINEAR16","sampleRateHertz":16000}"#).unwrap();
        assert_eq!(options.encoding, "LINEAR16");
        assert_eq!(options.sample_rate_hertz, 16_000);
        assert_eq!(options.language, "auto");
        assert!(options.enable_auto_detection);
    }
}
