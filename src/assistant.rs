//! Text and voice turns over the understanding pipeline
//!
//! An [`Assistant`] owns everything a turn needs: intent extraction, reply
//! composition, optional speech engines, and the preference and history
//! stores. Handlers and the CLI call it rather than wiring the parts
//! themselves.

use std::sync::Arc;

use serde::Serialize;

use crate::config::{Config, TtsProvider};
use crate::db::{DbPool, Interaction, InteractionRepo, NewInteraction, PreferencesRepo};
use crate::intent::{Intent, IntentExtractor};
use crate::language::{LanguageDetector, LanguageLabel};
use crate::response::ResponseComposer;
use crate::speech::{
    AudioOptions, GoogleSpeechToText, GoogleTextToSpeech, OpenAiTextToSpeech, RecognitionSettings,
    SpeechPipeline, SpeechSynthesizer, Understanding, VoicePreferences,
};
use crate::{Error, Result};

/// Result of a text turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextTurn {
    pub text: String,
    pub language: LanguageLabel,
    pub intent: Intent,
    pub response: String,
}

/// Result of a voice turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceTurn {
    #[serde(flatten)]
    pub understanding: Understanding,
    pub response: String,
    /// Synthesized reply (MP3), when requested and available
    #[serde(skip)]
    pub audio: Option<Vec<u8>>,
}

/// Understanding pipeline with its stores and speech engines
#[derive(Clone)]
pub struct Assistant {
    extractor: IntentExtractor,
    composer: Arc<ResponseComposer>,
    pipeline: Option<SpeechPipeline>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    preferences: PreferencesRepo,
    history: InteractionRepo,
    default_voice: VoicePreferences,
    default_audio: AudioOptions,
}

impl Assistant {
    /// Create an assistant without speech engines
    #[must_use]
    pub fn new(extractor: IntentExtractor, composer: ResponseComposer, db: DbPool) -> Self {
        Self {
            extractor,
            composer: Arc::new(composer),
            pipeline: None,
            synthesizer: None,
            preferences: PreferencesRepo::new(db.clone()),
            history: InteractionRepo::new(db),
            default_voice: VoicePreferences::default(),
            default_audio: AudioOptions::default(),
        }
    }

    /// Build an assistant from configuration
    ///
    /// Engines whose API key is missing are left out; the matching turns then
    /// fail with [`Error::Config`].
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid
    pub fn from_config(config: &Config, db: DbPool) -> Result<Self> {
        let detector = Arc::new(LanguageDetector::default());
        let completion = crate::llm::from_config(&config.llm, &config.api_keys);
        if completion.is_none() {
            tracing::warn!("no completion provider configured, intents use keyword rules only");
        }
        let extractor = IntentExtractor::with_provider(completion, detector);

        let mut assistant = Self::new(extractor.clone(), config.composer()?, db)
            .with_default_voice(config.tts.defaults.clone())
            .with_default_audio(config.audio.clone());

        if let Some(key) = config.api_keys.google_cloud.clone() {
            let recognizer = Arc::new(GoogleSpeechToText::new(key)?);
            assistant = assistant.with_pipeline(SpeechPipeline::new(
                recognizer,
                extractor,
                config.recognition.clone(),
            ));
        } else {
            tracing::warn!("GOOGLE_CLOUD_API_KEY not set, speech recognition disabled");
        }

        let synthesizer: Option<Arc<dyn SpeechSynthesizer>> = match config.tts.provider {
            TtsProvider::Google => match config.api_keys.google_cloud.clone() {
                Some(key) => Some(Arc::new(GoogleTextToSpeech::new(key)?) as Arc<dyn SpeechSynthesizer>),
                None => None,
            },
            TtsProvider::OpenAi => match config.api_keys.openai.clone() {
                Some(key) => Some(Arc::new(OpenAiTextToSpeech::new(
                    key,
                    config.tts.model.clone(),
                    config.tts.voice.clone(),
                )?) as Arc<dyn SpeechSynthesizer>),
                None => None,
            },
        };

        match synthesizer {
            Some(synthesizer) => {
                tracing::info!(provider = synthesizer.name(), "speech synthesis enabled");
                assistant = assistant.with_synthesizer(synthesizer);
            }
            None => tracing::warn!("no API key for the TTS provider, speech synthesis disabled"),
        }

        Ok(assistant)
    }

    /// Attach a speech recognition pipeline
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: SpeechPipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Attach a speech synthesizer
    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Set the voice used for users without saved preferences
    #[must_use]
    pub fn with_default_voice(mut self, voice: VoicePreferences) -> Self {
        self.default_voice = voice.clamped();
        self
    }

    /// Set the audio description used when a request gives none
    #[must_use]
    pub fn with_default_audio(mut self, audio: AudioOptions) -> Self {
        self.default_audio = audio;
        self
    }

    #[must_use]
    pub const fn extractor(&self) -> &IntentExtractor {
        &self.extractor
    }

    #[must_use]
    pub fn composer(&self) -> &ResponseComposer {
        &self.composer
    }

    #[must_use]
    pub const fn default_audio(&self) -> &AudioOptions {
        &self.default_audio
    }

    /// Languages the recognition pipeline uses, if configured
    #[must_use]
    pub fn recognition_settings(&self) -> Option<&RecognitionSettings> {
        self.pipeline.as_ref().map(SpeechPipeline::settings)
    }

    /// Whether voice turns are available
    #[must_use]
    pub const fn can_recognize(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Whether replies can be spoken
    #[must_use]
    pub const fn can_synthesize(&self) -> bool {
        self.synthesizer.is_some()
    }

    /// Understand a typed utterance and compose a reply
    ///
    /// The turn is recorded in `user_id`'s history when one is given.
    pub async fn process_text(&self, text: &str, user_id: Option<&str>) -> TextTurn {
        let language = self.extractor.detector().detect(text);
        let intent = self.extractor.extract_detected(text, language).await;
        let response = self.composer.compose(&intent, text);

        if let Some(user_id) = user_id {
            self.record(NewInteraction {
                user_id,
                transcript: text,
                language,
                language_code: None,
                intent: &intent,
                stt_confidence: None,
                reply: &response,
            });
        }

        TextTurn {
            text: text.to_string(),
            language,
            intent,
            response,
        }
    }

    /// Recognize an utterance, compose a reply, and optionally speak it
    ///
    /// A synthesis failure leaves `audio` empty; the turn itself succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if recognition is not configured and
    /// [`Error::RecognitionFailed`] if no language produced a transcript
    pub async fn process_voice(
        &self,
        audio: &[u8],
        options: &AudioOptions,
        user_id: Option<&str>,
        speak: bool,
    ) -> Result<VoiceTurn> {
        let pipeline = self
            .pipeline
            .as_ref()
            .ok_or_else(|| Error::Config("speech recognition not configured".to_string()))?;

        let understanding = pipeline.recognize_and_understand(audio, options).await?;
        let response = self.composer.compose(&understanding.intent, &understanding.text);

        if let Some(user_id) = user_id {
            self.record(NewInteraction {
                user_id,
                transcript: &understanding.text,
                language: understanding.language,
                language_code: Some(&understanding.language_code),
                intent: &understanding.intent,
                stt_confidence: Some(understanding.confidence),
                reply: &response,
            });
        }

        let audio = if speak && self.synthesizer.is_some() {
            match self
                .synthesize(&response, Some(understanding.language), user_id)
                .await
            {
                Ok(audio) => Some(audio),
                Err(e) => {
                    tracing::warn!(error = %e, "reply synthesis failed, returning text only");
                    None
                }
            }
        } else {
            None
        };

        Ok(VoiceTurn {
            understanding,
            response,
            audio,
        })
    }

    /// Speak `text` with the user's voice preferences
    ///
    /// The preferred language wins; with `auto` the given language's default
    /// locale is used, then the detected language of `text`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if synthesis is not configured, or the
    /// synthesizer's error
    pub async fn synthesize(
        &self,
        text: &str,
        language: Option<LanguageLabel>,
        user_id: Option<&str>,
    ) -> Result<Vec<u8>> {
        let synthesizer = self
            .synthesizer
            .as_ref()
            .ok_or_else(|| Error::Config("speech synthesis not configured".to_string()))?;

        let voice = match user_id {
            Some(user_id) => self.preferences(user_id)?,
            None => self.default_voice.clone(),
        };

        let language_code = if voice.language.eq_ignore_ascii_case("auto") {
            language
                .unwrap_or_else(|| self.extractor.detector().detect(text))
                .default_locale()
                .to_string()
        } else {
            voice.language.clone()
        };

        tracing::debug!(
            synthesizer = synthesizer.name(),
            %language_code,
            gender = %voice.voice_gender,
            "synthesizing reply"
        );

        synthesizer.synthesize(text, &language_code, &voice).await
    }

    /// A user's voice preferences, or the defaults
    ///
    /// # Errors
    ///
    /// Returns error if the database lookup fails
    pub fn preferences(&self, user_id: &str) -> Result<VoicePreferences> {
        self.preferences.get_or(user_id, &self.default_voice)
    }

    /// Save a user's voice preferences, returning the clamped stored value
    ///
    /// # Errors
    ///
    /// Returns error if the database write fails
    pub fn save_preferences(
        &self,
        user_id: &str,
        preferences: VoicePreferences,
    ) -> Result<VoicePreferences> {
        self.preferences.save(user_id, preferences)
    }

    /// A user's most recent turns, newest first
    ///
    /// # Errors
    ///
    /// Returns error if the database lookup fails
    pub fn history(&self, user_id: &str, limit: usize) -> Result<Vec<Interaction>> {
        self.history.list_recent(user_id, limit)
    }

    fn record(&self, interaction: NewInteraction<'_>) {
        if let Err(e) = self.history.record(interaction) {
            tracing::warn!(user_id = interaction.user_id, error = %e, "failed to record interaction");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory;
    use crate::intent::IntentKind;

    fn offline() -> Assistant {
        let extractor = IntentExtractor::offline(Arc::new(LanguageDetector::default()));
        Assistant::new(extractor, ResponseComposer::default(), init_memory().unwrap())
    }

    #[tokio::test]
    async fn test_text_turn() {
        let assistant = offline();
        let turn = assistant.process_text("hello there", None).await;
        assert_eq!(turn.language, LanguageLabel::English);
        assert_eq!(turn.intent.intent, IntentKind::Greeting);
        assert!(!turn.response.is_empty());
    }

    #[tokio::test]
    async fn test_text_turn_recorded() {
        let assistant = offline();
        assistant.process_text("kya hal hai", Some("user-1")).await;
        assistant.process_text("hello", None).await;

        let history = assistant.history("user-1", 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].transcript, "kya hal hai");
        assert_eq!(history[0].language, LanguageLabel::Urdu);
    }

    #[tokio::test]
    async fn test_voice_turn_requires_recognizer() {
        let assistant = offline();
        let err = assistant
            .process_voice(b"audio", &AudioOptions::default(), None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_synthesize_requires_synthesizer() {
        let assistant = offline();
        assert!(!assistant.can_synthesize());
        let err = assistant.synthesize("hello", None, None).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_preferences_default_and_saved() {
        let assistant = offline();
        assert_eq!(
            assistant.preferences("user-1").unwrap(),
            VoicePreferences::default()
        );

        let saved = assistant
            .save_preferences(
                "user-1",
                VoicePreferences {
                    speaking_rate: 7.0,
                    ..VoicePreferences::default()
                },
            )
            .unwrap();
        assert_eq!(assistant.preferences("user-1").unwrap(), saved);
    }
}
