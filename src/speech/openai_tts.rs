//! `OpenAI` text-to-speech

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::{SpeechSynthesizer, VoiceGender, VoicePreferences};
use crate::{Error, Result};

/// Synthesizes speech with the `OpenAI` speech endpoint
///
/// The endpoint picks pronunciation from the text itself, so the language
/// code is only logged.
pub struct OpenAiTextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    voice: Option<String>,
}

impl OpenAiTextToSpeech {
    /// Create a new TTS instance
    ///
    /// `voice` overrides the gender-based voice choice when set.
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: String, model: String, voice: Option<String>) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key: SecretString::from(api_key),
            model,
            voice,
        })
    }

    fn voice_for(&self, gender: VoiceGender) -> &str {
        self.voice.as_deref().unwrap_or(match gender {
            VoiceGender::Male => "onyx",
            VoiceGender::Female => "nova",
            VoiceGender::Neutral => "alloy",
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiTextToSpeech {
    async fn synthesize(
        &self,
        text: &str,
        language_code: &str,
        voice: &VoicePreferences,
    ) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f64,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: self.voice_for(voice.voice_gender),
            speed: voice.speaking_rate,
        };

        tracing::debug!(language_code, voice = request.voice, "synthesizing with OpenAI");

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    fn name(&self) -> &'static str {
        "openai-tts"
    }
}
