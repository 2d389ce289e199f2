//! Google Cloud Speech-to-Text and Text-to-Speech over REST

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{
    RecognitionAlternative, RecognitionConfig, SpeechRecognizer, SpeechSynthesizer,
    VoicePreferences,
};
use crate::{Error, Result};

const RECOGNIZE_URL: &str = "https://speech.googleapis.com/v1p1beta1/speech:recognize";
const SYNTHESIZE_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Boost applied to domain phrase hints
const PHRASE_BOOST: f32 = 15.0;

/// Google Cloud speech recognizer
pub struct GoogleSpeechToText {
    client: Client,
    api_key: SecretString,
}

impl GoogleSpeechToText {
    /// Create a new recognizer
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "Google Cloud API key required for speech recognition".to_string(),
            ));
        }

        Ok(Self {
            client: Client::new(),
            api_key: SecretString::from(api_key),
        })
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleSpeechToText {
    async fn recognize(
        &self,
        audio: &[u8],
        config: &RecognitionConfig,
    ) -> Result<Vec<RecognitionAlternative>> {
        tracing::debug!(
            audio_bytes = audio.len(),
            language_code = %config.language_code,
            alternatives = ?config.alternative_language_codes,
            "starting Google recognition"
        );

        let request = RecognizeRequest::new(audio, config);

        let response = self
            .client
            .post(RECOGNIZE_URL)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Google recognize request failed");
                Error::SttCallFailed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Google STT API error");
            return Err(Error::SttCallFailed(format!(
                "Google STT API error {status}: {body}"
            )));
        }

        let result: RecognizeResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Google STT response");
            Error::SttCallFailed(e.to_string())
        })?;

        Ok(result.top_alternatives())
    }

    fn name(&self) -> &'static str {
        "google-stt"
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest<'a> {
    config: RecognizeConfig<'a>,
    audio: RecognizeAudio,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeConfig<'a> {
    encoding: &'a str,
    sample_rate_hertz: u32,
    language_code: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    alternative_language_codes: &'a [String],
    enable_automatic_punctuation: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    speech_contexts: Vec<SpeechContext<'a>>,
}

#[derive(Serialize)]
struct SpeechContext<'a> {
    phrases: &'a [String],
    boost: f32,
}

#[derive(Serialize)]
struct RecognizeAudio {
    content: String,
}

impl<'a> RecognizeRequest<'a> {
    fn new(audio: &[u8], config: &'a RecognitionConfig) -> Self {
        let alternative_language_codes: &[String] = if config.enable_auto_detection {
            &config.alternative_language_codes
        } else {
            &[]
        };

        let speech_contexts = if config.phrase_hints.is_empty() {
            Vec::new()
        } else {
            vec![SpeechContext {
                phrases: &config.phrase_hints,
                boost: PHRASE_BOOST,
            }]
        };

        Self {
            config: RecognizeConfig {
                encoding: &config.encoding,
                sample_rate_hertz: config.sample_rate_hertz,
                language_code: &config.language_code,
                alternative_language_codes,
                enable_automatic_punctuation: config.enable_automatic_punctuation,
                speech_contexts,
            },
            audio: RecognizeAudio {
                content: base64::engine::general_purpose::STANDARD.encode(audio),
            },
        }
    }
}

#[derive(Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognizeResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeResult {
    #[serde(default)]
    alternatives: Vec<GoogleAlternative>,
    /// Set when alternative languages were offered
    #[serde(default)]
    language_code: Option<String>,
}

#[derive(Deserialize)]
struct GoogleAlternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    confidence: f32,
}

impl RecognizeResponse {
    /// Best alternative of each result segment, in order
    fn top_alternatives(self) -> Vec<RecognitionAlternative> {
        self.results
            .into_iter()
            .filter_map(|r| {
                let language_code = r.language_code.as_deref().map(locale_case);
                r.alternatives
                    .into_iter()
                    .next()
                    .map(|a| RecognitionAlternative {
                        transcript: a.transcript,
                        confidence: a.confidence,
                        language_code,
                    })
            })
            .collect()
    }
}

/// `ur-pk` as `ur-PK`; Google reports result languages in lowercase
fn locale_case(code: &str) -> String {
    match code.split_once('-') {
        Some((lang, region)) => format!(
            "{}-{}",
            lang.to_ascii_lowercase(),
            region.to_ascii_uppercase()
        ),
        None => code.to_ascii_lowercase(),
    }
}

/// Google Cloud speech synthesizer
pub struct GoogleTextToSpeech {
    client: Client,
    api_key: SecretString,
}

impl GoogleTextToSpeech {
    /// Create a new synthesizer
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "Google Cloud API key required for TTS".to_string(),
            ));
        }

        Ok(Self {
            client: Client::new(),
            api_key: SecretString::from(api_key),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTextToSpeech {
    async fn synthesize(
        &self,
        text: &str,
        language_code: &str,
        voice: &VoicePreferences,
    ) -> Result<Vec<u8>> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct SynthesizeRequest<'a> {
            input: Input<'a>,
            voice: Voice<'a>,
            audio_config: AudioConfig,
        }

        #[derive(Serialize)]
        struct Input<'a> {
            text: &'a str,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Voice<'a> {
            language_code: &'a str,
            ssml_gender: &'static str,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct AudioConfig {
            audio_encoding: &'static str,
            speaking_rate: f64,
            pitch: f64,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct SynthesizeResponse {
            audio_content: String,
        }

        let request = SynthesizeRequest {
            input: Input { text },
            voice: Voice {
                language_code,
                ssml_gender: voice.voice_gender.ssml_name(),
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                speaking_rate: voice.speaking_rate,
                pitch: voice.pitch,
            },
        };

        let response = self
            .client
            .post(SYNTHESIZE_URL)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("Google TTS error {status}: {body}")));
        }

        let result: SynthesizeResponse = response.json().await?;
        base64::engine::general_purpose::STANDARD
            .decode(result.audio_content)
            .map_err(|e| Error::Tts(format!("invalid audio content: {e}")))
    }

    fn name(&self) -> &'static str {
        "google-tts"
    }
}
