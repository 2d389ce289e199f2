//! Configuration management for the Bolo gateway
//!
//! Values resolve in order: environment variable, then `config.toml`, then
//! built-in default.

pub mod file;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::response::{ResponseComposer, TemplateTable};
use crate::speech::{AudioOptions, RecognitionSettings, VoiceGender, VoicePreferences};
use crate::{Error, LanguageLabel, Result};

use file::BoloConfigFile;

/// Default API server port
pub const DEFAULT_PORT: u16 = 8787;

/// Bolo gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to data directory (database)
    pub data_dir: PathBuf,

    /// Completion provider configuration
    pub llm: LlmConfig,

    /// Recognition languages and phrase hints
    pub recognition: RecognitionSettings,

    /// Audio description used when a request does not give one
    pub audio: AudioOptions,

    /// Speech synthesis configuration
    pub tts: TtsConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// HTTP API server configuration
    pub api_server: ApiServerConfig,

    /// Reply template overrides by language
    pub responses: HashMap<LanguageLabel, HashMap<String, String>>,
}

/// Completion provider choice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LlmProvider {
    #[default]
    OpenAi,
    Gemini,
}

impl LlmProvider {
    /// Parse a provider name
    ///
    /// # Errors
    ///
    /// Returns error for unknown providers
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" | "openrouter" => Ok(Self::OpenAi),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(Error::Config(format!("unknown LLM provider '{other}'"))),
        }
    }

    /// Model used when none is configured
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Gemini => "gemini-1.5-flash",
        }
    }
}

/// Completion provider configuration
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    /// Base URL override for OpenAI-compatible endpoints
    pub base_url: Option<String>,
}

/// Speech synthesis provider choice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TtsProvider {
    #[default]
    Google,
    OpenAi,
}

impl TtsProvider {
    /// Parse a provider name
    ///
    /// # Errors
    ///
    /// Returns error for unknown providers
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "openai" => Ok(Self::OpenAi),
            other => Err(Error::Config(format!("unknown TTS provider '{other}'"))),
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Default)]
pub struct TtsConfig {
    pub provider: TtsProvider,
    /// Model for providers that take one
    pub model: String,
    /// Fixed voice name, overriding gender-based choice
    pub voice: Option<String>,
    /// Preferences applied to users who have not saved their own
    pub defaults: VoicePreferences,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (completion, TTS)
    pub openai: Option<String>,

    /// Google Gemini API key (completion)
    pub gemini: Option<String>,

    /// Google Cloud API key (speech recognition, TTS)
    pub google_cloud: Option<String>,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port to listen on
    pub port: u16,
}

impl Config {
    /// Load configuration from environment and `config.toml`
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is invalid
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is invalid
    pub fn from_sources<F>(fc: BoloConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let recognition = Self::recognition_settings(&fc)?;

        // API keys (env > toml)
        let api_keys = ApiKeys {
            openai: non_empty("OPENAI_API_KEY").or(fc.api_keys.openai),
            gemini: non_empty("GEMINI_API_KEY").or(fc.api_keys.gemini),
            google_cloud: non_empty("GOOGLE_CLOUD_API_KEY").or(fc.api_keys.google_cloud),
        };

        // Completion provider (env > toml > default)
        let provider = non_empty("BOLO_LLM_PROVIDER")
            .or(fc.llm.provider)
            .map(|p| LlmProvider::parse(&p))
            .transpose()?
            .unwrap_or_default();
        let llm = LlmConfig {
            provider,
            model: non_empty("BOLO_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| provider.default_model().to_string()),
            base_url: non_empty("BOLO_LLM_BASE_URL").or(fc.llm.base_url),
        };

        let default_audio = AudioOptions::default();
        let audio = AudioOptions {
            encoding: fc.speech.encoding.unwrap_or(default_audio.encoding),
            sample_rate_hertz: fc
                .speech
                .sample_rate_hertz
                .unwrap_or(default_audio.sample_rate_hertz),
            ..default_audio
        };

        let tts = TtsConfig {
            provider: non_empty("BOLO_TTS_PROVIDER")
                .or(fc.tts.provider)
                .map(|p| TtsProvider::parse(&p))
                .transpose()?
                .unwrap_or_default(),
            model: fc.tts.model.unwrap_or_else(|| "tts-1".to_string()),
            voice: fc.tts.voice,
            defaults: VoicePreferences {
                voice_gender: fc
                    .tts
                    .voice_gender
                    .map(|g| {
                        VoiceGender::parse(&g)
                            .ok_or_else(|| Error::Config(format!("unknown voice gender '{g}'")))
                    })
                    .transpose()?
                    .unwrap_or_default(),
                speaking_rate: fc.tts.speaking_rate.unwrap_or(1.0),
                pitch: fc.tts.pitch.unwrap_or(0.0),
                ..VoicePreferences::default()
            }
            .clamped(),
        };

        let api_server = ApiServerConfig {
            port: non_empty("BOLO_PORT")
                .and_then(|p| p.parse().ok())
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
        };

        // Data directory (~/.local/share/bolo on Linux)
        let data_dir = non_empty("BOLO_DATA_DIR")
            .or(fc.server.data_dir)
            .map_or_else(
                || {
                    directories::BaseDirs::new()
                        .map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("bolo"))
                },
                PathBuf::from,
            );

        let responses = HashMap::from([
            (LanguageLabel::English, fc.responses.english),
            (LanguageLabel::Urdu, fc.responses.urdu),
        ]);

        let config = Self {
            data_dir,
            llm,
            recognition,
            audio,
            tts,
            api_keys,
            api_server,
            responses,
        };

        // Fail on bad template overrides at load time
        config.composer()?;

        Ok(config)
    }

    fn recognition_settings(fc: &BoloConfigFile) -> Result<RecognitionSettings> {
        let defaults = RecognitionSettings::default();

        let candidate_languages = match &fc.speech.candidate_languages {
            Some(codes) => <[String; 3]>::try_from(codes.clone()).map_err(|codes| {
                Error::Config(format!(
                    "speech.candidate_languages needs exactly 3 languages, got {}",
                    codes.len()
                ))
            })?,
            None => defaults.candidate_languages,
        };

        if candidate_languages.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::Config(
                "speech.candidate_languages contains an empty code".to_string(),
            ));
        }

        Ok(RecognitionSettings {
            primary_language: fc
                .speech
                .primary_language
                .clone()
                .unwrap_or(defaults.primary_language),
            alternative_languages: fc
                .speech
                .alternative_languages
                .clone()
                .unwrap_or(defaults.alternative_languages),
            candidate_languages,
            phrase_hints: fc
                .speech
                .phrase_hints
                .clone()
                .unwrap_or(defaults.phrase_hints),
        })
    }

    /// Path of the `SQLite` database
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("bolo.db")
    }

    /// Build the reply composer with any template overrides applied
    ///
    /// # Errors
    ///
    /// Returns error if an override key or template is invalid
    pub fn composer(&self) -> Result<ResponseComposer> {
        let table = |language: LanguageLabel| -> Result<TemplateTable> {
            let builtin = TemplateTable::builtin(language);
            match self.responses.get(&language) {
                Some(overrides) => builtin.with_overrides(overrides),
                None => Ok(builtin),
            }
        };

        Ok(ResponseComposer::new(
            table(LanguageLabel::English)?,
            table(LanguageLabel::Urdu)?,
        ))
    }
}
