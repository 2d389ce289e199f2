//! TOML configuration file loading
//!
//! Supports `~/.config/bolo/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct BoloConfigFile {
    /// Completion provider configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Speech recognition configuration
    #[serde(default)]
    pub speech: SpeechFileConfig,

    /// Speech synthesis configuration
    #[serde(default)]
    pub tts: TtsFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Reply template overrides
    #[serde(default)]
    pub responses: ResponsesFileConfig,
}

/// Completion provider configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Provider ("openai", "openrouter", "gemini")
    pub provider: Option<String>,

    /// Model identifier (e.g. "gpt-4o-mini")
    pub model: Option<String>,

    /// Base URL for OpenAI-compatible endpoints
    pub base_url: Option<String>,
}

/// Speech recognition configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// Default audio encoding (e.g. "WEBM_OPUS")
    pub encoding: Option<String>,

    /// Default sample rate
    pub sample_rate_hertz: Option<u32>,

    /// Primary language of the multi-language pass
    pub primary_language: Option<String>,

    /// Alternatives offered in the multi-language pass
    pub alternative_languages: Option<Vec<String>>,

    /// Exactly three languages tried one by one
    pub candidate_languages: Option<Vec<String>>,

    /// Domain phrases to boost
    pub phrase_hints: Option<Vec<String>>,
}

/// Speech synthesis configuration
#[derive(Debug, Default, Deserialize)]
pub struct TtsFileConfig {
    /// Provider ("google" or "openai")
    pub provider: Option<String>,

    /// Model for providers that take one (e.g. "tts-1")
    pub model: Option<String>,

    /// Fixed voice name, overriding gender-based choice
    pub voice: Option<String>,

    /// Default voice gender ("male", "female", "neutral")
    pub voice_gender: Option<String>,

    /// Default speaking rate
    pub speaking_rate: Option<f64>,

    /// Default pitch
    pub pitch: Option<f64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub gemini: Option<String>,
    pub google_cloud: Option<String>,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Data directory (database)
    pub data_dir: Option<String>,
}

/// Reply template overrides, keyed by intent name or "default"
#[derive(Debug, Default, Deserialize)]
pub struct ResponsesFileConfig {
    #[serde(default)]
    pub english: HashMap<String, String>,

    #[serde(default, alias = "regional")]
    pub urdu: HashMap<String, String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `BoloConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> BoloConfigFile {
    let Some(path) = config_file_path() else {
        return BoloConfigFile::default();
    };

    if !path.exists() {
        return BoloConfigFile::default();
    }

    match read_config_file(&path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            BoloConfigFile::default()
        }
    }
}

/// Read and parse a config file at `path`
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML
pub fn read_config_file(path: &Path) -> Result<BoloConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Return the config file path: `~/.config/bolo/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("bolo").join("config.toml"))
}
