//! Error types for the Bolo gateway

use thiserror::Error;

/// Result type alias for Bolo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Bolo gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The completion provider could not be reached or returned an error
    #[error("completion failed: {0}")]
    CompletionFailed(String),

    /// The completion provider answered, but not with a usable intent object
    #[error("malformed completion output: {0}")]
    MalformedCompletionOutput(String),

    /// A single speech-to-text call failed
    #[error("STT call failed: {0}")]
    SttCallFailed(String),

    /// No candidate language produced a transcript
    #[error("recognition failed: {0}")]
    RecognitionFailed(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl Error {
    /// Build the recognition failure surfaced when every candidate language came back empty
    #[must_use]
    pub fn recognition_failed() -> Self {
        Self::RecognitionFailed(
            "could not recognize speech in any supported language; the audio may be too quiet, noisy, or unclear"
                .to_string(),
        )
    }

    /// Whether the pipeline absorbs this error instead of surfacing it
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::CompletionFailed(_) | Self::MalformedCompletionOutput(_) | Self::SttCallFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_kinds() {
        assert!(Error::CompletionFailed("timeout".into()).is_recoverable());
        assert!(Error::MalformedCompletionOutput("not json".into()).is_recoverable());
        assert!(Error::SttCallFailed("503".into()).is_recoverable());
        assert!(!Error::recognition_failed().is_recoverable());
        assert!(!Error::Config("bad".into()).is_recoverable());
    }

    #[test]
    fn test_recognition_failed_mentions_audio() {
        let message = Error::recognition_failed().to_string();
        assert!(message.starts_with("recognition failed"));
        assert!(message.contains("audio"));
    }
}
