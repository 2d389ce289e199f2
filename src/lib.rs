//! Bolo Gateway - Urdu and English voice ordering gateway
//!
//! This library provides the core functionality for the Bolo gateway:
//! - Lexicon and script based language detection (Roman Urdu, Urdu, English)
//! - Intent extraction via an LLM completion, with keyword fallback
//! - Templated replies in the user's language
//! - Two-phase speech recognition across candidate languages
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   HTTP API / CLI                     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                    Assistant                         │
//! │  SpeechPipeline │ IntentExtractor │ ResponseComposer │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │               External engines                       │
//! │   Google STT/TTS  │  OpenAI  │  Gemini              │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod assistant;
pub mod config;
pub mod db;
pub mod error;
pub mod intent;
pub mod language;
pub mod llm;
pub mod response;
pub mod speech;

pub use assistant::{Assistant, TextTurn, VoiceTurn};
pub use config::Config;
pub use db::{DbConn, DbPool};
pub use error::{Error, Result};
pub use intent::{Confidence, Entities, Intent, IntentExtractor, IntentKind};
pub use language::{Detection, DetectionBasis, LanguageDetector, LanguageLabel, detect_language};
pub use llm::CompletionProvider;
pub use response::{ResponseComposer, TemplateTable, compose_response};
pub use speech::{
    AudioOptions, RecognitionAlternative, RecognitionConfig, SpeechPipeline, SpeechRecognizer,
    SpeechSynthesizer, Understanding, VoicePreferences,
};
