//! Shared test utilities

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bolo_gateway::speech::{
    RecognitionAlternative, RecognitionConfig, SpeechRecognizer, SpeechSynthesizer,
    VoicePreferences,
};
use bolo_gateway::{CompletionProvider, DbPool, Error, IntentExtractor, LanguageDetector, Result, db};

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// What a scripted recognizer answers for one call
#[derive(Debug, Clone)]
pub enum Heard {
    /// One alternative with this transcript and confidence
    Text(&'static str, f32),
    /// As `Text`, with the language code the engine reports
    TextIn(&'static str, f32, &'static str),
    /// No results
    Silence,
    /// The engine call fails
    Fail,
}

/// Recognizer answering from a script and recording every call
///
/// Calls with auto-detection enabled get the multi-language answer; all
/// others are looked up by language code and default to silence.
pub struct ScriptedRecognizer {
    multi_language: Heard,
    per_language: HashMap<String, Heard>,
    calls: Mutex<Vec<RecognitionConfig>>,
}

impl ScriptedRecognizer {
    #[must_use]
    pub fn new(multi_language: Heard) -> Self {
        Self {
            multi_language,
            per_language: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn language(mut self, code: &str, heard: Heard) -> Self {
        self.per_language.insert(code.to_string(), heard);
        self
    }

    /// Configs of every call made so far, in order
    pub fn calls(&self) -> Vec<RecognitionConfig> {
        self.calls.lock().unwrap().clone()
    }

    /// Language codes of the single-language calls, in order
    pub fn single_language_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.enable_auto_detection)
            .map(|c| c.language_code)
            .collect()
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn recognize(
        &self,
        _audio: &[u8],
        config: &RecognitionConfig,
    ) -> Result<Vec<RecognitionAlternative>> {
        self.calls.lock().unwrap().push(config.clone());

        let heard = if config.enable_auto_detection {
            self.multi_language.clone()
        } else {
            self.per_language
                .get(&config.language_code)
                .cloned()
                .unwrap_or(Heard::Silence)
        };

        match heard {
            Heard::Text(transcript, confidence) => Ok(vec![RecognitionAlternative {
                transcript: transcript.to_string(),
                confidence,
                language_code: None,
            }]),
            Heard::TextIn(transcript, confidence, code) => Ok(vec![RecognitionAlternative {
                transcript: transcript.to_string(),
                confidence,
                language_code: Some(code.to_string()),
            }]),
            Heard::Silence => Ok(Vec::new()),
            Heard::Fail => Err(Error::SttCallFailed("scripted failure".to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Completion provider with a fixed answer that records prompts
pub struct ScriptedCompletion {
    reply: std::result::Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    #[must_use]
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(Error::CompletionFailed)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Synthesizer returning the text bytes and recording the language used
#[derive(Default)]
pub struct EchoSynthesizer {
    pub requests: Mutex<Vec<(String, VoicePreferences)>>,
}

#[async_trait]
impl SpeechSynthesizer for EchoSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        language_code: &str,
        voice: &VoicePreferences,
    ) -> Result<Vec<u8>> {
        self.requests
            .lock()
            .unwrap()
            .push((language_code.to_string(), voice.clone()));
        Ok(text.as_bytes().to_vec())
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}

/// Extractor that only uses keyword rules
#[must_use]
pub fn offline_extractor() -> IntentExtractor {
    IntentExtractor::offline(Arc::new(LanguageDetector::default()))
}

/// Extractor backed by `completion`
#[must_use]
pub fn extractor_with(completion: Arc<ScriptedCompletion>) -> IntentExtractor {
    IntentExtractor::new(completion, Arc::new(LanguageDetector::default()))
}
