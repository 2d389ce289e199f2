//! Voice API endpoints for language detection, intents, recognition, and speech

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::Error;
use crate::assistant::{TextTurn, VoiceTurn};
use crate::db::Interaction;
use crate::intent::Intent;
use crate::language::{Detection, LanguageLabel};
use crate::speech::{AudioOptions, VoicePreferences};

/// Largest accepted audio upload
const MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;

const DEFAULT_HISTORY_LIMIT: usize = 20;
const MAX_HISTORY_LIMIT: usize = 100;

/// Build voice router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/detect-language", post(detect_language))
        .route("/intent", post(extract_intent))
        .route("/process-text", post(process_text))
        .route(
            "/recognize",
            post(recognize).layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES)),
        )
        .route("/synthesize", post(synthesize))
        .route(
            "/preferences/{user_id}",
            get(get_preferences).put(put_preferences),
        )
        .route("/history/{user_id}", get(history))
        .route("/languages", get(languages))
        .with_state(state)
}

/// Request carrying an utterance
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
    /// Record the turn in this user's history
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Detect the language of a text
async fn detect_language(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<TextRequest>,
) -> Json<Detection> {
    Json(state.assistant.extractor().detector().analyze(&request.text))
}

/// Intent request
#[derive(Debug, Deserialize)]
pub struct IntentRequest {
    pub text: String,
    /// Language hint, or `auto`
    #[serde(default)]
    pub language: Option<String>,
}

/// Classify a text into an intent
async fn extract_intent(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<IntentRequest>,
) -> Result<Json<Intent>, VoiceError> {
    if request.text.trim().is_empty() {
        return Err(VoiceError::BadRequest("Empty text"));
    }

    let hint = request.language.as_deref().unwrap_or("auto");
    let intent = state.assistant.extractor().extract(&request.text, hint).await;
    Ok(Json(intent))
}

/// Understand a typed utterance and compose a reply
async fn process_text(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<TextRequest>,
) -> Result<Json<TextTurn>, VoiceError> {
    if request.text.trim().is_empty() {
        return Err(VoiceError::BadRequest("Empty text"));
    }

    let turn = state
        .assistant
        .process_text(&request.text, request.user_id.as_deref())
        .await;
    Ok(Json(turn))
}

/// Query parameters describing uploaded audio
#[derive(Debug, Default, Deserialize)]
pub struct RecognizeQuery {
    pub encoding: Option<String>,
    pub sample_rate_hertz: Option<u32>,
    /// Language code to try first, or `auto`
    pub language: Option<String>,
    pub enable_auto_detection: Option<bool>,
    pub user_id: Option<String>,
    /// Also synthesize the reply
    #[serde(default)]
    pub speak: bool,
}

impl RecognizeQuery {
    fn audio_options(&self, defaults: &AudioOptions) -> AudioOptions {
        AudioOptions {
            encoding: self
                .encoding
                .clone()
                .unwrap_or_else(|| defaults.encoding.clone()),
            sample_rate_hertz: self.sample_rate_hertz.unwrap_or(defaults.sample_rate_hertz),
            language: self
                .language
                .clone()
                .unwrap_or_else(|| defaults.language.clone()),
            enable_auto_detection: self
                .enable_auto_detection
                .unwrap_or(defaults.enable_auto_detection),
        }
    }
}

/// Recognition response
#[derive(Debug, Serialize)]
pub struct RecognizeResponse {
    #[serde(flatten)]
    pub turn: VoiceTurn,
    /// Base64-encoded MP3 of the spoken reply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_content: Option<String>,
}

/// Recognize speech and reply
///
/// Accepts raw audio bytes; the encoding and sample rate come from the query
/// string, falling back to configured defaults.
async fn recognize(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<RecognizeQuery>,
    body: Bytes,
) -> Result<Json<RecognizeResponse>, VoiceError> {
    if body.is_empty() {
        return Err(VoiceError::BadRequest("Empty audio data"));
    }

    let options = query.audio_options(state.assistant.default_audio());
    let turn = state
        .assistant
        .process_voice(&body, &options, query.user_id.as_deref(), query.speak)
        .await?;

    let audio_content = turn
        .audio
        .as_ref()
        .map(|audio| base64::engine::general_purpose::STANDARD.encode(audio));

    Ok(Json(RecognizeResponse {
        turn,
        audio_content,
    }))
}

/// Synthesis request
#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub text: String,
    /// Language the text is in, or `auto`
    #[serde(default)]
    pub language: Option<String>,
    /// Use this user's voice preferences
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Synthesize text to speech
///
/// Returns audio in MP3 format
async fn synthesize(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SynthesizeRequest>,
) -> Result<Response, VoiceError> {
    if request.text.trim().is_empty() {
        return Err(VoiceError::BadRequest("Empty text"));
    }

    let language = request.language.as_deref().and_then(LanguageLabel::parse);
    let audio = state
        .assistant
        .synthesize(&request.text, language, request.user_id.as_deref())
        .await?;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}

/// Get a user's voice preferences
async fn get_preferences(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<String>,
) -> Result<Json<VoicePreferences>, VoiceError> {
    Ok(Json(state.assistant.preferences(&user_id)?))
}

/// Replace a user's voice preferences
async fn put_preferences(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<String>,
    Json(preferences): Json<VoicePreferences>,
) -> Result<Json<VoicePreferences>, VoiceError> {
    let saved = state.assistant.save_preferences(&user_id, preferences)?;
    tracing::info!(user_id = %user_id, "voice preferences updated");
    Ok(Json(saved))
}

/// History query parameters
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// History response
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub user_id: String,
    pub interactions: Vec<Interaction>,
}

/// List a user's recent turns, newest first
async fn history(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, VoiceError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let interactions = state.assistant.history(&user_id, limit)?;

    Ok(Json(HistoryResponse {
        user_id,
        interactions,
    }))
}

/// One recognition language
#[derive(Debug, Serialize)]
pub struct LanguageInfo {
    pub code: String,
    pub language: LanguageLabel,
}

/// Supported languages response
#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    /// Labels the detector assigns
    pub labels: Vec<LanguageLabel>,
    /// Languages tried one by one when the first pass fails
    pub candidates: Vec<LanguageInfo>,
    /// Language of the first, multi-language pass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    pub recognition_available: bool,
    pub synthesis_available: bool,
}

/// List supported languages
async fn languages(State(state): State<Arc<ApiState>>) -> Json<LanguagesResponse> {
    let settings = state.assistant.recognition_settings();

    let candidates = settings
        .map(|s| {
            s.candidate_languages
                .iter()
                .map(|code| LanguageInfo {
                    code: code.clone(),
                    language: LanguageLabel::from_code(code),
                })
                .collect()
        })
        .unwrap_or_default();

    Json(LanguagesResponse {
        labels: vec![LanguageLabel::Urdu, LanguageLabel::English],
        candidates,
        primary: settings.map(|s| s.primary_language.clone()),
        recognition_available: state.assistant.can_recognize(),
        synthesis_available: state.assistant.can_synthesize(),
    })
}

/// Voice API errors
#[derive(Debug)]
pub enum VoiceError {
    NotConfigured(String),
    BadRequest(&'static str),
    RecognitionFailed,
    SynthesisFailed(String),
    Internal(String),
}

impl From<Error> for VoiceError {
    fn from(error: Error) -> Self {
        match error {
            Error::Config(msg) => Self::NotConfigured(msg),
            Error::RecognitionFailed(_) => Self::RecognitionFailed,
            Error::Tts(msg) => Self::SynthesisFailed(msg),
            other => {
                tracing::error!(error = %other, "voice request failed");
                Self::Internal(other.to_string())
            }
        }
    }
}

impl IntoResponse for VoiceError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::NotConfigured(msg) => (StatusCode::SERVICE_UNAVAILABLE, "not_configured", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.to_string()),
            Self::RecognitionFailed => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "recognition_failed",
                "could not understand audio, please try again".to_string(),
            ),
            Self::SynthesisFailed(msg) => (StatusCode::BAD_GATEWAY, "synthesis_failed", msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_overrides_defaults() {
        let query = RecognizeQuery {
            encoding: Some("LINEAR16".to_string()),
            sample_rate_hertz: Some(16_000),
            ..RecognizeQuery::default()
        };
        let options = query.audio_options(&AudioOptions::default());
        assert_eq!(options.encoding, "LINEAR16");
        assert_eq!(options.sample_rate_hertz, 16_000);
        assert_eq!(options.language, "auto");
        assert!(options.enable_auto_detection);
    }

    #[test]
    fn test_error_status_codes() {
        let status = |e: Error| VoiceError::from(e).into_response().status();
        assert_eq!(
            status(Error::recognition_failed()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(Error::Config("no key".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status(Error::Database("locked".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
