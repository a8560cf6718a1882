//! Multimodal audio analysis.
//!
//! Sends one audio clip plus a context-built prompt to the analysis model
//! and normalizes its free-text response into a stable schema. Model output
//! is assumed to be JSON, optionally wrapped in markdown fencing, and
//! occasionally malformed; a parse failure is data, not a program error.

mod gemini;
mod parse;
mod prompt;
mod summary;

pub use gemini::GeminiClient;
pub use parse::{extract_json_from_text, parse_analysis_response};
pub use prompt::{build_analysis_prompt, format_recorded_at, format_traveler};
pub use summary::{needs_summary, summarize_beats, summarize_story_beat, SHORT_TEXT_THRESHOLD};

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::context::AnalysisContext;
use crate::error::{FerdError, Result};
use crate::transcription::TranscriptEntry;

/// Broad classification of a clip's audio content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioType {
    Speech,
    Ambient,
    Mixed,
    Music,
    Silent,
    /// Anything the model returned outside the expected set.
    #[serde(other)]
    #[default]
    Unknown,
}

impl std::fmt::Display for AudioType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AudioType::Speech => "speech",
            AudioType::Ambient => "ambient",
            AudioType::Mixed => "mixed",
            AudioType::Music => "music",
            AudioType::Silent => "silent",
            AudioType::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// A non-speech sound event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioEvent {
    /// "MM:SS" offset into the clip.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub event: String,
}

/// The annotation persisted on a clip: always exactly these five fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClipAnalysis {
    #[serde(default)]
    pub audio_type: AudioType,
    #[serde(default)]
    pub transcript: Vec<TranscriptEntry>,
    #[serde(default)]
    pub audio_events: Vec<AudioEvent>,
    #[serde(default)]
    pub scene_description: String,
    #[serde(default)]
    pub emotional_tone: String,
}

/// Side-channel run metadata attached to every analysis response.
///
/// Useful for debugging a run; the merge step must never copy it into the
/// persisted clip record.
#[derive(Debug, Clone)]
pub struct AnalysisMeta {
    pub prompt: String,
    pub context: AnalysisContext,
    pub raw_response: Option<String>,
}

/// Outcome of one analysis call.
///
/// `Malformed` is the recoverable "model spoke, we could not parse it"
/// variant; hard failures (missing file, transport errors) surface as
/// `Err` from [`Analyzer::analyze`] instead.
#[derive(Debug, Clone)]
pub enum AnalysisResponse {
    Parsed {
        analysis: ClipAnalysis,
        meta: AnalysisMeta,
    },
    Malformed {
        error: String,
        error_details: String,
        raw_response: String,
        meta: AnalysisMeta,
    },
}

/// Trait for audio analysis services.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyze one audio clip against its context.
    ///
    /// A missing audio file is a hard error: it signals a structurally
    /// broken export, not a model hiccup. Unparseable model output is not:
    /// it comes back as [`AnalysisResponse::Malformed`].
    async fn analyze(
        &self,
        audio_path: &Path,
        context: &AnalysisContext,
    ) -> Result<AnalysisResponse>;
}

/// Audio analysis adapter over the multimodal model.
pub struct AudioAnalyzer {
    client: GeminiClient,
    mime_type: String,
}

impl AudioAnalyzer {
    pub fn new(client: GeminiClient, mime_type: &str) -> Self {
        Self {
            client,
            mime_type: mime_type.to_string(),
        }
    }
}

#[async_trait]
impl Analyzer for AudioAnalyzer {
    #[instrument(skip(self, context), fields(audio_path = %audio_path.display()))]
    async fn analyze(
        &self,
        audio_path: &Path,
        context: &AnalysisContext,
    ) -> Result<AnalysisResponse> {
        if !audio_path.exists() {
            return Err(FerdError::AudioNotFound(audio_path.display().to_string()));
        }

        let prompt = build_analysis_prompt(context)?;

        let audio_bytes = tokio::fs::read(audio_path).await?;
        let audio_b64 = base64::engine::general_purpose::STANDARD.encode(&audio_bytes);
        debug!("Sending {} bytes of audio for analysis", audio_bytes.len());

        let response_text = self
            .client
            .generate_with_audio(&prompt, &self.mime_type, &audio_b64)
            .await?;

        Ok(parse_analysis_response(
            response_text,
            prompt,
            context.clone(),
        ))
    }
}
