//! Diarized transcription for Ferd.
//!
//! Sends one audio clip (plus optional per-traveler voice references) to the
//! diarizing transcription model and normalizes its segment list into
//! timestamped, speaker-attributed transcript entries.
//!
//! With voice references the model receives each traveler's name and sample
//! audio as "known speakers" and assigns real names to segments; without
//! them the speaker labels are whatever anonymous tags the model chooses.

mod diarize;

pub use diarize::DiarizedTranscriber;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::voice::VoiceReference;

/// One attributed utterance in a clip transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// "MM:SS" offset into the clip.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub speaker: String,
    #[serde(default)]
    pub text: String,
}

/// Raw segment shape returned by the diarizing model.
#[derive(Debug, Clone, Deserialize)]
pub struct DiarizedSegment {
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default)]
    pub text: String,
}

/// Result of transcribing one clip.
#[derive(Debug, Clone)]
pub struct TranscriptionResult {
    pub transcript: Vec<TranscriptEntry>,
    pub meta: TranscriptionMeta,
}

/// Side-channel metadata about one transcription call. Never persisted onto
/// the clip record.
#[derive(Debug, Clone)]
pub struct TranscriptionMeta {
    pub model: String,
    /// Names of the known speakers passed to the model.
    pub voice_references: Vec<String>,
    pub raw_response: serde_json::Value,
}

/// Trait for diarizing transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio clip, using the given voice references as known
    /// speakers when non-empty.
    async fn transcribe(
        &self,
        audio_path: &Path,
        voice_references: &[VoiceReference],
    ) -> Result<TranscriptionResult>;
}

/// Format seconds as an MM:SS timestamp (floor to whole seconds, minutes
/// unbounded).
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u64;
    let minutes = total_seconds / 60;
    let secs = total_seconds % 60;
    format!("{:02}:{:02}", minutes, secs)
}

/// Normalize model segments into transcript entries.
///
/// Text is trimmed and empty segments are dropped entirely; a missing
/// speaker label becomes "Unknown". Order is the model's segment order.
pub fn normalize_segments(segments: Vec<DiarizedSegment>) -> Vec<TranscriptEntry> {
    segments
        .into_iter()
        .filter_map(|segment| {
            let text = segment.text.trim();
            if text.is_empty() {
                return None;
            }

            Some(TranscriptEntry {
                timestamp: format_timestamp(segment.start),
                speaker: segment.speaker.unwrap_or_else(|| "Unknown".to_string()),
                text: text.to_string(),
            })
        })
        .collect()
}

/// MIME type for an audio file, by extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("webm") => "audio/webm",
        Some("mp3") => "audio/mpeg",
        Some("mp4") | Some("m4a") => "audio/mp4",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        _ => "audio/webm",
    }
}
