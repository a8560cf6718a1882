//! OpenAI diarized transcription implementation.

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{
    mime_type_for, normalize_segments, DiarizedSegment, Transcriber, TranscriptionMeta,
    TranscriptionResult,
};
use crate::error::{FerdError, Result};
use crate::http::create_client;
use crate::voice::VoiceReference;

const TRANSCRIPTIONS_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Diarizing transcriber backed by the OpenAI transcription endpoint.
pub struct DiarizedTranscriber {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct DiarizedResponse {
    #[serde(default)]
    segments: Vec<DiarizedSegment>,
}

impl DiarizedTranscriber {
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        Ok(Self {
            http_client: create_client()?,
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Encode a voice-reference file as a base64 data URL.
    fn encode_audio_as_data_url(path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(format!("data:{};base64,{}", mime_type_for(path), encoded))
    }

    fn build_form(
        &self,
        audio_path: &Path,
        audio_bytes: Vec<u8>,
        voice_references: &[VoiceReference],
    ) -> Result<Form> {
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.webm")
            .to_string();

        let file_part = Part::bytes(audio_bytes)
            .file_name(file_name)
            .mime_str(mime_type_for(audio_path))
            .map_err(|e| FerdError::Transcription(format!("Failed to build request: {e}")))?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "diarized_json")
            .text("chunking_strategy", "auto");

        for reference in voice_references {
            let data_url = Self::encode_audio_as_data_url(&reference.file_path)?;
            form = form
                .text("known_speaker_names[]", reference.traveler.name.clone())
                .text("known_speaker_references[]", data_url);
        }

        Ok(form)
    }
}

#[async_trait]
impl Transcriber for DiarizedTranscriber {
    #[instrument(skip(self, voice_references), fields(audio_path = %audio_path.display()))]
    async fn transcribe(
        &self,
        audio_path: &Path,
        voice_references: &[VoiceReference],
    ) -> Result<TranscriptionResult> {
        let speaker_names: Vec<String> = voice_references
            .iter()
            .map(|r| r.traveler.name.clone())
            .collect();

        if speaker_names.is_empty() {
            info!("Transcribing without voice references (anonymous speaker labels)");
        } else {
            info!(
                "Transcribing with {} voice references: {:?}",
                speaker_names.len(),
                speaker_names
            );
        }

        let audio_bytes = tokio::fs::read(audio_path).await?;
        let form = self.build_form(audio_path, audio_bytes, voice_references)?;

        let response = self
            .http_client
            .post(TRANSCRIPTIONS_URL)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FerdError::Transcription(format!(
                "Transcription API returned {}: {}",
                status,
                body.chars().take(500).collect::<String>()
            )));
        }

        let raw_response: serde_json::Value = response.json().await?;
        let parsed: DiarizedResponse = serde_json::from_value(raw_response.clone())?;

        let transcript = normalize_segments(parsed.segments);
        debug!("Transcribed {} utterances", transcript.len());

        Ok(TranscriptionResult {
            transcript,
            meta: TranscriptionMeta {
                model: self.model.clone(),
                voice_references: speaker_names,
                raw_response,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_data_url_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ellen.webm");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"abc").unwrap();

        let url = DiarizedTranscriber::encode_audio_as_data_url(&path).unwrap();
        assert_eq!(url, "data:audio/webm;base64,YWJj");
    }

    #[test]
    fn test_response_parsing() {
        let raw: DiarizedResponse = serde_json::from_str(
            r#"{"segments": [
                {"start": 1.2, "speaker": "Ellen", "text": " Wow! "},
                {"start": 3.0, "text": ""}
            ], "task": "transcribe"}"#,
        )
        .unwrap();

        let transcript = normalize_segments(raw.segments);
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].timestamp, "00:01");
        assert_eq!(transcript[0].speaker, "Ellen");
        assert_eq!(transcript[0].text, "Wow!");
    }
}
