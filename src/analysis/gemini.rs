//! Gemini API client.
//!
//! Thin wrapper over the `generateContent` endpoint. Audio payloads travel
//! inline as base64 parts next to the prompt text.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FerdError, Result};
use crate::http::create_client;

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Client for the multimodal analysis model.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: Blob },
}

#[derive(Serialize)]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        Ok(Self {
            http_client: create_client()?,
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Generate from a text-only prompt.
    ///
    /// Returns `None` when the model produced no text; callers decide
    /// whether that is an error or a fallback case.
    pub async fn generate_text(&self, prompt: &str) -> Result<Option<String>> {
        self.generate(vec![Part::Text {
            text: prompt.to_string(),
        }])
        .await
    }

    /// Generate from an inline audio payload plus a prompt.
    pub async fn generate_with_audio(
        &self,
        prompt: &str,
        mime_type: &str,
        audio_b64: &str,
    ) -> Result<Option<String>> {
        self.generate(vec![
            Part::InlineData {
                inline_data: Blob {
                    mime_type: mime_type.to_string(),
                    data: audio_b64.to_string(),
                },
            },
            Part::Text {
                text: prompt.to_string(),
            },
        ])
        .await
    }

    async fn generate(&self, parts: Vec<Part>) -> Result<Option<String>> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            API_BASE_URL, self.model, self.api_key
        );

        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
        };

        let response = self.http_client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FerdError::Analysis(format!(
                "Model API returned {}: {}",
                status,
                body.chars().take(500).collect::<String>()
            )));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = collect_text(&parsed);
        debug!(
            "Model responded with {} chars of text",
            text.as_deref().map(str::len).unwrap_or(0)
        );
        Ok(text)
    }
}

/// Concatenate the text parts of the first candidate, if any.
fn collect_text(response: &GenerateContentResponse) -> Option<String> {
    let content = response.candidates.first()?.content.as_ref()?;
    let text: String = content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
