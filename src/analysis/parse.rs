//! Model response parsing.
//!
//! The analysis model is asked for bare JSON but routinely wraps it in
//! markdown fencing or surrounds it with prose. Extraction order: fenced
//! block with a `json` tag, fenced block without a tag, raw text. Whatever
//! survives extraction is parsed; a parse failure becomes the malformed
//! response variant, never an error.

use std::sync::OnceLock;

use regex::Regex;

use super::{AnalysisMeta, AnalysisResponse, ClipAnalysis};
use crate::context::AnalysisContext;

/// Error message recorded when the model's output is not valid JSON.
pub const PARSE_ERROR_MESSAGE: &str = "Failed to parse JSON response";

/// Matches ```json ... ``` or ``` ... ``` anywhere in the text.
fn code_block_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("Invalid regex"))
}

/// Extract JSON content from text that may be wrapped in markdown fencing.
///
/// Returns the inner content of the first fenced block, trimmed; without a
/// fence the trimmed text comes back as-is (it may already be plain JSON).
pub fn extract_json_from_text(text: &str) -> String {
    let text = text.trim();

    if let Some(captures) = code_block_regex().captures(text) {
        return captures[1].trim().to_string();
    }

    text.to_string()
}

/// Normalize one model response into an [`AnalysisResponse`].
///
/// A `None` or empty response text is treated the same as unparseable
/// output: the malformed variant, carrying whatever raw text there was.
pub fn parse_analysis_response(
    response_text: Option<String>,
    prompt: String,
    context: AnalysisContext,
) -> AnalysisResponse {
    let raw = response_text.unwrap_or_default();
    let json_text = extract_json_from_text(&raw);

    match serde_json::from_str::<ClipAnalysis>(&json_text) {
        Ok(analysis) => AnalysisResponse::Parsed {
            analysis,
            meta: AnalysisMeta {
                prompt,
                context,
                raw_response: Some(raw),
            },
        },
        Err(e) => AnalysisResponse::Malformed {
            error: PARSE_ERROR_MESSAGE.to_string(),
            error_details: e.to_string(),
            raw_response: raw.clone(),
            meta: AnalysisMeta {
                prompt,
                context,
                raw_response: Some(raw),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AudioType;

    fn parse(raw: &str) -> AnalysisResponse {
        parse_analysis_response(
            Some(raw.to_string()),
            "prompt".to_string(),
            AnalysisContext::with_travelers(vec![]),
        )
    }

    #[test]
    fn test_extract_plain_json() {
        assert_eq!(extract_json_from_text(r#"{"a": 1}"#), r#"{"a": 1}"#);
    }

    #[test]
    fn test_extract_fenced_with_tag() {
        let text = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json_from_text(text), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_fenced_without_tag() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json_from_text(text), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_fence_surrounded_by_prose() {
        let text = "Here is the analysis:\n\n```json\n{\"a\": 1}\n```\n\nHope that helps!";
        assert_eq!(extract_json_from_text(text), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_empty_text() {
        assert_eq!(extract_json_from_text(""), "");
    }

    #[test]
    fn test_parse_valid_response() {
        let response = parse(
            r#"{"audioType": "speech",
                "transcript": [{"timestamp": "00:00", "speaker": "Dad", "text": "How is it, girls?"}],
                "audioEvents": [],
                "sceneDescription": "A waterfall visit",
                "emotionalTone": "excited"}"#,
        );

        match response {
            AnalysisResponse::Parsed { analysis, meta } => {
                assert_eq!(analysis.audio_type, AudioType::Speech);
                assert_eq!(analysis.transcript.len(), 1);
                assert_eq!(analysis.transcript[0].speaker, "Dad");
                assert!(meta.raw_response.is_some());
            }
            AnalysisResponse::Malformed { error, .. } => panic!("unexpected parse failure: {error}"),
        }
    }

    #[test]
    fn test_parse_fenced_response() {
        let response = parse("```json\n{\"audioType\": \"ambient\"}\n```");
        match response {
            AnalysisResponse::Parsed { analysis, .. } => {
                assert_eq!(analysis.audio_type, AudioType::Ambient);
                assert!(analysis.transcript.is_empty());
            }
            AnalysisResponse::Malformed { .. } => panic!("fenced JSON should parse"),
        }
    }

    #[test]
    fn test_parse_unexpected_audio_type_maps_to_unknown() {
        let response = parse(r#"{"audioType": "birdsong"}"#);
        match response {
            AnalysisResponse::Parsed { analysis, .. } => {
                assert_eq!(analysis.audio_type, AudioType::Unknown);
            }
            AnalysisResponse::Malformed { .. } => panic!("should parse"),
        }
    }

    #[test]
    fn test_parse_malformed_response() {
        let raw = "This is not valid JSON { broken }";
        let response = parse(raw);

        match response {
            AnalysisResponse::Malformed {
                error,
                error_details,
                raw_response,
                ..
            } => {
                assert_eq!(error, PARSE_ERROR_MESSAGE);
                assert!(!error_details.is_empty());
                assert_eq!(raw_response, raw);
            }
            AnalysisResponse::Parsed { .. } => panic!("malformed input should not parse"),
        }
    }

    #[test]
    fn test_parse_none_response() {
        let response = parse_analysis_response(
            None,
            "prompt".to_string(),
            AnalysisContext::with_travelers(vec![]),
        );

        match response {
            AnalysisResponse::Malformed {
                error, raw_response, ..
            } => {
                assert_eq!(error, PARSE_ERROR_MESSAGE);
                assert!(raw_response.is_empty());
            }
            AnalysisResponse::Parsed { .. } => panic!("empty response should not parse"),
        }
    }
}
