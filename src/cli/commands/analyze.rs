//! Analyze command implementation.
//!
//! Runs the audio analysis adapter on a single file with a context built
//! from CLI flags, and prints the result as JSON. Handy for trying a clip
//! outside a full export run.

use std::path::Path;

use anyhow::Result;

use crate::analysis::{AnalysisResponse, Analyzer, AudioAnalyzer, GeminiClient};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::context::AnalysisContext;
use crate::error::FerdError;
use crate::export::Traveler;

/// Parse a `--traveler` flag value: `NAME` or `NAME:AGE`.
fn parse_traveler(value: &str) -> Result<Traveler, FerdError> {
    match value.rsplit_once(':') {
        Some((name, age)) if !name.is_empty() => {
            let age = age.parse::<u32>().map_err(|_| {
                FerdError::InvalidInput(format!(
                    "Invalid traveler '{value}': age must be a non-negative integer"
                ))
            })?;
            Ok(Traveler::with_age(name, age))
        }
        _ => Ok(Traveler::named(value)),
    }
}

/// Run the analyze command.
pub async fn run_analyze(
    audio_path: &str,
    travelers: &[String],
    location: Option<String>,
    story: Option<String>,
    recorded_at: Option<String>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Analyze) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let travelers = travelers
        .iter()
        .map(|t| parse_traveler(t))
        .collect::<Result<Vec<_>, _>>()?;

    let mut context = AnalysisContext::with_travelers(travelers);
    context.location = location;
    context.story_beat_context = story;
    context.recorded_at = recorded_at;

    let api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
    let client = GeminiClient::new(&api_key, &settings.analysis.model)?;
    let analyzer = AudioAnalyzer::new(client, &settings.analysis.audio_mime_type);

    Output::info(&format!("Analyzing {audio_path}"));
    let response = analyzer.analyze(Path::new(audio_path), &context).await?;

    match response {
        AnalysisResponse::Parsed { analysis, .. } => {
            Output::header("Analysis Result");
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        AnalysisResponse::Malformed {
            error,
            error_details,
            raw_response,
            ..
        } => {
            Output::error(&error);
            Output::kv("Details", &error_details);
            println!("\nRaw response:\n{raw_response}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_traveler_name_only() {
        let traveler = parse_traveler("Mom").unwrap();
        assert_eq!(traveler.name, "Mom");
        assert!(traveler.age.is_none());
    }

    #[test]
    fn test_parse_traveler_with_age() {
        let traveler = parse_traveler("Ellen:7").unwrap();
        assert_eq!(traveler.name, "Ellen");
        assert_eq!(traveler.age, Some(7));
    }

    #[test]
    fn test_parse_traveler_rejects_bad_age() {
        assert!(parse_traveler("Ellen:seven").is_err());
    }
}
