//! Analysis prompt assembly.
//!
//! Builds the natural-language instruction the analysis model receives
//! alongside each audio clip: traveler roster, location, story-beat text,
//! and a human-readable recording time, followed by the exact JSON shape
//! the model must respond with.

use chrono::{DateTime, NaiveDateTime};

use crate::context::AnalysisContext;
use crate::error::{FerdError, Result};
use crate::export::Traveler;

/// Format a traveler for prompt display: `"Ellen (age 7)"` or `"Mom"`.
///
/// Age 0 is a present value and is rendered; only a missing age suppresses
/// the suffix.
pub fn format_traveler(traveler: &Traveler) -> String {
    match traveler.age {
        Some(age) => format!("{} (age {})", traveler.name, age),
        None => traveler.name.clone(),
    }
}

/// Render an ISO-8601 timestamp as `"December 28, 2024, 02:34 PM"`.
///
/// Exports normally carry an offset (`...Z`), but naive timestamps have
/// been seen in the wild and are accepted as-is.
pub fn format_recorded_at(recorded_at: &str) -> Result<String> {
    const DISPLAY_FORMAT: &str = "%B %d, %Y, %I:%M %p";

    if let Ok(parsed) = DateTime::parse_from_rfc3339(recorded_at) {
        return Ok(parsed.format(DISPLAY_FORMAT).to_string());
    }

    recorded_at
        .parse::<NaiveDateTime>()
        .map(|parsed| parsed.format(DISPLAY_FORMAT).to_string())
        .map_err(|e| {
            FerdError::InvalidInput(format!("Invalid recordedAt timestamp '{recorded_at}': {e}"))
        })
}

/// Build the full analysis prompt for one clip.
pub fn build_analysis_prompt(context: &AnalysisContext) -> Result<String> {
    let mut prompt = String::from("Analyze this audio clip recorded during a family trip.\n\n");

    let has_context = !context.travelers.is_empty()
        || context.location.is_some()
        || context.story_beat_context.is_some()
        || context.recorded_at.is_some();

    if has_context {
        prompt.push_str("CONTEXT:\n");

        if !context.travelers.is_empty() {
            let travelers: Vec<String> = context.travelers.iter().map(format_traveler).collect();
            prompt.push_str(&format!("- Travelers: {}\n", travelers.join(", ")));
        }

        if let Some(location) = &context.location {
            prompt.push_str(&format!("- Location: {location}\n"));
        }

        if let Some(story) = &context.story_beat_context {
            prompt.push_str(&format!(
                "- This was recorded as a reaction to a story about: \"{story}\"\n"
            ));
            if context.story_beat_starred == Some(true) {
                prompt.push_str("- This story beat was starred as a favorite by the family.\n");
            }
        }

        if let Some(recorded_at) = &context.recorded_at {
            let formatted = format_recorded_at(recorded_at)?;
            prompt.push_str(&format!("- Recorded at: {formatted}\n"));
        }

        prompt.push_str("\nGiven this context, analyze the audio.\n\n");
    }

    prompt.push_str(
        r#"Analyze the audio and respond with JSON in this exact format:

{
  "audioType": "speech|ambient|mixed|music|silent",
  "transcript": [
    {
      "timestamp": "00:00",
      "speaker": "Dad",
      "text": "How is it, girls?"
    }
  ],
  "audioEvents": [
    {
      "timestamp": "00:01",
      "event": "rushing water from waterfall"
    }
  ],
  "sceneDescription": "Brief description of the overall scene",
  "emotionalTone": "excited|happy|calm|curious|frustrated|etc."
}

IMPORTANT:
- audioType: Choose one of: speech, ambient, mixed, music, silent
- transcript: Array of dialogue with timestamps. "#,
    );

    if !context.travelers.is_empty() {
        prompt.push_str(
            "Use actual traveler names if you can identify them (e.g., 'Ellen' instead of 'Child'). ",
        );
    }

    prompt.push_str(
        r#"If unsure, use 'Child', 'Adult Female', or 'Adult Male'.
- audioEvents: Non-speech sounds (background noise, ambient sounds, etc.)
- sceneDescription: 1-2 sentences describing what's happening
- emotionalTone: Overall mood/feeling of the clip

Respond ONLY with valid JSON, no additional text."#,
    );

    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_traveler_with_age() {
        assert_eq!(format_traveler(&Traveler::with_age("Ellen", 7)), "Ellen (age 7)");
    }

    #[test]
    fn test_format_traveler_age_zero() {
        assert_eq!(format_traveler(&Traveler::with_age("Baby", 0)), "Baby (age 0)");
    }

    #[test]
    fn test_format_traveler_without_age() {
        assert_eq!(format_traveler(&Traveler::named("Mom")), "Mom");
    }

    #[test]
    fn test_format_recorded_at() {
        let formatted = format_recorded_at("2024-12-28T14:34:22Z").unwrap();
        assert_eq!(formatted, "December 28, 2024, 02:34 PM");
    }

    #[test]
    fn test_format_recorded_at_naive_timestamp() {
        let formatted = format_recorded_at("2024-12-28T14:34:22").unwrap();
        assert_eq!(formatted, "December 28, 2024, 02:34 PM");
    }

    #[test]
    fn test_format_recorded_at_invalid() {
        assert!(format_recorded_at("yesterday-ish").is_err());
    }

    #[test]
    fn test_prompt_names_without_age_suffix() {
        let context = AnalysisContext::with_travelers(vec![Traveler::named("Mom")]);
        let prompt = build_analysis_prompt(&context).unwrap();

        assert!(prompt.contains("Mom"));
        assert!(!prompt.contains("Mom (age"));
        // Known travelers switch on the name-identification instruction.
        assert!(prompt.contains("actual traveler names"));
    }

    #[test]
    fn test_prompt_includes_context_lines() {
        let mut context = AnalysisContext::with_travelers(vec![Traveler::with_age("Ellen", 7)]);
        context.location = Some("La Mina Falls, El Yunque".to_string());
        context.story_beat_context = Some("Princess Louise-Hippolyte".to_string());
        context.story_beat_starred = Some(true);
        context.recorded_at = Some("2024-12-28T14:34:22Z".to_string());

        let prompt = build_analysis_prompt(&context).unwrap();

        assert!(prompt.contains("- Travelers: Ellen (age 7)"));
        assert!(prompt.contains("- Location: La Mina Falls, El Yunque"));
        assert!(prompt.contains("reaction to a story about: \"Princess Louise-Hippolyte\""));
        assert!(prompt.contains("starred as a favorite"));
        assert!(prompt.contains("- Recorded at: December 28, 2024, 02:34 PM"));
    }

    #[test]
    fn test_prompt_without_context_skips_context_block() {
        let context = AnalysisContext::with_travelers(vec![]);
        let prompt = build_analysis_prompt(&context).unwrap();

        assert!(!prompt.contains("CONTEXT:"));
        assert!(!prompt.contains("actual traveler names"));
        assert!(prompt.contains("Respond ONLY with valid JSON"));
    }

    #[test]
    fn test_prompt_constrains_audio_type() {
        let context = AnalysisContext::with_travelers(vec![]);
        let prompt = build_analysis_prompt(&context).unwrap();
        assert!(prompt.contains("Choose one of: speech, ambient, mixed, music, silent"));
    }
}
