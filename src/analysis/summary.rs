//! Story-beat summarization.
//!
//! Long story beats get collapsed to one sentence before they enter the
//! per-clip prompt. Summarization happens once per distinct beat id per run;
//! the per-clip context builder reads from the cached map.

use std::collections::HashMap;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use super::GeminiClient;
use crate::context::SummaryLookup;
use crate::error::Result;
use crate::export::StoryBeatLookup;

/// Texts shorter than this are used as-is; a model call would not earn its
/// latency.
pub const SHORT_TEXT_THRESHOLD: usize = 200;

/// Whether a story-beat text is long enough to warrant summarization.
pub fn needs_summary(text: &str) -> bool {
    text.chars().count() >= SHORT_TEXT_THRESHOLD
}

/// Strip whitespace and any wrapping quote characters from a model summary,
/// falling back to the original text when the model returned nothing usable.
fn clean_summary(raw: Option<String>, original: &str) -> String {
    let cleaned = raw
        .as_deref()
        .map(str::trim)
        .map(|s| s.trim_matches(|c| c == '"' || c == '\''))
        .unwrap_or("");

    if cleaned.is_empty() {
        original.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Summarize one story-beat text into a single short sentence.
///
/// Short texts bypass the model entirely. The result is never emptier than
/// the input: an empty model response falls back to the original text.
pub async fn summarize_story_beat(client: &GeminiClient, text: &str) -> Result<String> {
    if !needs_summary(text) {
        return Ok(text.to_string());
    }

    let prompt = format!(
        "Summarize this story in ONE sentence (max 30 words).\n\
         Capture the main historical fact or interesting point being shared.\n\n\
         Story:\n{text}\n\nSummary:"
    );

    let response = client.generate_text(&prompt).await?;
    Ok(clean_summary(response, text))
}

/// Summarize every story beat once, keyed by beat id.
///
/// A failed summarization degrades to the full beat text with a warning;
/// one flaky model call must not abort the run before it starts.
pub async fn summarize_beats(
    client: &GeminiClient,
    story_beats: &StoryBeatLookup,
) -> SummaryLookup {
    let mut summaries = HashMap::new();

    let pb = ProgressBar::new(story_beats.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {spinner:.green} Summaries [{bar:30.cyan/blue}] {pos}/{len}")
            .unwrap()
            .progress_chars("█▓░"),
    );

    for (id, beat) in story_beats {
        let summary = match summarize_story_beat(client, &beat.text).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Summarizing story beat {} failed, using full text: {}", id, e);
                beat.text.clone()
            }
        };
        debug!("Story beat {}: {} chars -> {} chars", id, beat.text.len(), summary.len());
        summaries.insert(id.clone(), summary);
        pb.inc(1);
    }

    pb.finish_and_clear();
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_bypasses_model() {
        assert!(!needs_summary("A short story."));
        assert!(needs_summary(&"x".repeat(200)));
        assert!(!needs_summary(&"x".repeat(199)));
    }

    #[test]
    fn test_threshold_counts_chars_not_bytes() {
        // 199 multi-byte chars stay under the threshold.
        assert!(!needs_summary(&"é".repeat(199)));
        assert!(needs_summary(&"é".repeat(200)));
    }

    #[test]
    fn test_clean_summary_strips_quotes() {
        assert_eq!(
            clean_summary(Some("\"A royal history.\"".to_string()), "orig"),
            "A royal history."
        );
        assert_eq!(
            clean_summary(Some("  'Quoted.'  ".to_string()), "orig"),
            "Quoted."
        );
    }

    #[test]
    fn test_clean_summary_falls_back_on_empty() {
        assert_eq!(clean_summary(None, "original text"), "original text");
        assert_eq!(clean_summary(Some("   ".to_string()), "original text"), "original text");
        assert_eq!(clean_summary(Some("\"\"".to_string()), "original text"), "original text");
    }
}
