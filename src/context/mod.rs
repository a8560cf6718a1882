//! Per-clip analysis context assembly.
//!
//! A context field is present only when the corresponding source field was
//! present and non-empty in the clip or trip data. Absence is never
//! conflated with falsy values: age 0 is a valid present age, and an empty
//! place name suppresses the location rather than producing an empty string.

use std::collections::HashMap;

use serde::Serialize;

use crate::export::{Clip, StoryBeatLookup, Traveler};

/// Cached story-beat summaries, keyed by beat id.
pub type SummaryLookup = HashMap<String, String>;

/// Everything the analysis model gets told about a clip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisContext {
    /// Traveler roster, copied verbatim (may be empty, never omitted).
    pub travelers: Vec<Traveler>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(rename = "storyBeatContext", skip_serializing_if = "Option::is_none")]
    pub story_beat_context: Option<String>,

    #[serde(rename = "storyBeatStarred", skip_serializing_if = "Option::is_none")]
    pub story_beat_starred: Option<bool>,

    #[serde(rename = "recordedAt", skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<String>,
}

impl AnalysisContext {
    /// Context with just a roster, no optional fields.
    pub fn with_travelers(travelers: Vec<Traveler>) -> Self {
        Self {
            travelers,
            location: None,
            story_beat_context: None,
            story_beat_starred: None,
            recorded_at: None,
        }
    }

    /// Whether this context carries a story beat (new-format or legacy).
    pub fn has_story_beat(&self) -> bool {
        self.story_beat_context.is_some()
    }
}

/// Build the analysis context for one clip.
///
/// Story-beat precedence: a present `storyBeatId` that resolves in the
/// lookup wins (summary if cached for that id, else the full beat text),
/// with `starred` copied only when true. A present id that does NOT resolve
/// yields no story-beat fields at all; the legacy inline field is not
/// consulted in that case, since the new-format clip opted out of it.
pub fn build_context(
    clip: &Clip,
    travelers: &[Traveler],
    story_beats: Option<&StoryBeatLookup>,
    summaries: Option<&SummaryLookup>,
) -> AnalysisContext {
    let mut context = AnalysisContext::with_travelers(travelers.to_vec());

    if let Some(location) = &clip.location {
        if let Some(place_name) = location.place_name.as_deref() {
            if !place_name.is_empty() {
                context.location = Some(place_name.to_string());
            }
        }
    }

    if let Some(beat_id) = &clip.story_beat_id {
        if let Some(beat) = story_beats.and_then(|lookup| lookup.get(beat_id)) {
            let text = summaries
                .and_then(|s| s.get(beat_id))
                .cloned()
                .unwrap_or_else(|| beat.text.clone());
            context.story_beat_context = Some(text);
            if beat.starred {
                context.story_beat_starred = Some(true);
            }
        }
    } else if let Some(inline) = clip.story_beat_context.as_deref() {
        if !inline.is_empty() {
            context.story_beat_context = Some(inline.to_string());
        }
    }

    if let Some(recorded_at) = clip.recorded_at.as_deref() {
        if !recorded_at.is_empty() {
            context.recorded_at = Some(recorded_at.to_string());
        }
    }

    context
}
