//! The trip metadata document.
//!
//! Exports come in two shapes: the current one nests trip info and the
//! traveler roster under `trip` (as `talent`), while older exports keep
//! `tripName` and `travelers` at the top level. Both are modeled explicitly;
//! unknown upstream fields are preserved through `#[serde(flatten)]` so the
//! enriched document round-trips everything it was given.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::analysis::ClipAnalysis;
use crate::error::{FerdError, Result};

/// Lookup table from story-beat id to the beat itself.
pub type StoryBeatLookup = HashMap<String, StoryBeat>;

/// The full trip metadata document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip: Option<TripInfo>,

    /// Legacy top-level trip name (older exports).
    #[serde(rename = "tripName", default, skip_serializing_if = "Option::is_none")]
    pub trip_name_legacy: Option<String>,

    /// Legacy top-level traveler roster (older exports).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travelers: Option<Vec<Traveler>>,

    #[serde(rename = "storyBeats", default, skip_serializing_if = "Vec::is_empty")]
    pub story_beats: Vec<StoryBeat>,

    #[serde(default)]
    pub clips: Vec<Clip>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Trip-level information (current export shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "exportedAt", default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,

    /// Traveler roster ("talent" in the current export shape).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub talent: Option<Vec<Traveler>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named participant on the trip.
///
/// Identity is structural (name + age + voice reference) for the duration of
/// a run. Age 0 is a valid present value; only a missing field suppresses
/// the age in formatting downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Traveler {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    #[serde(
        rename = "voiceReferenceFile",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub voice_reference_file: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Traveler {
    /// Convenience constructor for a traveler with just a name.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            age: None,
            voice_reference_file: None,
            extra: Map::new(),
        }
    }

    /// Convenience constructor for a traveler with a name and age.
    pub fn with_age(name: &str, age: u32) -> Self {
        Self {
            age: Some(age),
            ..Self::named(name)
        }
    }
}

/// A narrative text item clips may reference as "what this recording was a
/// reaction to."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryBeat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub starred: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The story beat a clip resolved to, persisted on the clip record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStoryBeat {
    pub id: String,
    pub text: String,
    pub starred: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// One recorded audio snippet with its trip metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Relative path into the extracted export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(rename = "recordedAt", default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_location",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<Location>,

    /// Story-beat reference (current export shape).
    #[serde(rename = "storyBeatId", default, skip_serializing_if = "Option::is_none")]
    pub story_beat_id: Option<String>,

    /// Inline story-beat text (older exports).
    #[serde(
        rename = "storyBeatContext",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub story_beat_context: Option<String>,

    #[serde(
        rename = "storyBeatStarred",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub story_beat_starred: Option<bool>,

    /// Resolved story beat, written during processing.
    #[serde(rename = "storyBeat", default, skip_serializing_if = "Option::is_none")]
    pub story_beat: Option<ResolvedStoryBeat>,

    /// Analysis outcome: absent before processing, `null` on failure,
    /// the annotation object on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Option<ClipAnalysis>>,

    #[serde(
        rename = "analysisError",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub analysis_error: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Clip {
    /// The clip's relative media path, or "unknown" when missing.
    pub fn file_name(&self) -> &str {
        self.filename.as_deref().unwrap_or("unknown")
    }

    /// Record a successful analysis. Clears any prior failure so exactly one
    /// of `analysis`/`analysisError` ends up set.
    pub fn set_analysis(&mut self, analysis: ClipAnalysis) {
        self.analysis = Some(Some(analysis));
        self.analysis_error = None;
    }

    /// Record a failed analysis: `analysis` serializes as `null` and the
    /// message lands in `analysisError`.
    pub fn set_analysis_failure(&mut self, message: String) {
        self.analysis = Some(None);
        self.analysis_error = Some(message);
    }
}

/// Where a clip was recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "placeName", default, skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Exports have shipped `location` as null and, rarely, as a bare string;
/// anything that is not an object is treated as absent.
fn lenient_location<'de, D>(deserializer: D) -> std::result::Result<Option<Location>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| v.is_object())
        .and_then(|v| serde_json::from_value(v).ok()))
}

impl Document {
    /// Load and parse a metadata document.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FerdError::Metadata(format!(
                "Metadata file not found: {}",
                path.display()
            )));
        }

        info!("Loading metadata from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let document: Document = serde_json::from_str(&content)?;
        Ok(document)
    }

    /// Save the document as formatted JSON with non-ASCII preserved.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Saving metadata to {}", path.display());
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Trip name, preferring the current shape over the legacy field.
    pub fn trip_name(&self) -> &str {
        self.trip
            .as_ref()
            .and_then(|t| t.name.as_deref())
            .or(self.trip_name_legacy.as_deref())
            .unwrap_or("Unknown")
    }

    /// Traveler roster, preferring `trip.talent` over the legacy top-level
    /// `travelers` list.
    pub fn traveler_roster(&self) -> Vec<Traveler> {
        self.trip
            .as_ref()
            .and_then(|t| t.talent.clone())
            .or_else(|| self.travelers.clone())
            .unwrap_or_default()
    }

    /// Build the story-beat lookup table. Beats without an id are dropped.
    pub fn story_beat_lookup(&self) -> StoryBeatLookup {
        self.story_beats
            .iter()
            .filter_map(|beat| beat.id.clone().map(|id| (id, beat.clone())))
            .collect()
    }
}
