//! Export archive handling and the trip metadata document.
//!
//! A travel-diary export is a ZIP expanding to a root containing
//! `metadata.json` and an `audio/` directory of per-clip media files,
//! optionally a `voice_references/` directory or a legacy
//! `voice_reference.webm` at the root.

mod archive;
mod metadata;

pub use archive::extract_zip;
pub use metadata::{
    Clip, Document, Location, ResolvedStoryBeat, StoryBeat, StoryBeatLookup, Traveler, TripInfo,
};

/// Name of the metadata document inside an extracted export.
pub const METADATA_FILENAME: &str = "metadata.json";

/// Name of the enriched document written next to the extracted export.
pub const ENRICHED_FILENAME: &str = "enriched_metadata.json";
