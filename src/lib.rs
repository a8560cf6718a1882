//! Ferd - Travel Diary Audio Enrichment
//!
//! A CLI pipeline for enriching travel-diary audio exports with AI analysis.
//!
//! The name "Ferd" comes from the Norwegian word for "journey."
//!
//! # Overview
//!
//! Ferd takes a travel-diary export (a ZIP of short audio clips plus trip
//! metadata) and annotates every clip with:
//!
//! - A speech transcript with speaker attribution (diarization)
//! - Non-speech audio events with timestamps
//! - A scene description and an emotional tone label
//!
//! Two external AI services do the heavy lifting: a multimodal
//! audio-understanding model analyzes each clip against its trip context,
//! and (in hybrid mode) a diarizing transcription model produces the
//! authoritative transcript using per-traveler voice references.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `export` - Export archive extraction and the trip metadata document
//! - `context` - Per-clip analysis context assembly
//! - `voice` - Voice reference resolution
//! - `analysis` - Multimodal audio analysis (prompting, parsing, summaries)
//! - `transcription` - Diarized speech-to-text transcription
//! - `orchestrator` - Pipeline coordination and per-clip merge
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use ferd::config::Settings;
//! use ferd::orchestrator::{Orchestrator, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let stats = orchestrator
//!         .process_export(Path::new("export.zip"), RunOptions::default())
//!         .await?;
//!     println!("Processed {} clips", stats.processed_count);
//!
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod http;
pub mod orchestrator;
pub mod transcription;
pub mod voice;

pub use error::{FerdError, Result};
