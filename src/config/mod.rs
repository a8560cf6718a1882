//! Configuration module for Ferd.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{AnalysisSettings, GeneralSettings, Settings, TranscriptionSettings};
