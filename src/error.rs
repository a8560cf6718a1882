//! Error types for Ferd.

use thiserror::Error;

/// Library-level error type for Ferd operations.
#[derive(Error, Debug)]
pub enum FerdError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export archive error: {0}")]
    Archive(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Audio analysis failed: {0}")]
    Analysis(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Audio file not found: {0}")]
    AudioNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Result type alias for Ferd operations.
pub type Result<T> = std::result::Result<T, FerdError>;
