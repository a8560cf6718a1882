//! CLI module for Ferd.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Ferd - Travel Diary Audio Enrichment
///
/// A CLI pipeline for enriching travel-diary audio exports with AI analysis.
/// The name "Ferd" comes from the Norwegian word for "journey."
#[derive(Parser, Debug)]
#[command(name = "ferd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process a travel-diary export ZIP with AI audio analysis
    Process {
        /// Path to the export ZIP file
        zip_path: String,

        /// Show full transcripts for each clip
        #[arg(short = 't', long)]
        transcripts: bool,

        /// Show what would be processed without calling any model API
        #[arg(long)]
        dry_run: bool,

        /// Use the diarizing transcription model for transcripts
        /// (requires OPENAI_API_KEY)
        #[arg(long)]
        hybrid: bool,
    },

    /// Analyze a single audio file with an ad-hoc context
    Analyze {
        /// Path to the audio file
        audio_path: String,

        /// Traveler on the recording, as NAME or NAME:AGE (repeatable)
        #[arg(short = 'p', long = "traveler")]
        travelers: Vec<String>,

        /// Where the clip was recorded
        #[arg(short, long)]
        location: Option<String>,

        /// Story the clip was recorded as a reaction to
        #[arg(short, long)]
        story: Option<String>,

        /// When the clip was recorded (ISO-8601)
        #[arg(short, long)]
        recorded_at: Option<String>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
