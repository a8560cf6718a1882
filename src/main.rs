//! Ferd CLI entry point.

use anyhow::Result;
use clap::Parser;
use ferd::cli::{commands, Cli, Commands};
use ferd::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("ferd={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Execute command
    match &cli.command {
        Commands::Process {
            zip_path,
            transcripts,
            dry_run,
            hybrid,
        } => {
            commands::run_process(zip_path, *transcripts, *dry_run, *hybrid, settings).await?;
        }

        Commands::Analyze {
            audio_path,
            travelers,
            location,
            story,
            recorded_at,
        } => {
            commands::run_analyze(
                audio_path,
                travelers,
                location.clone(),
                story.clone(),
                recorded_at.clone(),
                settings,
            )
            .await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
