//! Pre-flight checks before expensive operations.
//!
//! Validates that required credentials are available before starting
//! operations that would otherwise fail midway through a batch.

use crate::error::{FerdError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Full export processing. Hybrid mode additionally needs the
    /// transcription key.
    Process { hybrid: bool },
    /// Single-file analysis.
    Analyze,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Process { hybrid } => {
            check_env_key("GEMINI_API_KEY")?;
            if hybrid {
                check_env_key("OPENAI_API_KEY")?;
            }
        }
        Operation::Analyze => {
            check_env_key("GEMINI_API_KEY")?;
        }
    }
    Ok(())
}

/// Check that an API key environment variable is set and non-empty.
fn check_env_key(name: &str) -> Result<()> {
    match std::env::var(name) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(FerdError::Config(format!(
            "{name} is empty. Set it with: export {name}='...'"
        ))),
        Err(_) => Err(FerdError::Config(format!(
            "{name} not set. Set it with: export {name}='...'"
        ))),
    }
}
