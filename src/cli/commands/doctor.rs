//! Doctor command - verify credentials and configuration.

use crate::cli::Output;
use crate::config::Settings;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Ferd Doctor");
    println!();
    println!("Checking credentials and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    let analysis_key = check_api_key(
        "GEMINI_API_KEY",
        "required for audio analysis and story-beat summaries",
    );
    analysis_key.print();
    checks.push(analysis_key);

    let transcription_key = check_optional_api_key(
        "OPENAI_API_KEY",
        "only needed for --hybrid transcription",
    );
    transcription_key.print();
    checks.push(transcription_key);

    println!();

    println!("{}", style("Directories").bold());
    let dir_check = check_output_dir(settings);
    dir_check.print();
    checks.push(dir_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Ferd.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Ferd is ready to use.");
    }

    Ok(())
}

/// Check a required API key.
fn check_api_key(name: &str, purpose: &str) -> CheckResult {
    match std::env::var(name) {
        Ok(key) if key.len() > 8 => {
            let masked = format!("{}...{}", &key[..4], &key[key.len() - 4..]);
            CheckResult::ok(name, &format!("configured ({})", masked))
        }
        Ok(key) if key.is_empty() => CheckResult::error(
            name,
            "empty",
            &format!("Set with: export {name}='...' ({purpose})"),
        ),
        Ok(_) => CheckResult::warning(
            name,
            "set but suspiciously short",
            "Double-check the key value",
        ),
        Err(_) => CheckResult::error(
            name,
            "not set",
            &format!("Set with: export {name}='...' ({purpose})"),
        ),
    }
}

/// Check an optional API key: absence is a warning, not an error.
fn check_optional_api_key(name: &str, purpose: &str) -> CheckResult {
    match std::env::var(name) {
        Ok(key) if key.len() > 8 => {
            let masked = format!("{}...{}", &key[..4], &key[key.len() - 4..]);
            CheckResult::ok(name, &format!("configured ({})", masked))
        }
        _ => CheckResult::warning(
            name,
            "not set",
            &format!("Set with: export {name}='...' ({purpose})"),
        ),
    }
}

/// Check the output directory is usable.
fn check_output_dir(settings: &Settings) -> CheckResult {
    let output_dir = settings.output_dir();
    if output_dir.exists() {
        CheckResult::ok("Output directory", &format!("{}", output_dir.display()))
    } else {
        CheckResult::warning(
            "Output directory",
            &format!("{} (will be created)", output_dir.display()),
            "Directory is created on first run",
        )
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "See 'ferd config path' for the expected location",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }
}
