//! Shared HTTP client configuration with sensible defaults.

use std::time::Duration;

use crate::error::Result;

/// Default timeout for model API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create an HTTP client with the default timeout.
///
/// Uses a 5-minute timeout to prevent hung API calls; audio uploads to the
/// analysis model can legitimately take a while.
pub fn create_client() -> Result<reqwest::Client> {
    create_client_with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create an HTTP client with a custom timeout.
pub fn create_client_with_timeout(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}
