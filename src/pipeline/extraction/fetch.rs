//! Bounded, retried PDF download into a temp file.
//!
//! The `NamedTempFile` return value owns the file on disk; dropping it
//! deletes the file, so cleanup holds on every exit path of the caller.

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;

use super::ExtractionError;

/// Download behavior knobs. Tests shrink the delays.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Fetch a remote PDF into a temp file, retrying transient failures.
pub fn fetch_remote(url: &str, config: &FetchConfig) -> Result<NamedTempFile, ExtractionError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(config.timeout)
        .build()
        .expect("Failed to create HTTP client");

    let mut last_error = String::new();
    for attempt in 1..=config.max_attempts {
        match try_download(&client, url) {
            Ok(file) => {
                tracing::info!(url, attempt, "Downloaded PDF");
                return Ok(file);
            }
            Err(reason) => {
                tracing::warn!(
                    url,
                    attempt,
                    max_attempts = config.max_attempts,
                    error = %reason,
                    "PDF download failed"
                );
                last_error = reason;
            }
        }
        if attempt < config.max_attempts {
            std::thread::sleep(config.retry_delay);
        }
    }

    Err(ExtractionError::Download {
        url: url.to_string(),
        attempts: config.max_attempts,
        reason: last_error,
    })
}

fn try_download(client: &reqwest::blocking::Client, url: &str) -> Result<NamedTempFile, String> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| e.to_string())?
        .error_for_status()
        .map_err(|e| e.to_string())?;

    let bytes = response.bytes().map_err(|e| e.to_string())?;

    let mut file = NamedTempFile::new().map_err(|e| e.to_string())?;
    file.write_all(&bytes).map_err(|e| e.to_string())?;
    file.flush().map_err(|e| e.to_string())?;
    Ok(file)
}
