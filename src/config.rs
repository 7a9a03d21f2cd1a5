// src/config.rs
// Settings resolved once by the composition root

use crate::gemini::{DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT};
use crate::orchestrator::LARGE_FILE_THRESHOLD_BYTES;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub large_file_threshold: u64,
    pub poll_interval: Duration,
    pub poll_timeout: Option<Duration>,
    pub store_path: PathBuf,
    pub export_dir: PathBuf,
}

impl Settings {
    /// Load `.env`, then resolve settings from the environment.
    /// `GEMINI_API_KEY` is required; everything else has defaults.
    /// `AUDIOSCRIBE_POLL_TIMEOUT_SECS=0` removes the polling bound.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let large_file_threshold = parse_var::<u64>("AUDIOSCRIBE_LARGE_FILE_THRESHOLD")?
            .unwrap_or(LARGE_FILE_THRESHOLD_BYTES);

        let poll_interval = parse_var::<u64>("AUDIOSCRIBE_POLL_INTERVAL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        let poll_timeout = match parse_var::<u64>("AUDIOSCRIBE_POLL_TIMEOUT_SECS")? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(DEFAULT_POLL_TIMEOUT),
        };

        let store_path = std::env::var("AUDIOSCRIBE_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir().join("transcriptions.json"));

        let export_dir = std::env::var("AUDIOSCRIBE_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir().join("exports"));

        Ok(Self {
            api_key,
            large_file_threshold,
            poll_interval,
            poll_timeout,
            store_path,
            export_dir,
        })
    }
}

fn default_data_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".audioscribe")
}

fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse::<T>().map(Some).map_err(|_| ConfigError::Invalid {
                name,
                value: raw,
            })
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_reads_and_validates() {
        std::env::set_var("AUDIOSCRIBE_TEST_U64", "42");
        assert_eq!(parse_var::<u64>("AUDIOSCRIBE_TEST_U64").unwrap(), Some(42));

        std::env::set_var("AUDIOSCRIBE_TEST_BAD", "not-a-number");
        assert!(parse_var::<u64>("AUDIOSCRIBE_TEST_BAD").is_err());

        assert_eq!(parse_var::<u64>("AUDIOSCRIBE_TEST_UNSET").unwrap(), None);
    }

    #[test]
    fn blank_values_count_as_unset() {
        std::env::set_var("AUDIOSCRIBE_TEST_BLANK", "  ");
        assert_eq!(parse_var::<u64>("AUDIOSCRIBE_TEST_BLANK").unwrap(), None);
    }
}
