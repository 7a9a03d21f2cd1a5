// src/gemini/poller.rs
// Fixed-interval polling of a staged file until it leaves PROCESSING

use super::{ApiError, FileState, GenerativeBackend, StagedFile};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Error)]
pub enum PollError {
    #[error("state query failed: {0}")]
    Request(#[from] ApiError),

    #[error("file entered terminal state {0}")]
    Terminal(FileState),

    #[error("file still processing after {0:?}")]
    TimedOut(Duration),
}

/// Waits for a staged file to become ACTIVE. Fixed interval, no backoff.
/// `timeout: None` polls forever, which leaves a stuck remote job hanging
/// the attempt; the default bounds the wait instead.
pub struct UploadPoller {
    interval: Duration,
    timeout: Option<Duration>,
}

impl UploadPoller {
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }

    pub async fn wait_until_active(
        &self,
        backend: &dyn GenerativeBackend,
        file: &StagedFile,
    ) -> Result<(), PollError> {
        let started = Instant::now();
        let mut state = file.state.clone();
        let mut queries = 0u32;

        loop {
            match state {
                FileState::Active => {
                    tracing::info!("File {} active after {} state queries", file.name, queries);
                    return Ok(());
                }
                FileState::Processing => {
                    if let Some(limit) = self.timeout {
                        if started.elapsed() >= limit {
                            tracing::warn!("File {} still processing, giving up", file.name);
                            return Err(PollError::TimedOut(limit));
                        }
                    }
                    sleep(self.interval).await;
                    state = backend.file_state(&file.name).await?;
                    queries += 1;
                }
                other => {
                    tracing::error!("File {} failed remote processing: {}", file.name, other);
                    return Err(PollError::Terminal(other));
                }
            }
        }
    }
}

impl Default for UploadPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, Some(DEFAULT_POLL_TIMEOUT))
    }
}
