// src/gemini/mod.rs
// Gemini API client - model calls, file staging, state polling

mod client;
mod poller;
mod types;

pub use client::GeminiClient;
pub use poller::{PollError, UploadPoller, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT};
pub use types::{ApiError, FileState, MediaPart, ModelReply, StagedFile, UploadProgress};

use crate::media::MediaSource;
use async_trait::async_trait;

/// Seam between the pipeline and the hosted generative service. The real
/// client talks HTTP; tests substitute their own implementation.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Run a model over an optional media attachment plus a text prompt.
    async fn generate(
        &self,
        model: &str,
        media: Option<&MediaPart>,
        prompt: &str,
    ) -> Result<ModelReply, ApiError>;

    /// Stage the full media blob with the remote file service, reporting
    /// byte-level progress as the transport consumes the body.
    async fn upload_media(
        &self,
        source: &MediaSource,
        on_progress: UploadProgress,
    ) -> Result<StagedFile, ApiError>;

    /// Query the processing state of a staged file.
    async fn file_state(&self, name: &str) -> Result<FileState, ApiError>;
}
