// src/orchestrator/mod.rs
// Transcription pipeline - size routing, staged upload, two-stage model calls

mod progress;
mod types;

pub use progress::{Phase, ProgressEvent, ProgressSink};
pub use types::{ModelTier, TranscribeError, TranscribeRequest, TranscriptionResult};

use crate::gemini::{GenerativeBackend, MediaPart, PollError, UploadPoller, UploadProgress};
use crate::media::{self, MediaSource};
use std::sync::Arc;

/// Sources above this byte length are staged with the remote file service
/// instead of being embedded inline; base64 payloads are impractical beyond
/// tens of megabytes.
pub const LARGE_FILE_THRESHOLD_BYTES: u64 = 15 * 1024 * 1024;

const REFINE_INSTRUCTION: &str = "Correct the following transcript: fix spelling, grammar and \
    punctuation errors, add paragraph breaks where the flow of speech calls for them, and output \
    only the corrected text with no commentary.";

/// Drives one transcription attempt end to end: routes the source inline or
/// through the staged path, forwards progress, invokes the transcription
/// model and, when requested, the refinement pass.
pub struct TranscriptionOrchestrator {
    backend: Arc<dyn GenerativeBackend>,
    large_file_threshold: u64,
    poller: UploadPoller,
}

impl TranscriptionOrchestrator {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            large_file_threshold: LARGE_FILE_THRESHOLD_BYTES,
            poller: UploadPoller::default(),
        }
    }

    pub fn with_limits(
        backend: Arc<dyn GenerativeBackend>,
        large_file_threshold: u64,
        poller: UploadPoller,
    ) -> Self {
        Self {
            backend,
            large_file_threshold,
            poller,
        }
    }

    pub fn from_settings(backend: Arc<dyn GenerativeBackend>, settings: &crate::config::Settings) -> Self {
        Self::with_limits(
            backend,
            settings.large_file_threshold,
            UploadPoller::new(settings.poll_interval, settings.poll_timeout),
        )
    }

    /// Run one attempt. Progress events arrive in a fixed order: preparing,
    /// then uploading/processing on the staged path, transcribing, refining
    /// when enabled, done.
    ///
    /// At most one attempt may be in flight per instance; starting a second
    /// while one is running is a caller error. There is no cancellation:
    /// dropping the future abandons the attempt and leaves any staged file
    /// to expire on the service side.
    pub async fn transcribe(
        &self,
        source: &MediaSource,
        request: &TranscribeRequest,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<TranscriptionResult, TranscribeError> {
        progress.emit(ProgressEvent::new(Phase::Preparing, 0));

        // Routing is decided exactly once, from byte length alone.
        let staged = source.byte_len() > self.large_file_threshold;

        tracing::info!(
            "Transcribing '{}': {} bytes, {} path, tier {}",
            source.name(),
            source.byte_len(),
            if staged { "staged" } else { "inline" },
            request.tier.model_id()
        );

        let media = if staged {
            self.stage_media(source, progress.clone()).await?
        } else {
            let payload = media::encode_inline(source)
                .await
                .map_err(|e| TranscribeError::EncodingFailed(e.to_string()))?;
            MediaPart::Inline {
                mime_type: payload.mime_type,
                data: payload.data,
            }
        };

        progress.emit(ProgressEvent::new(Phase::Transcribing, 100));

        let reply = self
            .backend
            .generate(request.tier.model_id(), Some(&media), &request.prompt)
            .await
            .map_err(|e| TranscribeError::TranscriptionRequestFailed(e.to_string()))?;

        let raw = match reply.text {
            Some(text) if !text.is_empty() => text,
            _ => return Err(TranscribeError::TranscriptionEmpty),
        };

        tracing::info!("Transcript received: {} chars", raw.len());

        let text = if request.refine {
            progress.emit(ProgressEvent::new(Phase::Refining, 99));
            self.refine(raw).await
        } else {
            raw
        };

        progress.emit(ProgressEvent::new(Phase::Done, 100));

        Ok(TranscriptionResult {
            text,
            file_name: source.name().to_string(),
        })
    }

    async fn stage_media(
        &self,
        source: &MediaSource,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<MediaPart, TranscribeError> {
        let sink = progress.clone();
        let on_upload: UploadProgress = Arc::new(move |sent, total| {
            let pct = if total == 0 {
                100
            } else {
                ((sent as f64 / total as f64) * 100.0).round() as u8
            };
            sink.emit(ProgressEvent::new(Phase::Uploading, pct));
        });

        let staged = self
            .backend
            .upload_media(source, on_upload)
            .await
            .map_err(|e| TranscribeError::UploadFailed(e.to_string()))?;

        progress.emit(ProgressEvent::new(Phase::Processing, 100));

        self.poller
            .wait_until_active(self.backend.as_ref(), &staged)
            .await
            .map_err(|e| match e {
                PollError::Request(api) => TranscribeError::UploadFailed(api.to_string()),
                PollError::Terminal(state) => TranscribeError::RemoteProcessingFailed(state),
                PollError::TimedOut(limit) => TranscribeError::PollingTimedOut(limit),
            })?;

        let mime_type = staged
            .mime_type
            .clone()
            .unwrap_or_else(|| source.mime_type().to_string());

        Ok(MediaPart::Remote {
            mime_type,
            file_name: staged.name,
        })
    }

    /// Correction pass on the highest-quality tier, regardless of the tier
    /// the transcription ran on. Best effort: any error or empty output
    /// falls back to the unrefined transcript.
    async fn refine(&self, raw: String) -> String {
        let prompt = format!("{}\n\nTranscript:\n{}", REFINE_INSTRUCTION, raw);

        match self
            .backend
            .generate(ModelTier::Accurate.model_id(), None, &prompt)
            .await
        {
            Ok(reply) => match reply.text {
                Some(text) if !text.is_empty() => {
                    tracing::info!("Refinement succeeded: {} chars", text.len());
                    text
                }
                _ => {
                    tracing::warn!("Refinement returned no text, keeping raw transcript");
                    raw
                }
            },
            Err(e) => {
                tracing::warn!("Refinement failed, keeping raw transcript: {}", e);
                raw
            }
        }
    }
}
