//! Media-ingestion and transcription pipeline for a hosted generative
//! speech-to-text service.
//!
//! A captured [`media::MediaSource`] (file selection, microphone recording,
//! drive download) is routed by size either inline or through the remote
//! staging path, transcribed on the selected model tier, optionally run
//! through a correction pass, and handed back as text. UI shells sit outside
//! this crate and drive it through these modules.

pub mod audio;
pub mod config;
pub mod drive;
pub mod gemini;
pub mod media;
pub mod orchestrator;
pub mod store;

pub use config::Settings;
pub use gemini::{GeminiClient, GenerativeBackend, UploadPoller};
pub use media::MediaSource;
pub use orchestrator::{
    ModelTier, Phase, ProgressEvent, ProgressSink, TranscribeError, TranscribeRequest,
    TranscriptionOrchestrator, TranscriptionResult,
};
pub use store::TranscriptionStore;
