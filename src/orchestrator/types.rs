// src/orchestrator/types.rs
// Request/result types and the pipeline error taxonomy

use crate::gemini::FileState;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Quality/cost level of the hosted transcription model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Fast,
    Accurate,
}

impl ModelTier {
    pub fn model_id(self) -> &'static str {
        match self {
            ModelTier::Fast => "gemini-2.5-flash",
            ModelTier::Accurate => "gemini-2.5-pro",
        }
    }
}

/// Parameters of one transcription attempt.
#[derive(Debug, Clone)]
pub struct TranscribeRequest {
    pub prompt: String,
    pub tier: ModelTier,
    pub refine: bool,
}

/// Final text of a successful attempt. Immutable; persistence (id, timestamp)
/// happens in the store, not here.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionResult {
    pub text: String,
    pub file_name: String,
}

/// Fatal pipeline errors. Each aborts the whole attempt; retry means calling
/// `transcribe` again from scratch. Refinement failures never appear here.
#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("failed to encode media: {0}")]
    EncodingFailed(String),

    #[error("staged upload failed: {0}")]
    UploadFailed(String),

    #[error("remote processing failed: file state {0}")]
    RemoteProcessingFailed(FileState),

    #[error("remote processing still pending after {0:?}")]
    PollingTimedOut(Duration),

    #[error("no transcription received")]
    TranscriptionEmpty,

    #[error("transcription request failed: {0}")]
    TranscriptionRequestFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_map_to_model_ids() {
        assert_eq!(ModelTier::Fast.model_id(), "gemini-2.5-flash");
        assert_eq!(ModelTier::Accurate.model_id(), "gemini-2.5-pro");
    }

    #[test]
    fn result_serializes_camel_case() {
        let result = TranscriptionResult {
            text: "hello".into(),
            file_name: "take.wav".into(),
        };
        let value = serde_json::to_value(result).unwrap();
        assert_eq!(value["fileName"], "take.wav");
    }

    #[test]
    fn errors_carry_descriptive_messages() {
        let err = TranscribeError::RemoteProcessingFailed(FileState::Failed);
        assert_eq!(err.to_string(), "remote processing failed: file state FAILED");
        assert_eq!(
            TranscribeError::TranscriptionEmpty.to_string(),
            "no transcription received"
        );
    }
}
