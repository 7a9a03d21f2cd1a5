// src/gemini/types.rs
// Wire types and errors for the generative API

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// API call errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("failed to read media: {0}")]
    MediaRead(String),
}

/// Processing state of a staged file, owned by the remote service and only
/// observed here through polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    StateUnspecified,
    Processing,
    Active,
    Failed,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileState::StateUnspecified => "STATE_UNSPECIFIED",
            FileState::Processing => "PROCESSING",
            FileState::Active => "ACTIVE",
            FileState::Failed => "FAILED",
            FileState::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

/// A file staged with the remote service. The service garbage-collects these
/// on its own schedule; nothing here deletes them.
#[derive(Debug, Clone, Deserialize)]
pub struct StagedFile {
    pub name: String,
    #[serde(rename = "mimeType", default)]
    pub mime_type: Option<String>,
    pub state: FileState,
}

/// Media attached to a model request: either embedded bytes or a reference
/// to a previously staged file. A given source produces exactly one of the
/// two per attempt.
#[derive(Debug, Clone)]
pub enum MediaPart {
    Inline { mime_type: String, data: String },
    Remote { mime_type: String, file_name: String },
}

/// Model reply. `text` is absent when the response carried no usable text.
#[derive(Debug, Clone)]
pub struct ModelReply {
    pub text: Option<String>,
}

/// Byte-level progress callback for staged uploads: (bytes sent, total).
/// Invoked as the transport pulls request chunks; must not block.
pub type UploadProgress = Arc<dyn Fn(u64, u64) + Send + Sync>;

// --- request/response bodies ---

#[derive(Serialize)]
pub(crate) struct GenerateRequest {
    pub contents: Vec<Content>,
}

#[derive(Serialize)]
pub(crate) struct Content {
    pub parts: Vec<RequestPart>,
}

#[derive(Serialize, Default)]
pub(crate) struct RequestPart {
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    #[serde(rename = "fileData", skip_serializing_if = "Option::is_none")]
    pub file_data: Option<FileData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

#[derive(Serialize)]
pub(crate) struct FileData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

impl RequestPart {
    pub fn media(part: &MediaPart) -> Self {
        match part {
            MediaPart::Inline { mime_type, data } => Self {
                inline_data: Some(InlineData {
                    mime_type: mime_type.clone(),
                    data: data.clone(),
                }),
                ..Self::default()
            },
            MediaPart::Remote {
                mime_type,
                file_name,
            } => Self {
                file_data: Some(FileData {
                    mime_type: mime_type.clone(),
                    file_name: file_name.clone(),
                }),
                ..Self::default()
            },
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
pub(crate) struct Candidate {
    pub content: CandidateContent,
}

#[derive(Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
pub(crate) struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct UploadResponse {
    pub file: StagedFile,
}

#[derive(Deserialize)]
pub(crate) struct FileStatus {
    pub state: FileState,
}
