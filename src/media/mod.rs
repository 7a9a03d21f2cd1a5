// src/media/mod.rs
// Media sources - captured audio/video handed to the transcription pipeline

mod encoder;

pub use encoder::{encode_inline, InlinePayload};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Media source errors
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to read media '{name}': {reason}")]
    Read { name: String, reason: String },
}

#[derive(Debug, Clone)]
enum Payload {
    Memory(Vec<u8>),
    File(PathBuf),
}

/// A captured audio/video source: file selection, a finished microphone
/// recording, or a cloud-drive download. Immutable once built; file-backed
/// payloads are read lazily when the pipeline needs the bytes.
#[derive(Debug, Clone)]
pub struct MediaSource {
    name: String,
    mime_type: String,
    byte_len: u64,
    payload: Payload,
}

impl MediaSource {
    /// Wrap in-memory bytes (microphone recordings, drive downloads).
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            byte_len: bytes.len() as u64,
            payload: Payload::Memory(bytes),
        }
    }

    /// Reference a local file. The length is taken from file metadata now;
    /// the contents are read when the pipeline encodes or uploads.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, MediaError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "media".to_string());

        let meta = tokio::fs::metadata(path).await.map_err(|e| MediaError::Read {
            name: name.clone(),
            reason: e.to_string(),
        })?;

        let mime_type = path
            .extension()
            .and_then(|ext| mime_for_extension(&ext.to_string_lossy()))
            .unwrap_or("application/octet-stream")
            .to_string();

        Ok(Self {
            name,
            mime_type,
            byte_len: meta.len(),
            payload: Payload::File(path.to_path_buf()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn byte_len(&self) -> u64 {
        self.byte_len
    }

    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    /// Read the full payload. File-backed sources hit the disk here; a failed
    /// read is fatal to the attempt and is not retried.
    pub async fn read_bytes(&self) -> Result<Vec<u8>, MediaError> {
        match &self.payload {
            Payload::Memory(bytes) => Ok(bytes.clone()),
            Payload::File(path) => tokio::fs::read(path).await.map_err(|e| MediaError::Read {
                name: self.name.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "flac" => "audio/flac",
        "weba" => "audio/webm",
        "webm" => "video/webm",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        _ => return None,
    };
    Some(mime)
}
