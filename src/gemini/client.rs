// src/gemini/client.rs
// HTTP client for the Gemini generative language API

use super::types::{
    Content, FileStatus, GenerateRequest, GenerateResponse, RequestPart, UploadResponse,
};
use super::{ApiError, FileState, GenerativeBackend, MediaPart, ModelReply, StagedFile, UploadProgress};
use crate::media::MediaSource;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const TIMEOUT_SECS: u64 = 300;
const UPLOAD_CHUNK_BYTES: usize = 256 * 1024;

/// Explicitly constructed API client. Built once by the composition root and
/// injected wherever a `GenerativeBackend` is needed; there is no ambient
/// shared instance.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        tracing::info!("Gemini client initialized");

        Self {
            http,
            api_key,
            base_url: base_url.into(),
        }
    }

    /// Convenience constructor reading `GEMINI_API_KEY`.
    pub fn from_env() -> Option<Self> {
        std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .map(Self::new)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        media: Option<&MediaPart>,
        prompt: &str,
    ) -> Result<ModelReply, ApiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let mut parts = Vec::new();
        if let Some(media) = media {
            parts.push(RequestPart::media(media));
        }
        parts.push(RequestPart::text(prompt));

        let request = GenerateRequest {
            contents: vec![Content { parts }],
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        let text = reply
            .candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|t| !t.is_empty());

        Ok(ModelReply { text })
    }

    async fn upload_media(
        &self,
        source: &MediaSource,
        on_progress: UploadProgress,
    ) -> Result<StagedFile, ApiError> {
        let bytes = source
            .read_bytes()
            .await
            .map_err(|e| ApiError::MediaRead(e.to_string()))?;
        let total = bytes.len() as u64;

        tracing::info!("Staging '{}' ({} bytes)", source.name(), total);

        let url = format!("{}/upload/v1beta/files?key={}", self.base_url, self.api_key);

        // Chunked request body; the callback fires as the transport pulls
        // each chunk, which is what gives the caller fractional progress.
        let sent = Arc::new(AtomicU64::new(0));
        let chunks: Vec<Vec<u8>> = bytes
            .chunks(UPLOAD_CHUNK_BYTES)
            .map(|c| c.to_vec())
            .collect();
        let stream = futures_util::stream::iter(chunks.into_iter().map(move |chunk| {
            let done = sent.fetch_add(chunk.len() as u64, Ordering::Relaxed) + chunk.len() as u64;
            on_progress(done, total);
            Ok::<Vec<u8>, std::io::Error>(chunk)
        }));

        let response = self
            .http
            .post(&url)
            .header("X-Goog-Upload-Protocol", "raw")
            .header(reqwest::header::CONTENT_TYPE, source.mime_type().to_string())
            .header(reqwest::header::CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(stream))
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let upload: UploadResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        tracing::info!(
            "Staged '{}' as {} (state {})",
            source.name(),
            upload.file.name,
            upload.file.state
        );

        Ok(upload.file)
    }

    async fn file_state(&self, name: &str) -> Result<FileState, ApiError> {
        let path = if name.starts_with("files/") {
            name.to_string()
        } else {
            format!("files/{}", name)
        };
        let url = format!("{}/v1beta/{}?key={}", self.base_url, path, self.api_key);

        let response = self.http.get(&url).send().await.map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let file: FileStatus = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        Ok(file.state)
    }
}

fn map_transport(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(e.to_string())
    }
}
