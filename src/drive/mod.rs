// src/drive/mod.rs
// Cloud-drive collaborator - download sources, export finished transcripts

use crate::media::MediaSource;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DRIVE_API_URL: &str = "https://www.googleapis.com/drive/v3/files";
const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A short-lived drive access token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
}

/// Explicit authorization request/response seam. One call yields one resolved
/// token or a rejection; nothing here mutates shared callback state.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn request_token(&self) -> Result<AccessToken, DriveError>;
}

/// Fixed-token provider for tests and pre-authorized environments.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn request_token(&self) -> Result<AccessToken, DriveError> {
        Ok(AccessToken {
            token: self.token.clone(),
        })
    }
}

/// A file picked from the drive. Picker UI lives outside this crate; it only
/// needs to hand over these three fields.
#[derive(Debug, Clone)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
}

#[derive(Deserialize)]
struct UploadedFile {
    id: String,
}

pub struct DriveClient {
    http: reqwest::Client,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl DriveClient {
    pub fn new(tokens: Arc<dyn AccessTokenProvider>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self { http, tokens }
    }

    /// Download a picked file and wrap it as a media source with the
    /// picker-declared name and MIME type.
    pub async fn download(&self, file: &DriveFile) -> Result<MediaSource, DriveError> {
        let token = self.tokens.request_token().await?;
        let url = format!("{}/{}?alt=media", DRIVE_API_URL, file.id);

        tracing::info!("Downloading '{}' from drive", file.name);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&token.token)
            .send()
            .await
            .map_err(|e| DriveError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DriveError::Network(e.to_string()))?;

        Ok(MediaSource::from_bytes(
            file.name.clone(),
            file.mime_type.clone(),
            bytes.to_vec(),
        ))
    }

    /// Save a finished transcript back to the drive as a plain-text file.
    /// Returns the created file id.
    pub async fn upload_text(&self, file_name: &str, content: &str) -> Result<String, DriveError> {
        let token = self.tokens.request_token().await?;
        let url = format!("{}?uploadType=multipart", DRIVE_UPLOAD_URL);

        let metadata = serde_json::json!({
            "name": file_name,
            "mimeType": "text/plain",
            "parents": ["root"],
        });

        let metadata_part = reqwest::multipart::Part::text(metadata.to_string())
            .mime_str("application/json")
            .map_err(|e| DriveError::InvalidResponse(e.to_string()))?;
        let file_part = reqwest::multipart::Part::text(content.to_string())
            .mime_str("text/plain")
            .map_err(|e| DriveError::InvalidResponse(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("metadata", metadata_part)
            .part("file", file_part);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&token.token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DriveError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let uploaded: UploadedFile = response
            .json()
            .await
            .map_err(|e| DriveError::InvalidResponse(e.to_string()))?;

        tracing::info!("Exported '{}' to drive as {}", file_name, uploaded.id);

        Ok(uploaded.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_provider_resolves_its_token() {
        let provider = StaticTokenProvider::new("ya29.token");
        let token = provider.request_token().await.unwrap();
        assert_eq!(token.token, "ya29.token");
    }
}
