// src/media/encoder.rs
// Inline base64 encoding for small media payloads

use super::{MediaError, MediaSource};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;

/// Media encoded for direct embedding in a model request.
#[derive(Debug, Clone)]
pub struct InlinePayload {
    pub data: String,
    pub mime_type: String,
}

/// Encode a source as a base64 inline payload. No size gating here; the
/// orchestrator decides whether a source is small enough to inline.
pub async fn encode_inline(source: &MediaSource) -> Result<InlinePayload, MediaError> {
    let bytes = source.read_bytes().await?;

    Ok(InlinePayload {
        data: BASE64_STANDARD.encode(bytes),
        mime_type: source.mime_type().to_string(),
    })
}
