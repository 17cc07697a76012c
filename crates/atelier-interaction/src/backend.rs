//! Generation backend contract.
//!
//! The dispatcher depends only on this trait. The production implementation
//! is [`crate::GeminiClient`]; tests substitute scripted mocks.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use futures::stream::BoxStream;
use serde_json::Value;

use atelier_core::Result;
use atelier_core::session::GroundingChunk;

/// Inline attachment data: base64 payload plus its mime type, as produced
/// by the file-reading collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentData {
    pub data: String,
    pub mime_type: String,
}

impl AttachmentData {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Encodes raw bytes for inline transport.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            data: BASE64_STANDARD.encode(bytes),
            mime_type: mime_type.into(),
        }
    }
}

/// Grounding tool to enable on a streaming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundingTool {
    /// Web search citations
    WebSearch,
    /// Map place citations
    Maps,
}

/// Output parameters for still image generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageParams {
    /// "1K", "2K" or "4K"
    pub size: String,
    pub aspect_ratio: String,
}

/// Parameters submitted with a video job.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoParams {
    pub number_of_videos: u32,
    pub resolution: String,
    pub aspect_ratio: String,
}

impl Default for VideoParams {
    fn default() -> Self {
        Self {
            number_of_videos: 1,
            resolution: "720p".to_string(),
            aspect_ratio: "16:9".to_string(),
        }
    }
}

/// One request against the generation API. Built by the dispatcher, shaped
/// onto the wire by the backend.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub attachment: Option<AttachmentData>,
    pub tool: Option<GroundingTool>,
    pub image: Option<ImageParams>,
    pub video: Option<VideoParams>,
}

impl GenerationRequest {
    /// A plain text request for the given model.
    pub fn text(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            attachment: None,
            tool: None,
            image: None,
            video: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Option<AttachmentData>) -> Self {
        self.attachment = attachment;
        self
    }

    pub fn with_tool(mut self, tool: GroundingTool) -> Self {
        self.tool = Some(tool);
        self
    }

    pub fn with_image_params(mut self, image: ImageParams) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_video_params(mut self, video: VideoParams) -> Self {
        self.video = Some(video);
        self
    }
}

/// One streamed increment of a text generation.
///
/// `text` is a delta; accumulation into full-so-far content is the
/// dispatcher's job. Grounding metadata arrives on whichever chunks the API
/// chooses; the latest non-empty list wins.
#[derive(Debug, Clone, Default)]
pub struct StreamChunk {
    pub text: String,
    pub grounding: Option<Vec<GroundingChunk>>,
    pub usage: Option<Value>,
}

/// A typed part of a non-streaming generate-content response.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedPart {
    Text(String),
    /// Inline image bytes, still base64-encoded
    InlineImage { mime_type: String, data: String },
}

/// A pollable video generation job.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoJob {
    /// Operation resource name used for polling
    pub name: String,
    pub done: bool,
    /// Asset URI, present once the job reports done
    pub uri: Option<String>,
}

/// Boxed chunk stream returned by streaming generations.
pub type ChunkStream = BoxStream<'static, Result<StreamChunk>>;

/// Request/response surface of the hosted generation API.
///
/// # Errors
///
/// Implementations map transport failures to `StudioError::Http` and
/// API rejections to `StudioError::Upstream`; absent payloads are the
/// caller's concern (an empty part list is not an error here).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Submits a streaming text generation and returns its chunk stream.
    async fn stream_generate(&self, request: GenerationRequest) -> Result<ChunkStream>;

    /// Submits a single-shot generation and returns the typed parts.
    async fn generate_content(&self, request: GenerationRequest) -> Result<Vec<GeneratedPart>>;

    /// Starts a video job.
    async fn submit_video_job(&self, request: GenerationRequest) -> Result<VideoJob>;

    /// Fetches the current state of a video job.
    async fn poll_video_job(&self, job: &VideoJob) -> Result<VideoJob>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_encodes_standard_base64() {
        let attachment = AttachmentData::from_bytes(b"png-bytes", "image/png");
        assert_eq!(attachment.data, "cG5nLWJ5dGVz");
        assert_eq!(attachment.mime_type, "image/png");
    }

    #[test]
    fn request_builder_composes() {
        let request = GenerationRequest::text("gemini-2.5-flash", "hello")
            .with_tool(GroundingTool::Maps)
            .with_attachment(Some(AttachmentData::new("aaa", "image/jpeg")));
        assert_eq!(request.model, "gemini-2.5-flash");
        assert_eq!(request.tool, Some(GroundingTool::Maps));
        assert!(request.attachment.is_some());
        assert!(request.image.is_none());
    }
}
