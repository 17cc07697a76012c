//! GeminiClient - direct REST implementation of [`GenerationBackend`].
//!
//! This client calls the Gemini HTTP API directly without SDK dependency.
//! Text pathways use `streamGenerateContent?alt=sse`, image pathways use
//! `generateContent`, and video jobs run through the long-running
//! `predictLongRunning` operation endpoints.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use atelier_core::session::GroundingChunk;
use atelier_core::{Result, StudioError};

use crate::backend::{
    ChunkStream, GeneratedPart, GenerationBackend, GenerationRequest, GroundingTool, StreamChunk,
    VideoJob,
};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Generation backend that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    /// Creates a new client with the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{model}:{method}?key={api_key}",
            BASE_URL,
            api_key = self.api_key
        )
    }
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    async fn stream_generate(&self, request: GenerationRequest) -> Result<ChunkStream> {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            BASE_URL, request.model, self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(&build_content_body(&request))
            .send()
            .await
            .map_err(|err| StudioError::http(format!("Stream request failed: {err}")))?;
        let response = ensure_success(response).await?;

        // SSE events arrive as `data: {json}` lines; a network chunk can end
        // mid-line, so incomplete tails are carried into the next chunk.
        let mut carry = String::new();
        let chunks = response
            .bytes_stream()
            .flat_map(move |piece| {
                let events = match piece {
                    Ok(bytes) => {
                        carry.push_str(&String::from_utf8_lossy(&bytes));
                        drain_sse_events(&mut carry)
                    }
                    Err(err) => vec![Err(StudioError::http(format!(
                        "Stream transport failed: {err}"
                    )))],
                };
                stream::iter(events)
            })
            .boxed();

        Ok(chunks)
    }

    async fn generate_content(&self, request: GenerationRequest) -> Result<Vec<GeneratedPart>> {
        let url = self.model_url(&request.model, "generateContent");

        let response = self
            .client
            .post(url)
            .json(&build_content_body(&request))
            .send()
            .await
            .map_err(|err| StudioError::http(format!("Generation request failed: {err}")))?;
        let response = ensure_success(response).await?;

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            StudioError::http(format!("Failed to parse generation response: {err}"))
        })?;

        Ok(extract_parts(parsed))
    }

    async fn submit_video_job(&self, request: GenerationRequest) -> Result<VideoJob> {
        let url = self.model_url(&request.model, "predictLongRunning");

        let response = self
            .client
            .post(url)
            .json(&build_video_body(&request))
            .send()
            .await
            .map_err(|err| StudioError::http(format!("Video submit failed: {err}")))?;
        let response = ensure_success(response).await?;

        let parsed: OperationResponse = response
            .json()
            .await
            .map_err(|err| StudioError::http(format!("Failed to parse video operation: {err}")))?;

        operation_to_job(parsed)
    }

    async fn poll_video_job(&self, job: &VideoJob) -> Result<VideoJob> {
        // The operation name is a full resource path relative to the API root.
        let url = format!("{}/{}?key={}", BASE_URL, job.name, self.api_key);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| StudioError::http(format!("Video poll failed: {err}")))?;
        let response = ensure_success(response).await?;

        let parsed: OperationResponse = response
            .json()
            .await
            .map_err(|err| StudioError::http(format!("Failed to parse video operation: {err}")))?;

        operation_to_job(parsed)
    }
}

fn build_content_body(request: &GenerationRequest) -> GenerateContentRequest {
    let mut parts = Vec::new();

    // Attachment part goes first so the text reads as an instruction on it.
    if let Some(attachment) = &request.attachment {
        parts.push(Part::InlineData {
            inline_data: InlineDataPayload {
                mime_type: attachment.mime_type.clone(),
                data: attachment.data.clone(),
            },
        });
    }
    parts.push(Part::Text {
        text: request.prompt.clone(),
    });

    let tools = request.tool.map(|tool| {
        vec![match tool {
            GroundingTool::WebSearch => ToolPayload {
                google_search: Some(EmptyPayload {}),
                google_maps: None,
            },
            GroundingTool::Maps => ToolPayload {
                google_search: None,
                google_maps: Some(EmptyPayload {}),
            },
        }]
    });

    let generation_config = request.image.as_ref().map(|image| GenerationConfigPayload {
        image_config: ImageConfigPayload {
            image_size: image.size.clone(),
            aspect_ratio: image.aspect_ratio.clone(),
        },
    });

    GenerateContentRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts,
        }],
        tools,
        generation_config,
    }
}

fn build_video_body(request: &GenerationRequest) -> VideoGenerationRequest {
    let params = request.video.clone().unwrap_or_default();

    VideoGenerationRequest {
        instances: vec![VideoInstance {
            prompt: request.prompt.clone(),
            image: request
                .attachment
                .as_ref()
                .map(|attachment| VideoImagePayload {
                    bytes_base64_encoded: attachment.data.clone(),
                    mime_type: attachment.mime_type.clone(),
                }),
        }],
        parameters: VideoParametersPayload {
            number_of_videos: params.number_of_videos,
            resolution: params.resolution,
            aspect_ratio: params.aspect_ratio,
        },
    }
}

/// Splits complete `data:` lines out of the carry buffer, leaving a trailing
/// partial line in place for the next network chunk.
fn drain_sse_events(carry: &mut String) -> Vec<Result<StreamChunk>> {
    let mut events = Vec::new();
    while let Some(pos) = carry.find('\n') {
        let line: String = carry.drain(..=pos).collect();
        let line = line.trim_end();
        let Some(payload) = line.strip_prefix("data: ") else {
            continue;
        };
        if payload == "[DONE]" {
            continue;
        }
        match serde_json::from_str::<GenerateContentResponse>(payload) {
            Ok(parsed) => events.push(Ok(to_stream_chunk(parsed))),
            Err(err) => {
                tracing::debug!("Skipping unparseable stream event: {err}");
            }
        }
    }
    events
}

fn to_stream_chunk(response: GenerateContentResponse) -> StreamChunk {
    let mut chunk = StreamChunk {
        usage: response.usage_metadata,
        ..Default::default()
    };

    let Some(candidate) = response.candidates.and_then(|list| list.into_iter().next()) else {
        return chunk;
    };

    if let Some(content) = candidate.content {
        for part in content.parts {
            if let Some(text) = part.text {
                chunk.text.push_str(&text);
            }
        }
    }

    chunk.grounding = candidate
        .grounding_metadata
        .map(|metadata| metadata.grounding_chunks)
        .filter(|chunks| !chunks.is_empty());

    chunk
}

fn extract_parts(response: GenerateContentResponse) -> Vec<GeneratedPart> {
    response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .filter_map(|part| {
            if let Some(inline) = part.inline_data {
                return Some(GeneratedPart::InlineImage {
                    mime_type: inline.mime_type.unwrap_or_else(|| "image/png".to_string()),
                    data: inline.data,
                });
            }
            part.text.map(GeneratedPart::Text)
        })
        .collect()
}

fn operation_to_job(operation: OperationResponse) -> Result<VideoJob> {
    if let Some(error) = operation.error {
        let message = error
            .message
            .unwrap_or_else(|| "Video operation failed".to_string());
        let status = error
            .code
            .and_then(|code| u16::try_from(code).ok())
            .unwrap_or(500);
        return Err(StudioError::upstream(status, message, false));
    }

    let uri = operation
        .response
        .and_then(|result| result.generate_video_response)
        .and_then(|videos| videos.generated_samples.into_iter().next())
        .and_then(|sample| sample.video)
        .and_then(|video| video.uri);

    Ok(VideoJob {
        name: operation.name,
        done: operation.done,
        uri,
    })
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    Err(map_http_error(status, body_text))
}

fn map_http_error(status: StatusCode, body: String) -> StudioError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    let retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    StudioError::upstream(status.as_u16(), message, retryable)
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolPayload>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfigPayload>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct ToolPayload {
    #[serde(rename = "googleSearch", skip_serializing_if = "Option::is_none")]
    google_search: Option<EmptyPayload>,
    #[serde(rename = "googleMaps", skip_serializing_if = "Option::is_none")]
    google_maps: Option<EmptyPayload>,
}

#[derive(Serialize)]
struct EmptyPayload {}

#[derive(Serialize)]
struct GenerationConfigPayload {
    #[serde(rename = "imageConfig")]
    image_config: ImageConfigPayload,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfigPayload {
    image_size: String,
    aspect_ratio: String,
}

#[derive(Serialize)]
struct VideoGenerationRequest {
    instances: Vec<VideoInstance>,
    parameters: VideoParametersPayload,
}

#[derive(Serialize)]
struct VideoInstance {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<VideoImagePayload>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoImagePayload {
    bytes_base64_encoded: String,
    mime_type: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoParametersPayload {
    number_of_videos: u32,
    resolution: String,
    aspect_ratio: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<Value>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
    #[serde(rename = "groundingMetadata")]
    grounding_metadata: Option<GroundingMetadataResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineDataResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataResponse {
    mime_type: Option<String>,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadataResponse {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
struct OperationResponse {
    name: String,
    #[serde(default)]
    done: bool,
    response: Option<OperationResult>,
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResult {
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Deserialize)]
struct GeneratedSample {
    video: Option<VideoRef>,
}

#[derive(Deserialize)]
struct VideoRef {
    uri: Option<String>,
}
