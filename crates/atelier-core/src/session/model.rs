//! Session domain model.
//!
//! This module contains the Session and Artifact entities that represent
//! one submitted prompt and the generated output it produced.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// How an artifact's `content` string must be interpreted by a renderer.
///
/// `kind` and `status` jointly drive rendering: a `Streaming` text artifact
/// shows partial markdown, a `Waiting` video artifact shows a spinner, a
/// `Complete` image artifact treats `content` as a data URL, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Self-contained interactive markup fragment
    Html,
    /// Base64 data URL or remote image URL
    Image,
    /// Playable video URL
    Video,
    /// Markdown-ish text
    Text,
    /// Human-readable failure message
    Error,
}

/// Lifecycle status of a single artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    /// Request submitted, no bytes exist yet (image/video pathways)
    Waiting,
    /// Partial content, growing monotonically (text/html pathways)
    Streaming,
    /// Terminal: content is final
    Complete,
    /// Terminal: content is the failure message
    Error,
}

impl ArtifactStatus {
    /// Whether this status ends the artifact's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// A web search citation attached to a grounded text result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSource {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A map location citation attached to a grounded text result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapsSource {
    #[serde(rename = "placeId")]
    pub place_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// One external source reference, either a web page or a map place.
///
/// Field names follow the generation API's camelCase so grounding metadata
/// passes through untranslated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps: Option<MapsSource>,
}

/// Optional per-artifact metadata captured from the generation API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Display name of the backing model (e.g. "Gemini 3 Flash")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Source references accumulated from grounded streaming responses
    #[serde(
        rename = "groundingChunks",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
    /// Opaque usage accounting blob, stored as-is
    #[serde(
        rename = "usageMetadata",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub usage_metadata: Option<Value>,
}

impl ArtifactMetadata {
    /// Metadata carrying only a model display name.
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Default::default()
        }
    }

    /// Metadata carrying a model name plus accumulated grounding chunks.
    pub fn grounded(model: impl Into<String>, chunks: Option<Vec<GroundingChunk>>) -> Self {
        Self {
            model: Some(model.into()),
            grounding_chunks: chunks,
            ..Default::default()
        }
    }
}

/// One unit of generated output with its own lifecycle status.
///
/// An artifact is created in a pending state when a prompt is submitted and
/// is then patched in place (by id) as generation progresses. Its `id` is
/// unique within the owning session, `"{session_id}_{index}"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Identifier, unique within the session
    pub id: String,
    /// Content interpretation tag
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    /// Display title ("Thinking...", a style preset name, ...)
    pub title: String,
    /// Raw HTML, image data URL, video URL, or text, per `kind`
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ArtifactMetadata>,
    pub status: ArtifactStatus,
}

impl Artifact {
    /// Composes the scoped artifact id for a session slot.
    pub fn scoped_id(session_id: &str, index: usize) -> String {
        format!("{}_{}", session_id, index)
    }

    /// A freshly-submitted artifact: text kind, empty content, streaming.
    ///
    /// The first dispatch update replaces kind/status with the pathway's
    /// real pending shape (waiting video, streaming html, ...).
    pub fn pending(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ArtifactKind::Text,
            title: title.into(),
            content: String::new(),
            metadata: None,
            status: ArtifactStatus::Streaming,
        }
    }
}

/// One user prompt plus the artifact(s) it produced.
///
/// Immutable except for `artifacts`, whose elements are patched in place as
/// generation progresses. Sessions are never deleted individually; the
/// archive's retention cap evicts oldest-first at persist time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque unique identifier
    pub id: String,
    /// The submitted prompt, verbatim
    pub prompt: String,
    /// Creation time, epoch milliseconds
    pub timestamp: i64,
    /// Ordered outputs; one element in single-result mode, three in
    /// variations mode
    pub artifacts: Vec<Artifact>,
}

impl Session {
    /// Creates a session with a fresh id and the current wall-clock time.
    pub fn new(prompt: impl Into<String>, artifacts: Vec<Artifact>) -> Self {
        Self::with_id(new_session_id(), prompt, artifacts)
    }

    /// Creates a session with a caller-provided id (the dispatcher composes
    /// artifact ids from the session id before constructing the session).
    pub fn with_id(
        id: impl Into<String>,
        prompt: impl Into<String>,
        artifacts: Vec<Artifact>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            timestamp: Utc::now().timestamp_millis(),
            artifacts,
        }
    }

    /// Looks up an artifact by its scoped id.
    pub fn artifact_mut(&mut self, artifact_id: &str) -> Option<&mut Artifact> {
        self.artifacts.iter_mut().find(|a| a.id == artifact_id)
    }

    /// Whether every artifact has reached a terminal status.
    pub fn is_settled(&self) -> bool {
        self.artifacts.iter().all(|a| a.status.is_terminal())
    }
}

/// Generates an opaque session id (UUID v4, simple form).
pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_id_concatenates_session_and_index() {
        assert_eq!(Artifact::scoped_id("abc123", 0), "abc123_0");
        assert_eq!(Artifact::scoped_id("abc123", 2), "abc123_2");
    }

    #[test]
    fn pending_artifact_starts_streaming_and_empty() {
        let artifact = Artifact::pending("s_0", "Thinking...");
        assert_eq!(artifact.status, ArtifactStatus::Streaming);
        assert_eq!(artifact.kind, ArtifactKind::Text);
        assert!(artifact.content.is_empty());
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let artifact = Artifact {
            id: "s_0".to_string(),
            kind: ArtifactKind::Html,
            title: "Architecting...".to_string(),
            content: "<div/>".to_string(),
            metadata: Some(ArtifactMetadata::grounded(
                "Gemini 3 Flash",
                Some(vec![GroundingChunk {
                    web: Some(WebSource {
                        uri: "https://example.com".to_string(),
                        title: None,
                    }),
                    maps: None,
                }]),
            )),
            status: ArtifactStatus::Complete,
        };

        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["type"], "html");
        assert_eq!(json["status"], "complete");
        assert_eq!(
            json["metadata"]["groundingChunks"][0]["web"]["uri"],
            "https://example.com"
        );
    }

    #[test]
    fn maps_source_uses_place_id_wire_name() {
        let chunk = GroundingChunk {
            web: None,
            maps: Some(MapsSource {
                place_id: "pl_1".to_string(),
                title: Some("Cafe".to_string()),
            }),
        };
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["maps"]["placeId"], "pl_1");
    }

    #[test]
    fn session_settles_only_when_all_artifacts_terminal() {
        let mut session = Session::new(
            "draw two things",
            vec![Artifact::pending("s_0", "A"), Artifact::pending("s_1", "B")],
        );
        assert!(!session.is_settled());

        session.artifacts[0].status = ArtifactStatus::Complete;
        assert!(!session.is_settled());

        session.artifacts[1].status = ArtifactStatus::Error;
        assert!(session.is_settled());
    }
}
