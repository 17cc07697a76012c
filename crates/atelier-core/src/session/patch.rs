//! Artifact update messages.
//!
//! Generation tasks never touch artifacts directly. They emit
//! [`ArtifactUpdate`] messages which a single consumer applies to the
//! session state, so concurrent tasks can drive disjoint artifacts of the
//! same session without conflicting.

use serde::{Deserialize, Serialize};

use super::model::{Artifact, ArtifactKind, ArtifactMetadata, ArtifactStatus};

/// A full replacement of one artifact's mutable fields.
///
/// Applied last-wins. That is safe because streamed `content` is always the
/// cumulative full-so-far text, never a delta. `title` is fixed at creation
/// and never patched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactPatch {
    pub content: String,
    pub status: ArtifactStatus,
    pub kind: ArtifactKind,
    /// Replaces the artifact's metadata wholesale, including with `None`.
    pub metadata: Option<ArtifactMetadata>,
}

impl ArtifactPatch {
    /// Pending state for pathways that deliver no bytes until done
    /// (image, video).
    pub fn waiting(kind: ArtifactKind, metadata: Option<ArtifactMetadata>) -> Self {
        Self {
            content: String::new(),
            status: ArtifactStatus::Waiting,
            kind,
            metadata,
        }
    }

    /// In-flight cumulative content for streaming pathways.
    pub fn streaming(
        content: impl Into<String>,
        kind: ArtifactKind,
        metadata: Option<ArtifactMetadata>,
    ) -> Self {
        Self {
            content: content.into(),
            status: ArtifactStatus::Streaming,
            kind,
            metadata,
        }
    }

    /// The unique terminal success update.
    pub fn complete(
        content: impl Into<String>,
        kind: ArtifactKind,
        metadata: Option<ArtifactMetadata>,
    ) -> Self {
        Self {
            content: content.into(),
            status: ArtifactStatus::Complete,
            kind,
            metadata,
        }
    }

    /// Terminal failure: the artifact becomes an error card carrying the
    /// human-readable message as its content.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            status: ArtifactStatus::Error,
            kind: ArtifactKind::Error,
            metadata: None,
        }
    }

    /// Writes this patch into the target artifact.
    pub fn apply_to(self, artifact: &mut Artifact) {
        artifact.content = self.content;
        artifact.status = self.status;
        artifact.kind = self.kind;
        artifact.metadata = self.metadata;
    }
}

/// One update message from a generation task, keyed by session + artifact id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactUpdate {
    pub session_id: String,
    pub artifact_id: String,
    pub patch: ArtifactPatch,
}

impl ArtifactUpdate {
    pub fn new(
        session_id: impl Into<String>,
        artifact_id: impl Into<String>,
        patch: ArtifactPatch,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            artifact_id: artifact_id.into(),
            patch,
        }
    }
}
