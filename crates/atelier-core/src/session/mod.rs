//! Session domain: sessions, artifacts, and the update messages that
//! mutate them.

pub mod model;
pub mod patch;
pub mod repository;

pub use model::{
    Artifact, ArtifactKind, ArtifactMetadata, ArtifactStatus, GroundingChunk, MapsSource, Session,
    WebSource, new_session_id,
};
pub use patch::{ArtifactPatch, ArtifactUpdate};
pub use repository::SessionArchive;
