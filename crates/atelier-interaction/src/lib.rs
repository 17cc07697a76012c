//! Interaction layer for the Atelier studio.
//!
//! Defines the generation backend contract the dispatcher works against,
//! the Gemini REST implementation of it, and the key gate consulted before
//! video submission.

pub mod backend;
pub mod gemini_client;
pub mod key_gate;

pub use backend::{
    AttachmentData, ChunkStream, GeneratedPart, GenerationBackend, GenerationRequest,
    GroundingTool, ImageParams, StreamChunk, VideoJob, VideoParams,
};
pub use gemini_client::GeminiClient;
pub use key_gate::{EnvKeyGate, KeyGate};
