//! Application layer for Atelier.
//!
//! This crate coordinates prompt dispatch, session state transitions, and
//! persistence between the domain types and the infrastructure backends.

pub mod dispatch;
pub mod placeholders;
pub mod state;
pub mod updates;

pub use dispatch::{BackendFactory, Dispatcher, VARIATION_PRESETS};
pub use placeholders::PlaceholderService;
pub use state::{StateSnapshot, StudioState};
pub use updates::{StudioUpdate, UpdateApplier, UpdateSink};
