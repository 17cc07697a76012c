pub mod config;
pub mod error;
pub mod intent;
pub mod kv;
pub mod placeholder;
pub mod session;

// Re-export common error type
pub use error::{Result, StudioError};
pub use intent::{Intent, classify};
