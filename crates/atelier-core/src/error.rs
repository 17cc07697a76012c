//! Error types for the Atelier studio.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire studio.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
///
/// Variants that end up as artifact content (`InvalidInput`,
/// `MissingPayload`) display as the bare message, because the dispatch
/// boundary renders `to_string()` directly into the error card.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum StudioError {
    /// The submitted input cannot be dispatched as requested
    /// (e.g. a required attachment is missing)
    #[error("{0}")]
    InvalidInput(String),

    /// The generation API rejected a request
    #[error("Generation API error ({status}): {message}")]
    Upstream {
        status: u16,
        message: String,
        retryable: bool,
    },

    /// The generation API answered but the expected payload was absent
    #[error("{0}")]
    MissingPayload(String),

    /// HTTP transport error (connection, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StudioError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an Upstream error
    pub fn upstream(status: u16, message: impl Into<String>, retryable: bool) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
            retryable,
        }
    }

    /// Creates a MissingPayload error
    pub fn missing_payload(message: impl Into<String>) -> Self {
        Self::MissingPayload(message.into())
    }

    /// Creates an HTTP transport error
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an InvalidInput error
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Check if this is an Upstream error
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }

    /// Check if this error is worth retrying (rate limits, server-side
    /// failures). Transport errors are not classified as retryable here;
    /// the dispatch boundary never retries either way.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream { retryable: true, .. })
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an IO error
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// The message rendered into an error artifact's content.
    ///
    /// Falls back to `"Generation Failed"` when the display form is empty,
    /// so an error card never shows a blank body.
    pub fn artifact_message(&self) -> String {
        let message = self.to_string();
        if message.is_empty() {
            "Generation Failed".to_string()
        } else {
            message
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for StudioError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for StudioError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for StudioError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for StudioError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for StudioError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

/// A type alias for `Result<T, StudioError>`.
pub type Result<T> = std::result::Result<T, StudioError>;
