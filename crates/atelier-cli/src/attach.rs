//! File attachments for the shell.

use std::path::Path;

use anyhow::{Context, Result};

use atelier_interaction::AttachmentData;

/// Reads a file into the inline form generation requests carry.
///
/// The mime type is inferred from the extension; anything unknown is sent
/// as `application/octet-stream`.
pub fn read_attachment(path: &Path) -> Result<AttachmentData> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Cannot read attachment {}", path.display()))?;
    let mime = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();
    Ok(AttachmentData::from_bytes(&bytes, mime))
}
