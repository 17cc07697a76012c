//! File-backed key-value store.
//!
//! Each entry lives in its own file under a base directory, named by the
//! sanitized key. Values are written verbatim; callers own the encoding.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use atelier_core::kv::KvStore;
use atelier_core::{Result, StudioError};

use crate::paths::AtelierPaths;

/// Key-value store that keeps one file per entry.
pub struct FileKvStore {
    base_dir: PathBuf,
}

impl FileKvStore {
    /// Creates a store at the default location
    /// (~/.local/share/atelier/store).
    pub async fn default_location() -> Result<Self> {
        Self::new(AtelierPaths::store_dir()?).await
    }

    /// Creates a store rooted at `base_dir`, creating the directory if it
    /// does not exist yet.
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();

        fs::create_dir_all(&base_dir)
            .await
            .map_err(|err| StudioError::io(format!("Failed to create store directory: {err}")))?;

        Ok(Self { base_dir })
    }

    /// Returns the directory entries are stored in.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(sanitize_key(key))
    }
}

/// Maps a key to a filename-safe form. Anything outside `[A-Za-z0-9_-]`
/// becomes `_`, so a key can never address a path outside the base
/// directory.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.entry_path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::write(self.entry_path(key), value)
            .await
            .map_err(|err| StudioError::io(format!("Failed to write store entry: {err}")))?;
        Ok(())
    }
}
