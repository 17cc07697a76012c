//! Session archive on top of the key-value store.
//!
//! The entire session list is serialized as one JSON document under a fixed
//! key. Hydration is tolerant: a missing or unreadable document yields an
//! empty history instead of an error, so a damaged archive never blocks
//! startup.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use atelier_core::Result;
use atelier_core::kv::KvStore;
use atelier_core::session::{ArtifactStatus, Session, SessionArchive};

/// Storage key holding the archived session list.
pub const STORAGE_KEY: &str = "flash_ui_sessions_v3";

/// Session archive that stores the full session list as a single JSON
/// document in a [`KvStore`].
pub struct KvSessionArchive {
    store: Arc<dyn KvStore>,
    max_sessions: usize,
}

impl KvSessionArchive {
    /// Creates an archive with a retention cap: persisting keeps only the
    /// `max_sessions` most recent sessions.
    pub fn new(store: Arc<dyn KvStore>, max_sessions: usize) -> Self {
        Self {
            store,
            max_sessions,
        }
    }
}

#[async_trait]
impl SessionArchive for KvSessionArchive {
    async fn hydrate(&self) -> Result<Vec<Session>> {
        let Some(raw) = self.store.get(STORAGE_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(sessions) => Ok(sessions),
            Err(err) => {
                warn!("Discarding unreadable session archive: {err}");
                Ok(Vec::new())
            }
        }
    }

    async fn persist(&self, sessions: &[Session]) -> Result<()> {
        let mut snapshot: Vec<Session> = sessions.to_vec();

        // Streaming artifacts are archived without their partial text; the
        // status itself is kept.
        for session in &mut snapshot {
            for artifact in &mut session.artifacts {
                if artifact.status == ArtifactStatus::Streaming {
                    artifact.content = String::new();
                }
            }
        }

        // Sessions are appended in creation order, so the oldest sit at the
        // front; evict from there beyond the retention cap.
        if snapshot.len() > self.max_sessions {
            let excess = snapshot.len() - self.max_sessions;
            snapshot.drain(..excess);
        }

        let raw = serde_json::to_string(&snapshot)?;
        self.store.set(STORAGE_KEY, &raw).await
    }
}
