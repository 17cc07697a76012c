//! Persistence contract for the session history.

use async_trait::async_trait;

use crate::error::Result;
use crate::session::model::Session;

/// Snapshot persistence for the whole ordered session list.
///
/// There is no incremental write path: implementations rewrite the entire
/// list on every `persist` call, mirroring how the studio treats the history
/// as one value under one key.
#[async_trait]
pub trait SessionArchive: Send + Sync {
    /// Restores the full session list, oldest first.
    ///
    /// A missing snapshot yields an empty list. Implementations should also
    /// treat an unreadable snapshot as empty (logged) rather than failing,
    /// so a corrupt cache never blocks startup.
    async fn hydrate(&self) -> Result<Vec<Session>>;

    /// Rewrites the whole snapshot from the given list.
    ///
    /// Implementations must never persist partial stream content: any
    /// artifact still `Streaming` is stored with empty content, status
    /// preserved.
    async fn persist(&self, sessions: &[Session]) -> Result<()>;
}
