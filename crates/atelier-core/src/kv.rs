//! Local key-value store contract.

use async_trait::async_trait;

use crate::error::Result;

/// A minimal persistent key-value store, the studio's only durable
/// dependency.
///
/// Values are opaque strings. The session archive stores one JSON snapshot
/// under a single fixed key; nothing else in the studio writes here.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the stored value, or `None` when the key has never been set.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}
