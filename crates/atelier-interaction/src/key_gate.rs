//! API-key-selection capability.
//!
//! Video generation requires a selected key in hosting environments that
//! meter it separately. The dispatcher checks the gate before submitting a
//! video job and invokes the selection flow when nothing is selected yet;
//! afterwards it rebuilds its client, since the selection may have changed
//! the effective key.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use atelier_core::Result;

/// Host capability for choosing the API key used by video generation.
#[async_trait]
pub trait KeyGate: Send + Sync {
    /// Whether a key has already been selected.
    async fn has_selected_key(&self) -> bool;

    /// Runs the interactive selection flow. Resolves once a key is chosen.
    async fn open_select_key(&self) -> Result<()>;
}

/// Environment-backed gate: selection is satisfied by having an API key at
/// all, and "opening" the selector just records that.
#[derive(Debug, Default)]
pub struct EnvKeyGate {
    selected: AtomicBool,
}

impl EnvKeyGate {
    pub fn new(already_selected: bool) -> Self {
        Self {
            selected: AtomicBool::new(already_selected),
        }
    }
}

#[async_trait]
impl KeyGate for EnvKeyGate {
    async fn has_selected_key(&self) -> bool {
        self.selected.load(Ordering::Relaxed)
    }

    async fn open_select_key(&self) -> Result<()> {
        self.selected.store(true, Ordering::Relaxed);
        Ok(())
    }
}
