//! Update channel between generation tasks and the state owner.
//!
//! Generation tasks run concurrently but never touch [`StudioState`]. They
//! emit [`StudioUpdate`] messages through a cloneable [`UpdateSink`]; the
//! [`UpdateApplier`] owns the state, applies updates in arrival order,
//! persists the session list after each mutation, and publishes a fresh
//! snapshot for the render layer.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use atelier_core::session::{ArtifactPatch, ArtifactUpdate, Session, SessionArchive};

use crate::state::{StateSnapshot, StudioState};

/// A state mutation requested by the shell or a generation task.
#[derive(Debug, Clone)]
pub enum StudioUpdate {
    /// A new session was submitted; append and select it.
    SessionStarted(Session),
    /// One artifact changed.
    Artifact(ArtifactUpdate),
    /// A whole session failed; every artifact becomes an error card.
    SessionFailed { session_id: String, message: String },
    /// The shell moved its selection.
    SessionSelected(usize),
}

/// Cloneable sender half handed to the dispatcher and the shell.
///
/// Sends never block. A closed channel means the applier is shutting down
/// and the update is dropped.
#[derive(Debug, Clone)]
pub struct UpdateSink {
    sender: mpsc::UnboundedSender<StudioUpdate>,
}

impl UpdateSink {
    /// Creates a sink and the receiver an applier will drain.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StudioUpdate>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn session_started(&self, session: Session) {
        let _ = self.sender.send(StudioUpdate::SessionStarted(session));
    }

    pub fn artifact(&self, session_id: &str, artifact_id: &str, patch: ArtifactPatch) {
        let _ = self
            .sender
            .send(StudioUpdate::Artifact(ArtifactUpdate::new(
                session_id,
                artifact_id,
                patch,
            )));
    }

    pub fn session_failed(&self, session_id: &str, message: &str) {
        let _ = self.sender.send(StudioUpdate::SessionFailed {
            session_id: session_id.to_string(),
            message: message.to_string(),
        });
    }

    pub fn session_selected(&self, index: usize) {
        let _ = self.sender.send(StudioUpdate::SessionSelected(index));
    }
}

/// Single owner of the studio state.
///
/// Updates apply strictly in arrival order. Streamed content is cumulative,
/// so last-applied-wins needs no extra sequencing.
pub struct UpdateApplier {
    state: StudioState,
    archive: Arc<dyn SessionArchive>,
    receiver: mpsc::UnboundedReceiver<StudioUpdate>,
    snapshots: watch::Sender<StateSnapshot>,
}

impl UpdateApplier {
    /// Wires an applier to a fresh update channel.
    ///
    /// Returns the sink for producers and the snapshot receiver for the
    /// render layer alongside the applier itself.
    pub fn new(
        state: StudioState,
        archive: Arc<dyn SessionArchive>,
    ) -> (Self, UpdateSink, watch::Receiver<StateSnapshot>) {
        let (sink, receiver) = UpdateSink::channel();
        let (snapshots, snapshot_rx) = watch::channel(state.snapshot());
        let applier = Self {
            state,
            archive,
            receiver,
            snapshots,
        };
        (applier, sink, snapshot_rx)
    }

    /// Drains the update channel until every sink is dropped.
    pub async fn run(mut self) {
        while let Some(update) = self.receiver.recv().await {
            let mutated = self.apply(update);
            if mutated {
                if let Err(err) = self.archive.persist(self.state.sessions()).await {
                    tracing::warn!("[UpdateApplier] Failed to persist sessions: {}", err);
                }
            }
            let _ = self.snapshots.send(self.state.snapshot());
        }
        tracing::debug!("[UpdateApplier] Update channel closed, stopping");
    }

    /// Applies one update. Returns whether the session list changed.
    fn apply(&mut self, update: StudioUpdate) -> bool {
        match update {
            StudioUpdate::SessionStarted(session) => {
                self.state.append(session);
                true
            }
            StudioUpdate::Artifact(update) => {
                match self
                    .state
                    .patch_artifact(&update.session_id, &update.artifact_id, update.patch)
                {
                    Ok(()) => true,
                    Err(err) => {
                        tracing::warn!("[UpdateApplier] Dropping artifact update: {}", err);
                        false
                    }
                }
            }
            StudioUpdate::SessionFailed {
                session_id,
                message,
            } => match self.state.fail_session(&session_id, &message) {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!("[UpdateApplier] Dropping session failure: {}", err);
                    false
                }
            },
            StudioUpdate::SessionSelected(index) => {
                // Selection is view state: published, never persisted.
                if !self.state.select(index) {
                    tracing::debug!("[UpdateApplier] Ignoring out-of-range selection: {}", index);
                }
                false
            }
        }
    }
}
