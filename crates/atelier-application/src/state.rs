//! In-memory studio state and its transition functions.
//!
//! All session mutation funnels through `StudioState`, which is owned by the
//! single update consumer. The render layer never touches it directly; it
//! works from owned [`StateSnapshot`] values instead.

use atelier_core::error::{Result, StudioError};
use atelier_core::session::{ArtifactKind, ArtifactPatch, ArtifactStatus, Session};

/// The full session history plus the shell's current selection.
///
/// Sessions are kept in creation order, newest at the back. Appending a
/// session moves the selection onto it.
#[derive(Debug, Default)]
pub struct StudioState {
    sessions: Vec<Session>,
    current: Option<usize>,
}

impl StudioState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores hydrated history and selects the most recent session.
    pub fn from_history(sessions: Vec<Session>) -> Self {
        let current = sessions.len().checked_sub(1);
        Self { sessions, current }
    }

    /// Appends a freshly-submitted session and selects it.
    pub fn append(&mut self, session: Session) {
        tracing::debug!("[StudioState] Appending session: id={}", session.id);
        self.sessions.push(session);
        self.current = Some(self.sessions.len() - 1);
    }

    /// Applies one artifact patch, keyed by session and artifact id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when either id does not resolve.
    pub fn patch_artifact(
        &mut self,
        session_id: &str,
        artifact_id: &str,
        patch: ArtifactPatch,
    ) -> Result<()> {
        let session = self
            .session_mut(session_id)
            .ok_or_else(|| StudioError::not_found("Session", session_id))?;
        let artifact = session
            .artifact_mut(artifact_id)
            .ok_or_else(|| StudioError::not_found("Artifact", artifact_id))?;
        patch.apply_to(artifact);
        Ok(())
    }

    /// Turns every artifact of a session into an error card carrying the
    /// given message. Metadata already captured stays on the card.
    pub fn fail_session(&mut self, session_id: &str, message: &str) -> Result<()> {
        let session = self
            .session_mut(session_id)
            .ok_or_else(|| StudioError::not_found("Session", session_id))?;
        for artifact in &mut session.artifacts {
            artifact.status = ArtifactStatus::Error;
            artifact.kind = ArtifactKind::Error;
            artifact.content = message.to_string();
        }
        tracing::debug!(
            "[StudioState] Session failed: id={}, message={}",
            session_id,
            message
        );
        Ok(())
    }

    /// Moves the selection. Returns false when the index is out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.sessions.len() {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.and_then(|index| self.sessions.get(index))
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// An owned copy of the state for the render layer.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            sessions: self.sessions.clone(),
            current: self.current,
        }
    }

    fn session_mut(&mut self, session_id: &str) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == session_id)
    }
}

/// Owned view of the studio state at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateSnapshot {
    pub sessions: Vec<Session>,
    pub current: Option<usize>,
}

impl StateSnapshot {
    pub fn current_session(&self) -> Option<&Session> {
        self.current.and_then(|index| self.sessions.get(index))
    }
}
