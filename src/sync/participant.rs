//! A participant's local copy of a shared session
//!
//! Local commands apply immediately and are then written through the
//! gateway. Documents written by anyone else replace the local copy in
//! full (last writer wins). Updates at or below the last revision this
//! participant wrote or applied are stale and skipped.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

use super::{authorize, CommandError, RemoteUpdate, SyncError, SyncGateway};
use crate::combat::CombatController;
use crate::commands::Command;

/// One user's view of a session
pub struct Participant {
    /// Origin tag attached to this participant's writes
    id: String,
    user: String,
    controller: CombatController,
    gateway: Arc<SyncGateway>,
    updates: broadcast::Receiver<RemoteUpdate>,
    /// Highest revision reflected in local state
    revision: u64,
}

impl Participant {
    /// Open a session as `user`
    pub async fn join(
        gateway: Arc<SyncGateway>,
        session_id: &str,
        user: &str,
    ) -> Result<Self, SyncError> {
        let feed = gateway.open(session_id, user).await?;

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            user: user.to_string(),
            controller: feed.controller,
            gateway,
            updates: feed.updates,
            revision: feed.revision,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Local session state
    pub fn controller(&self) -> &CombatController {
        &self.controller
    }

    /// Apply a command locally, then persist it.
    ///
    /// A sync failure is returned but the local change stays in place;
    /// call [`Participant::flush`] to try the write again.
    pub async fn execute(&mut self, command: Command) -> Result<bool, CommandError> {
        authorize(&self.controller, &self.user, &command)?;

        let name = command.name();
        let changed = command.apply(&mut self.controller)?;
        if changed {
            debug!("{} ran {} locally on {}", self.user, name, self.controller.id());
            self.revision = self
                .gateway
                .persist(&mut self.controller, Some(&self.id))
                .await?;
        }
        Ok(changed)
    }

    /// Write the current local state as-is
    pub async fn flush(&mut self) -> Result<(), SyncError> {
        self.revision = self
            .gateway
            .persist(&mut self.controller, Some(&self.id))
            .await?;
        Ok(())
    }

    /// Replace local state with a document written elsewhere.
    ///
    /// Stale revisions, echoes of this participant's own writes and
    /// documents for other sessions are ignored. Returns true when local
    /// state was replaced.
    pub fn apply_remote(&mut self, update: RemoteUpdate) -> bool {
        if update.revision <= self.revision {
            return false;
        }
        if update.origin.as_deref() == Some(self.id.as_str()) {
            self.revision = update.revision;
            return false;
        }
        if update.session.id != self.controller.id() {
            return false;
        }
        self.revision = update.revision;
        self.controller.replace(update.session);
        true
    }

    /// Apply every pending remote update without waiting.
    /// Returns how many replaced local state.
    pub fn sync_remote(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.updates.try_recv() {
                Ok(update) => {
                    if self.apply_remote(update) {
                        applied += 1;
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("{} skipped {} stale updates", self.user, skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        applied
    }

    /// Wait for the next document written by someone else and apply it.
    /// Returns None once the session's channel is closed.
    pub async fn next_remote(&mut self) -> Option<()> {
        loop {
            match self.updates.recv().await {
                Ok(update) => {
                    if self.apply_remote(update) {
                        return Some(());
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("{} skipped {} stale updates", self.user, skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
