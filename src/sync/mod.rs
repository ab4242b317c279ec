//! Session sync gateway
//!
//! Bridges in-memory controllers and the shared session documents:
//! - Session creation under a fresh identifier
//! - Full-document writes after every mutation
//! - Change notification to other participants
//! - Last-writer-wins reconciliation
//! - Discovery of a user's sessions

mod hub;
mod participant;
mod store;
mod summary;

use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::combat::{CombatController, CombatSession, ValidationError};
use crate::commands::Command;
pub use hub::{RemoteUpdate, SessionHub};
pub use participant::Participant;
pub use store::SessionStore;
pub use summary::{session_label, SessionRole, SessionSummary};

/// Reading or writing a session document failed
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("session not found: {0}")]
    NotFound(String),

    #[error("{user} may not access session {session}")]
    AccessDenied { user: String, session: String },

    #[error("session owner must not be empty")]
    InvalidOwner,
}

/// Failure to execute a command against a shared session
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Check that `user` may run `command` on the session
pub fn authorize(
    controller: &CombatController,
    user: &str,
    command: &Command,
) -> Result<(), SyncError> {
    let session = controller.session();
    let allowed = if command.requires_dungeon_master() {
        session.is_dungeon_master(user)
    } else {
        session.can_access(user)
    };

    if allowed {
        Ok(())
    } else {
        Err(SyncError::AccessDenied {
            user: user.to_string(),
            session: session.id.clone(),
        })
    }
}

/// A session as loaded for one user, plus every update committed after it
pub struct SessionFeed {
    pub controller: CombatController,
    pub updates: broadcast::Receiver<RemoteUpdate>,
    /// Revision the loaded document reflects; updates at or below it are
    /// already part of it
    pub revision: u64,
}

/// Store plus change notification for combat sessions
pub struct SyncGateway {
    store: SessionStore,
    hub: SessionHub,
    /// Held across write and publish so revisions follow store order
    write_lock: Mutex<()>,
}

impl SyncGateway {
    /// Create a gateway over a database pool
    pub fn new(pool: SqlitePool, broadcast_capacity: usize) -> Self {
        Self {
            store: SessionStore::new(pool),
            hub: SessionHub::new(broadcast_capacity),
            write_lock: Mutex::new(()),
        }
    }

    /// Get the document store
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Get the notification hub
    pub fn hub(&self) -> &SessionHub {
        &self.hub
    }

    /// Write an empty session owned by `user` and return its id
    pub async fn create_session(&self, user: &str) -> Result<String, SyncError> {
        let user = user.trim();
        if user.is_empty() {
            return Err(SyncError::InvalidOwner);
        }

        let id = uuid::Uuid::now_v7().to_string();
        let session = CombatSession::new(id.clone(), user);
        self.store.insert(&session).await?;

        info!("created combat session {} for {}", id, user);
        Ok(id)
    }

    /// Load a session into a fresh controller
    pub async fn load(&self, id: &str) -> Result<CombatController, SyncError> {
        let session = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| SyncError::NotFound(id.to_string()))?;
        Ok(CombatController::new(session))
    }

    /// Load a session the user is allowed to see
    pub async fn load_for(&self, id: &str, user: &str) -> Result<CombatController, SyncError> {
        let controller = self.load(id).await?;
        if !controller.can_access(user) {
            return Err(SyncError::AccessDenied {
                user: user.to_string(),
                session: id.to_string(),
            });
        }
        Ok(controller)
    }

    /// Write the controller's full state and notify subscribers.
    ///
    /// `updated_at` is refreshed first. On failure the controller keeps
    /// its local changes; nothing is retried. Returns the revision the
    /// write was published under.
    pub async fn persist(
        &self,
        controller: &mut CombatController,
        origin: Option<&str>,
    ) -> Result<u64, SyncError> {
        let _guard = self.write_lock.lock().await;
        controller.touch();

        if let Err(e) = self.store.put(controller.session()).await {
            warn!("failed to persist session {}: {}", controller.id(), e);
            return Err(e);
        }

        debug!(
            "persisted session {} (round {}, turn {})",
            controller.id(),
            controller.current_round(),
            controller.current_turn_index()
        );

        Ok(self
            .hub
            .publish(origin.map(str::to_string), controller.session().clone()))
    }

    /// Load a session for `user` and follow its changes.
    ///
    /// Access is checked before any channel is opened. Writers publish
    /// under the same lock, so no commit falls between the load and the
    /// subscription.
    pub async fn open(&self, id: &str, user: &str) -> Result<SessionFeed, SyncError> {
        let _guard = self.write_lock.lock().await;
        let controller = self.load_for(id, user).await?;
        let updates = self.hub.subscribe(id);

        Ok(SessionFeed {
            controller,
            updates,
            revision: self.hub.revision(),
        })
    }

    /// Load, mutate and persist in one cycle on behalf of `user`.
    ///
    /// Returns the resulting document. Commands that change nothing are
    /// not written.
    pub async fn execute(
        &self,
        id: &str,
        user: &str,
        command: Command,
        origin: Option<&str>,
    ) -> Result<CombatSession, CommandError> {
        let mut controller = self.load(id).await?;
        authorize(&controller, user, &command)?;

        let name = command.name();
        if command.apply(&mut controller)? {
            debug!("{} ran {} on session {}", user, name, id);
            self.persist(&mut controller, origin).await?;
        }
        Ok(controller.into_session())
    }

    /// Sessions where the user is dungeon master or player, newest first
    pub async fn find_sessions(&self, user: &str) -> Result<Vec<SessionSummary>, SyncError> {
        let sessions = self.store.find_for_user(user).await?;
        Ok(sessions
            .iter()
            .map(|s| SessionSummary::for_user(s, user))
            .collect())
    }

    /// Delete a session. Only its dungeon master may do this.
    pub async fn delete_session(&self, id: &str, user: &str) -> Result<(), SyncError> {
        let controller = self.load(id).await?;
        if !controller.session().is_dungeon_master(user) {
            return Err(SyncError::AccessDenied {
                user: user.to_string(),
                session: id.to_string(),
            });
        }

        let _guard = self.write_lock.lock().await;
        self.store.delete(id).await?;
        self.hub.close(id);
        info!("deleted combat session {}", id);
        Ok(())
    }
}
