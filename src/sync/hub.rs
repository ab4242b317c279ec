//! Change notification
//!
//! Every committed write is published to the session's subscribers as a
//! full document.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::combat::CombatSession;

/// A committed session document and who wrote it
#[derive(Debug, Clone, Serialize)]
pub struct RemoteUpdate {
    /// Increases with every publish; later revisions supersede earlier ones
    pub revision: u64,
    /// Writer tag, if the writer supplied one
    pub origin: Option<String>,
    pub session: CombatSession,
}

/// Per-session broadcast channels
pub struct SessionHub {
    channels: Mutex<HashMap<String, broadcast::Sender<RemoteUpdate>>>,
    revision: AtomicU64,
    capacity: usize,
}

impl SessionHub {
    /// Create a hub; `capacity` is the per-session backlog before
    /// slow subscribers start skipping updates
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            revision: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Receive every update published for a session from now on
    pub fn subscribe(&self, session_id: &str) -> broadcast::Receiver<RemoteUpdate> {
        let mut channels = self.channels.lock();
        channels
            .entry(session_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Publish a committed document. Returns the revision assigned to it.
    pub fn publish(&self, origin: Option<String>, session: CombatSession) -> u64 {
        let mut channels = self.channels.lock();
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        let session_id = session.id.clone();

        let update = RemoteUpdate {
            revision,
            origin,
            session,
        };
        let delivered = match channels.get(&session_id) {
            Some(tx) => tx.send(update).unwrap_or(0),
            None => 0,
        };

        if delivered == 0 {
            // Nobody listening; drop the channel until someone subscribes again
            channels.remove(&session_id);
        }
        debug!(
            "published session {} revision {} to {} subscribers",
            session_id, revision, delivered
        );
        revision
    }

    /// Drop the channel for a session, disconnecting its subscribers
    pub fn close(&self, session_id: &str) {
        self.channels.lock().remove(session_id);
    }

    /// Drop the channel for a session if nobody is listening anymore
    pub fn release(&self, session_id: &str) {
        let mut channels = self.channels.lock();
        if channels
            .get(session_id)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            channels.remove(session_id);
        }
    }

    /// Revision of the most recent publish, 0 before the first
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Number of sessions with an open channel
    pub fn channel_count(&self) -> usize {
        self.channels.lock().len()
    }

    /// Number of live subscribers for a session
    pub fn subscriber_count(&self, session_id: &str) -> usize {
        self.channels
            .lock()
            .get(session_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new(64)
    }
}
