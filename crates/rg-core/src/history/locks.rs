//! Per-session mutual exclusion
//!
//! Serialises work on a single session's history (an exchange being
//! recorded, an eviction clearing it) without blocking other sessions.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// Map of session id to its async lock.
///
/// An entry lives only while some caller holds or waits for it.
#[derive(Clone, Default)]
pub struct SessionLocks {
    locks: Arc<LockMap>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the session.
    ///
    /// Waiters are served in arrival order.
    pub async fn acquire(&self, session_id: &str) -> SessionGuard {
        // The map shard guard must be released before awaiting the session lock
        let lock = self
            .locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        SessionGuard {
            guard: Some(lock.lock_owned().await),
            session_id: session_id.to_string(),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of sessions currently locked or waited on
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive access to one session; released on drop
#[must_use = "the session is unlocked as soon as the guard is dropped"]
pub struct SessionGuard {
    guard: Option<OwnedMutexGuard<()>>,
    session_id: String,
    locks: Arc<LockMap>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map still references the lock: nobody holds or waits for it
        self.locks
            .remove_if(self.session_id.as_str(), |_, lock| Arc::strong_count(lock) == 1);
    }
}
