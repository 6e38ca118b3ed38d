//! Process-wide record of sessions that already have an eviction job

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::debug;

/// Thread-safe registry; registration is decided exactly once per session.
///
/// State lives for the process only and is lost on restart.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, DateTime<Utc>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the session as registered.
    ///
    /// Returns `true` only for the first call with a given id, even when
    /// several callers race on the same new id.
    pub fn try_register(&self, session_id: &str) -> bool {
        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Utc::now());
                debug!(session_id = %session_id, "Session registered");
                true
            }
        }
    }

    /// Forget the session so its next request registers it again
    pub fn unregister(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    pub fn is_registered(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// When the session was first registered
    pub fn registered_at(&self, session_id: &str) -> Option<DateTime<Utc>> {
        self.sessions.get(session_id).map(|r| *r.value())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_register_twice() {
        let registry = SessionRegistry::new();
        assert!(registry.try_register("alice"));
        assert!(!registry.try_register("alice"));
        assert!(registry.is_registered("alice"));
        assert!(registry.registered_at("alice").is_some());
    }

    #[test]
    fn test_unregister_allows_registering_again() {
        let registry = SessionRegistry::new();
        assert!(registry.try_register("alice"));
        assert!(registry.unregister("alice"));
        assert!(!registry.unregister("alice"));
        assert!(registry.try_register("alice"));
    }

    #[test]
    fn test_sessions_are_independent() {
        let registry = SessionRegistry::new();
        assert!(registry.try_register("alice"));
        assert!(registry.try_register("bob"));
        assert!(!registry.is_registered("carol"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_concurrent_registration_has_one_winner() {
        const THREADS: usize = 16;

        let registry = SessionRegistry::new();
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let registry = registry.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    registry.try_register("new-session")
                })
            })
            .collect();

        let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| **r).count(), 1);
        assert_eq!(results.iter().filter(|r| !**r).count(), THREADS - 1);
        assert_eq!(registry.len(), 1);
    }
}
