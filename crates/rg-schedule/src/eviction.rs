//! Eviction callbacks

use async_trait::async_trait;
use rg_core::{MessageStore, SessionLocks};
use std::sync::Arc;
use tracing::info;

/// Work performed each time a session's eviction job fires
#[async_trait]
pub trait EvictionCallback: Send + Sync {
    async fn evict(&self, session_id: &str) -> rg_core::Result<()>;
}

/// Clears a session's stored history, leaving the session itself registered
#[derive(Clone)]
pub struct HistoryEvictor {
    store: Arc<dyn MessageStore>,
    locks: SessionLocks,
}

impl HistoryEvictor {
    pub fn new(store: Arc<dyn MessageStore>, locks: SessionLocks) -> Self {
        Self { store, locks }
    }
}

#[async_trait]
impl EvictionCallback for HistoryEvictor {
    async fn evict(&self, session_id: &str) -> rg_core::Result<()> {
        // Waits for any exchange being recorded for this session
        let _guard = self.locks.acquire(session_id).await;
        let removed = self.store.clear(session_id).await?;
        info!(session_id = %session_id, removed, "Chat history cleared");
        Ok(())
    }
}
