//! Conversation orchestrator
//!
//! One exchange: make sure the session has an eviction job, replay its
//! history behind the persona prompt, ask the completion service, and
//! record the new human/assistant pair before answering.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use rg_core::{CompletionService, MessageStore, PersonaPrompt, SessionLocks, Turn};
use rg_schedule::{EvictionCallback, EvictionScheduler, EvictionTrigger, HistoryEvictor, SessionRegistry};

use crate::{ApiError, Result};

const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);

pub struct Orchestrator {
    store: Arc<dyn MessageStore>,
    completion: Arc<dyn CompletionService>,
    scheduler: Arc<EvictionScheduler>,
    registry: SessionRegistry,
    locks: SessionLocks,
    evictor: Arc<dyn EvictionCallback>,
    trigger: EvictionTrigger,
    prompt: PersonaPrompt,
    completion_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn MessageStore>,
        completion: Arc<dyn CompletionService>,
        scheduler: Arc<EvictionScheduler>,
        trigger: EvictionTrigger,
        prompt: PersonaPrompt,
    ) -> Self {
        let locks = SessionLocks::new();
        let evictor = Arc::new(HistoryEvictor::new(Arc::clone(&store), locks.clone()));

        Self {
            store,
            completion,
            scheduler,
            registry: SessionRegistry::new(),
            locks,
            evictor,
            trigger,
            prompt,
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
        }
    }

    /// Hard limit on a single completion call
    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Run one exchange for the session and return the reply text
    pub async fn handle(&self, session_id: &str, query: &str) -> Result<String> {
        if session_id.trim().is_empty() {
            return Err(ApiError::InvalidRequest("user_id must not be empty".to_string()));
        }
        if query.trim().is_empty() {
            return Err(ApiError::InvalidRequest("query must not be empty".to_string()));
        }

        self.ensure_eviction(session_id).await?;

        // Held until the exchange is stored: keeps per-session order and keeps eviction out
        let _guard = self.locks.acquire(session_id).await;

        let history = self.store.load(session_id).await?;
        debug!(session_id = %session_id, history = history.len(), "Replaying history");

        let turns = self.prompt.compose(session_id, history, query);
        let reply = tokio::time::timeout(self.completion_timeout, self.completion.complete(&turns))
            .await
            .map_err(|_| rg_core::Error::CompletionTimeout(self.completion_timeout))??;

        if reply.content.trim().is_empty() {
            return Err(rg_core::Error::Completion("completion returned no text".to_string()).into());
        }

        self.store
            .append_turns(
                session_id,
                &[Turn::human(query), Turn::assistant(reply.content.as_str())],
            )
            .await?;

        info!(session_id = %session_id, "Reply generated ({} chars)", reply.content.len());
        Ok(reply.content)
    }

    /// Schedule the session's eviction the first time it is seen
    async fn ensure_eviction(&self, session_id: &str) -> Result<()> {
        if !self.registry.try_register(session_id) {
            debug!(
                session_id = %session_id,
                registered_at = ?self.registry.registered_at(session_id),
                "Eviction already scheduled"
            );
            return Ok(());
        }

        match self
            .scheduler
            .schedule(session_id, self.trigger.clone(), Arc::clone(&self.evictor))
            .await
        {
            Ok(_) => {
                info!(session_id = %session_id, trigger = %self.trigger, "History eviction scheduled");
                Ok(())
            }
            Err(e) => {
                // Let the next request try again
                self.registry.unregister(session_id);
                warn!(session_id = %session_id, "Could not schedule eviction: {}", e);
                Err(e.into())
            }
        }
    }
}
