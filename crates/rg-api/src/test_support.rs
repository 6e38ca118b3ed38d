//! Test doubles shared by the orchestrator and handler tests

use async_trait::async_trait;
use rg_core::{CompletionService, Error, MessageStore, Result, SqliteMessageStore, Turn};
use std::sync::Mutex;
use std::time::Duration;

/// How the stub answers
pub enum Reply {
    /// Echo the last human message back
    Echo,
    /// Fail every call
    Fail,
    /// Return an empty assistant message
    Empty,
    /// Never answer within any reasonable timeout
    Hang,
}

/// Completion stub that records every prompt it receives
pub struct StubCompletion {
    reply: Reply,
    prompts: Mutex<Vec<Vec<Turn>>>,
}

impl StubCompletion {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<Vec<Turn>> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for StubCompletion {
    async fn complete(&self, turns: &[Turn]) -> Result<Turn> {
        self.prompts.lock().unwrap().push(turns.to_vec());

        match self.reply {
            Reply::Echo => {
                let last = turns.last().map(|t| t.content.as_str()).unwrap_or_default();
                Ok(Turn::assistant(format!("re: {}", last)))
            }
            Reply::Fail => Err(Error::Completion("429: quota exceeded".to_string())),
            Reply::Empty => Ok(Turn::assistant("")),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Turn::assistant("too late"))
            }
        }
    }
}

/// Which store operation fails
pub enum StoreFailure {
    Load,
    Append,
}

/// Message store whose `load` or `append_turns` always fails; other calls hit SQLite
pub struct FailingStore {
    failure: StoreFailure,
    inner: SqliteMessageStore,
}

impl FailingStore {
    pub fn new(failure: StoreFailure) -> Self {
        Self {
            failure,
            inner: SqliteMessageStore::in_memory().unwrap(),
        }
    }

    fn busy() -> Error {
        Error::Store(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            Some("database is locked".to_string()),
        ))
    }
}

#[async_trait]
impl MessageStore for FailingStore {
    async fn append_turns(&self, session_id: &str, turns: &[Turn]) -> Result<()> {
        match self.failure {
            StoreFailure::Append => Err(Self::busy()),
            StoreFailure::Load => self.inner.append_turns(session_id, turns).await,
        }
    }

    async fn load(&self, session_id: &str) -> Result<Vec<Turn>> {
        match self.failure {
            StoreFailure::Load => Err(Self::busy()),
            StoreFailure::Append => self.inner.load(session_id).await,
        }
    }

    async fn clear(&self, session_id: &str) -> Result<usize> {
        self.inner.clear(session_id).await
    }

    async fn count(&self, session_id: &str) -> Result<usize> {
        self.inner.count(session_id).await
    }
}
