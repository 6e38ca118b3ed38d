//! Message store persistence using SQLite

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::history::{Role, Turn};
use crate::Result;

/// Durable, per-session ordered log of turns
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append one turn at the end of the session's sequence
    async fn append(&self, session_id: &str, role: Role, content: &str) -> Result<()> {
        self.append_turns(session_id, &[Turn::new(role, content)]).await
    }

    /// Append several turns in order, all or nothing
    async fn append_turns(&self, session_id: &str, turns: &[Turn]) -> Result<()>;

    /// Load the full ordered sequence; empty for an unknown session
    async fn load(&self, session_id: &str) -> Result<Vec<Turn>>;

    /// Delete every turn of the session; clearing an unknown session is not an error
    async fn clear(&self, session_id: &str) -> Result<usize>;

    /// Number of stored turns for the session
    async fn count(&self, session_id: &str) -> Result<usize>;
}

/// SQLite-based message store
///
/// Every call hits the database; nothing is cached.
#[derive(Clone)]
pub struct SqliteMessageStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMessageStore {
    /// Open (or create) the store at the given database path
    pub fn new(db_path: &str) -> Result<Self> {
        debug!("Opening history database at: {}", db_path);
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        let store = Self::from_connection(conn)?;
        info!("Message store initialized at {}", db_path);
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        init_tables(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking closure against the connection off the async runtime
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f(&mut guard)
        })
        .await?
    }
}

fn init_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS message_store (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_message_store_session_id ON message_store(session_id, id)",
        [],
    )?;

    Ok(())
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn append_turns(&self, session_id: &str, turns: &[Turn]) -> Result<()> {
        if turns.is_empty() {
            return Ok(());
        }

        let session_id = session_id.to_string();
        let turns = turns.to_vec();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO message_store (session_id, role, content, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                let now = Utc::now().to_rfc3339();
                for turn in &turns {
                    stmt.execute(params![session_id, turn.role.as_str(), turn.content, now])?;
                }
            }
            tx.commit()?;
            debug!(session_id = %session_id, count = turns.len(), "Appended turns");
            Ok(())
        })
        .await
    }

    async fn load(&self, session_id: &str) -> Result<Vec<Turn>> {
        let session_id = session_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT role, content FROM message_store
                 WHERE session_id = ?1 ORDER BY id ASC",
            )?;

            let rows = stmt.query_map(params![session_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut turns = Vec::new();
            for row in rows {
                let (role, content) = row?;
                turns.push(Turn::new(role.parse()?, content));
            }
            Ok(turns)
        })
        .await
    }

    async fn clear(&self, session_id: &str) -> Result<usize> {
        let session_id = session_id.to_string();
        self.with_conn(move |conn| {
            let affected = conn.execute(
                "DELETE FROM message_store WHERE session_id = ?1",
                params![session_id],
            )?;
            debug!(session_id = %session_id, affected, "Cleared history");
            Ok(affected)
        })
        .await
    }

    async fn count(&self, session_id: &str) -> Result<usize> {
        let session_id = session_id.to_string();
        self.with_conn(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM message_store WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_then_load_preserves_order() {
        let store = SqliteMessageStore::in_memory().unwrap();

        store.append("s", Role::Human, "hi").await.unwrap();
        store.append("s", Role::Assistant, "hello").await.unwrap();

        let turns = store.load("s").await.unwrap();
        assert_eq!(turns, vec![Turn::human("hi"), Turn::assistant("hello")]);
    }

    #[tokio::test]
    async fn test_load_unknown_session_is_empty() {
        let store = SqliteMessageStore::in_memory().unwrap();
        assert!(store.load("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let store = SqliteMessageStore::in_memory().unwrap();
        store.append("s", Role::Human, "hi").await.unwrap();
        store.append("other", Role::Human, "keep me").await.unwrap();

        assert_eq!(store.clear("s").await.unwrap(), 1);
        assert!(store.load("s").await.unwrap().is_empty());
        assert_eq!(store.count("other").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clear_unknown_session_is_noop() {
        let store = SqliteMessageStore::in_memory().unwrap();
        assert_eq!(store.clear("never-seen").await.unwrap(), 0);
        assert_eq!(store.clear("never-seen").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_interleaved_sessions_keep_their_own_order() {
        let store = SqliteMessageStore::in_memory().unwrap();
        store.append("a", Role::Human, "a1").await.unwrap();
        store.append("b", Role::Human, "b1").await.unwrap();
        store.append("a", Role::Assistant, "a2").await.unwrap();
        store.append("b", Role::Assistant, "b2").await.unwrap();

        let a: Vec<_> = store.load("a").await.unwrap().into_iter().map(|t| t.content).collect();
        let b: Vec<_> = store.load("b").await.unwrap().into_iter().map(|t| t.content).collect();
        assert_eq!(a, vec!["a1", "a2"]);
        assert_eq!(b, vec!["b1", "b2"]);
    }

    #[tokio::test]
    async fn test_append_turns_batch() {
        let store = SqliteMessageStore::in_memory().unwrap();
        store
            .append_turns("s", &[Turn::human("q"), Turn::assistant("a")])
            .await
            .unwrap();
        store.append_turns("s", &[]).await.unwrap();

        assert_eq!(store.count("s").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_history_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");
        let path = path.to_str().unwrap();

        {
            let store = SqliteMessageStore::new(path).unwrap();
            store.append("alice", Role::Human, "hi").await.unwrap();
        }

        let store = SqliteMessageStore::new(path).unwrap();
        assert_eq!(store.load("alice").await.unwrap(), vec![Turn::human("hi")]);
    }
}
