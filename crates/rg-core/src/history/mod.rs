//! Conversation history module
//!
//! Durable, per-session ordered log of conversation turns.

mod locks;
mod store;
mod types;

pub use locks::{SessionGuard, SessionLocks};
pub use store::{MessageStore, SqliteMessageStore};
pub use types::{Role, Turn};
