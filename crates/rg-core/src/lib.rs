//! rg-core: Reply Gateway Core Library
//!
//! Configuration, conversation history persistence, persona prompt
//! rendering and the LLM completion client.

pub mod config;
pub mod error;
pub mod history;
pub mod llm;
pub mod prompt;

pub use config::{ApiConfig, Config, EvictionConfig, HistoryConfig, LlmConfig, LlmProvider, PromptConfig};
pub use error::{Error, Result};
pub use history::{MessageStore, Role, SessionGuard, SessionLocks, SqliteMessageStore, Turn};
pub use llm::{CompletionService, LlmClient};
pub use prompt::PersonaPrompt;
