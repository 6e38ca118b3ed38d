//! Error types for rg-core

use std::time::Duration;

use thiserror::Error;

/// Main error type for rg-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Completion service error: {0}")]
    Completion(String),

    #[error("Completion service timed out after {0:?}")]
    CompletionTimeout(Duration),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Message store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Unknown turn role: {0}")]
    InvalidRole(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt template error: {0}")]
    Template(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Whether the error came from the completion service rather than local state
    pub fn is_completion(&self) -> bool {
        matches!(self, Error::Completion(_) | Error::CompletionTimeout(_) | Error::Http(_))
    }
}

/// Result type alias for rg-core
pub type Result<T> = std::result::Result<T, Error>;
