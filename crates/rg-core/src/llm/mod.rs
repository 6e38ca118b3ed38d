//! LLM completion client and types
//!
//! Supports both the Anthropic Messages API and OpenAI-compatible APIs.

mod client;
mod types;

pub use client::{CompletionService, LlmClient};
pub use types::*;
