//! rg-api: HTTP surface of the reply gateway
//!
//! Exposes `POST /chatbot`, which runs one conversation exchange through
//! the [`Orchestrator`].

pub mod error;
pub mod handlers;
pub mod orchestrator;
pub mod routes;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ApiError, Result};
pub use orchestrator::Orchestrator;
pub use server::{AppState, app, start_server};
