//! Route definitions

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers::{chatbot, health};
use crate::server::AppState;

/// Create the API router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/chatbot", post(chatbot))
}
