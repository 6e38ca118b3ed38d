//! HTTP API handlers

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use tracing::debug;

use crate::server::AppState;
use crate::{ApiError, Result};

/// `/chatbot` parameters, accepted from the query string or a JSON body
#[derive(Debug, Default, Deserialize)]
pub struct ChatbotParams {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

impl ChatbotParams {
    /// Query-string values win; missing ones are taken from the body
    fn merge(self, body: ChatbotParams) -> Self {
        Self {
            user_id: self.user_id.or(body.user_id),
            query: self.query.or(body.query),
        }
    }
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Chatbot endpoint - reply to one message in the user's conversation
pub async fn chatbot(
    State(state): State<AppState>,
    params: std::result::Result<Query<ChatbotParams>, QueryRejection>,
    body: Bytes,
) -> Result<Json<String>> {
    let Query(params) = params
        .map_err(|e| ApiError::InvalidRequest(format!("invalid query string: {}", e.body_text())))?;

    let body_params = if body.iter().all(u8::is_ascii_whitespace) {
        ChatbotParams::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid JSON body: {}", e)))?
    };

    let params = params.merge(body_params);
    let user_id = params
        .user_id
        .ok_or_else(|| ApiError::InvalidRequest("missing user_id".to_string()))?;
    let query = params
        .query
        .ok_or_else(|| ApiError::InvalidRequest("missing query".to_string()))?;

    debug!(session_id = %user_id, "Chatbot request");

    let reply = state.orchestrator.handle(&user_id, &query).await?;
    Ok(Json(reply))
}
