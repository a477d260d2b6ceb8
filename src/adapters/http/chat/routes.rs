//! Axum router configuration for the chat endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{chat, health, ChatAppState};

/// Create the chat API router.
///
/// # Routes
///
/// - `POST /chat` - Process one user message
/// - `GET /health` - Liveness check
pub fn chat_router() -> Router<ChatAppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
}
