//! HTTP adapter for the chat endpoint.
//!
//! - `POST /chat` - Run one conversation turn
//! - `GET /health` - Liveness check

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ChatRequest, ChatResponse, ErrorResponse, HealthResponse};
pub use handlers::{ChatApiError, ChatAppState};
pub use routes::chat_router;
