//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `ai` - Generation clients (Gemini, mock)
//! - `postgres` - Postgres-backed history store
//! - `storage` - In-memory history store
//! - `http` - Axum REST surface

pub mod ai;
pub mod http;
pub mod postgres;
pub mod storage;

pub use ai::{GeminiClient, GeminiConfig, MockGenerationClient};
pub use http::{build_router, ChatAppState};
pub use postgres::PostgresHistoryStore;
pub use storage::InMemoryHistoryStore;
