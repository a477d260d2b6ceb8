//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! This module provides adapters for PostgreSQL-backed persistence:
//! - `PostgresHistoryStore` - Conversation histories with row-locked appends

mod history_store;

pub use history_store::PostgresHistoryStore;
