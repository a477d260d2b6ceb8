//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `HistoryStore` - Versioned conversation history with transactional append
//! - `GenerationClient` - The language-model backend

mod generation_client;
mod history_store;

pub use generation_client::{GenerationClient, GenerationError};
pub use history_store::{HistoryStore, HistoryStoreError, StoredHistory};
