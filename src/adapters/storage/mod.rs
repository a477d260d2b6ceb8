//! Storage Adapters
//!
//! Process-local implementation of the HistoryStore port.
//!
//! ## Available Adapters
//!
//! - **InMemoryHistoryStore** - Stores histories in memory (testing/development)
//!
//! The durable adapter lives in `adapters::postgres`.
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::InMemoryHistoryStore;
//!
//! let store = InMemoryHistoryStore::with_max_turns(50);
//! ```

mod in_memory_history_store;

pub use in_memory_history_store::InMemoryHistoryStore;
