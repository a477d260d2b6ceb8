//! History Store Port - durable, versioned storage of conversation turns.
//!
//! One document per [`ConversationId`], holding the ordered turn list and a
//! revision counter that increases by exactly one per committed append.
//!
//! # Concurrency contract
//!
//! `append_turn_pair` is the only mutation and the only serialization point
//! between concurrent turns. Implementations must, inside their native
//! transaction or compare-and-set primitive:
//!
//! 1. re-read the latest committed history (never a caller-supplied copy),
//! 2. apply [`ConversationHistory::with_turn_pair`],
//! 3. commit the result as the new document state.
//!
//! Two concurrent appends therefore land as two complete, non-interleaved
//! pairs in commit order. A failed append leaves no trace.

use async_trait::async_trait;

use crate::domain::conversation::ConversationHistory;
use crate::domain::foundation::{ConversationId, Timestamp};

/// Errors that can occur during history store operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HistoryStoreError {
    /// The backing store could not be reached or the transaction failed.
    #[error("history store unavailable: {0}")]
    Unavailable(String),

    /// The stored document could not be decoded.
    #[error("stored history is corrupt: {0}")]
    Corrupt(String),
}

impl HistoryStoreError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Creates a corrupt-document error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt(message.into())
    }
}

/// Committed state of one conversation document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredHistory {
    /// Turns, oldest first.
    pub history: ConversationHistory,
    /// Number of committed appends; 0 for a conversation never written.
    pub revision: u64,
    /// When the last append committed, if any.
    pub updated_at: Option<Timestamp>,
}

impl StoredHistory {
    /// State of a conversation that has never been written.
    pub fn empty() -> Self {
        Self {
            history: ConversationHistory::new(),
            revision: 0,
            updated_at: None,
        }
    }
}

/// Port for conversation history persistence.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Returns the current committed history.
    ///
    /// A conversation that was never written reads as
    /// [`StoredHistory::empty`], not as an error.
    ///
    /// # Errors
    ///
    /// - `Unavailable` on infrastructure failure
    /// - `Corrupt` if the stored document cannot be decoded
    async fn read(&self, conversation_id: &ConversationId) -> Result<StoredHistory, HistoryStoreError>;

    /// Atomically appends `{user, [user_message]}` then
    /// `{model, [model_message]}`, trims to the store's retention bound and
    /// commits. Returns the newly committed state.
    ///
    /// # Errors
    ///
    /// - `Unavailable` if the transaction could not commit; nothing is written
    /// - `Corrupt` if the current document cannot be decoded
    async fn append_turn_pair(
        &self,
        conversation_id: &ConversationId,
        user_message: &str,
        model_message: &str,
    ) -> Result<StoredHistory, HistoryStoreError>;

    /// Maximum number of turns retained per conversation.
    fn max_turns(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn HistoryStore) {}
    }

    #[test]
    fn empty_stored_history_has_revision_zero() {
        let stored = StoredHistory::empty();
        assert!(stored.history.is_empty());
        assert_eq!(stored.revision, 0);
        assert!(stored.updated_at.is_none());
    }

    #[test]
    fn history_store_error_displays_correctly() {
        let err = HistoryStoreError::unavailable("connection refused");
        assert_eq!(err.to_string(), "history store unavailable: connection refused");

        let err = HistoryStoreError::corrupt("expected array");
        assert_eq!(err.to_string(), "stored history is corrupt: expected array");
    }
}
