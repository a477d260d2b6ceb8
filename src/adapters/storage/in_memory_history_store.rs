//! In-Memory History Store Adapter
//!
//! Keeps conversation documents in a map behind a tokio `RwLock`.
//! The write lock is the transaction: an append re-reads, updates and
//! commits the document while holding it. Used for tests and the `memory`
//! backend.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::{ConversationHistory, MAX_HISTORY};
use crate::domain::foundation::{ConversationId, Timestamp};
use crate::ports::{HistoryStore, HistoryStoreError, StoredHistory};

/// In-memory storage for conversation histories
#[derive(Debug, Clone)]
pub struct InMemoryHistoryStore {
    documents: Arc<RwLock<HashMap<ConversationId, StoredHistory>>>,
    max_turns: usize,
    fail_appends: Arc<AtomicBool>,
}

impl InMemoryHistoryStore {
    /// Create a store retaining [`MAX_HISTORY`] turns per conversation
    pub fn new() -> Self {
        Self::with_max_turns(MAX_HISTORY)
    }

    /// Create a store with a custom retention bound
    pub fn with_max_turns(max_turns: usize) -> Self {
        Self {
            documents: Arc::new(RwLock::new(HashMap::new())),
            max_turns,
            fail_appends: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Seed a conversation with existing turns as one committed revision
    /// (useful for tests)
    pub async fn seed(&self, conversation_id: ConversationId, history: ConversationHistory) {
        let mut documents = self.documents.write().await;
        documents.insert(
            conversation_id,
            StoredHistory {
                history,
                revision: 1,
                updated_at: Some(Timestamp::now()),
            },
        );
    }

    /// Make subsequent appends fail with `Unavailable` (useful for tests)
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Get the number of stored conversations
    pub async fn conversation_count(&self) -> usize {
        self.documents.read().await.len()
    }
}

impl Default for InMemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn read(&self, conversation_id: &ConversationId) -> Result<StoredHistory, HistoryStoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(conversation_id)
            .cloned()
            .unwrap_or_else(StoredHistory::empty))
    }

    async fn append_turn_pair(
        &self,
        conversation_id: &ConversationId,
        user_message: &str,
        model_message: &str,
    ) -> Result<StoredHistory, HistoryStoreError> {
        let mut documents = self.documents.write().await;

        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(HistoryStoreError::unavailable("in-memory store rejected the write"));
        }

        let current = documents
            .get(conversation_id)
            .cloned()
            .unwrap_or_else(StoredHistory::empty);

        let committed = StoredHistory {
            history: current
                .history
                .with_turn_pair(user_message, model_message, self.max_turns),
            revision: current.revision + 1,
            updated_at: Some(Timestamp::now()),
        };

        documents.insert(conversation_id.clone(), committed.clone());
        Ok(committed)
    }

    fn max_turns(&self) -> usize {
        self.max_turns
    }
}
