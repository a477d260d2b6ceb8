//! PostgreSQL implementation of HistoryStore.
//!
//! Each conversation is one row of `conversations` whose `history` column
//! holds the turn list as JSONB. Appends run in a single transaction that
//! locks the row with `SELECT .. FOR UPDATE`, so concurrent turns against
//! the same conversation queue on the lock and each sees the previous
//! commit before applying its own pair.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::conversation::{ConversationHistory, MAX_HISTORY};
use crate::domain::foundation::{ConversationId, Timestamp};
use crate::ports::{HistoryStore, HistoryStoreError, StoredHistory};

/// PostgreSQL implementation of HistoryStore.
#[derive(Clone)]
pub struct PostgresHistoryStore {
    pool: PgPool,
    max_turns: usize,
}

impl PostgresHistoryStore {
    /// Creates a store retaining [`MAX_HISTORY`] turns per conversation.
    pub fn new(pool: PgPool) -> Self {
        Self::with_max_turns(pool, MAX_HISTORY)
    }

    /// Creates a store with a custom retention bound.
    pub fn with_max_turns(pool: PgPool, max_turns: usize) -> Self {
        Self { pool, max_turns }
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

impl std::fmt::Debug for PostgresHistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresHistoryStore")
            .field("max_turns", &self.max_turns)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HistoryStore for PostgresHistoryStore {
    async fn read(&self, conversation_id: &ConversationId) -> Result<StoredHistory, HistoryStoreError> {
        let row = sqlx::query(
            r#"
            SELECT history, revision, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(conversation_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| HistoryStoreError::unavailable(format!("Failed to fetch history: {}", e)))?;

        match row {
            Some(row) => row_to_stored(&row),
            None => Ok(StoredHistory::empty()),
        }
    }

    async fn append_turn_pair(
        &self,
        conversation_id: &ConversationId,
        user_message: &str,
        model_message: &str,
    ) -> Result<StoredHistory, HistoryStoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            HistoryStoreError::unavailable(format!("Failed to start transaction: {}", e))
        })?;

        // Make sure there is a row to lock. Rolled back with the rest on failure.
        sqlx::query(
            r#"
            INSERT INTO conversations (id, history, revision)
            VALUES ($1, '[]'::jsonb, 0)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(conversation_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            HistoryStoreError::unavailable(format!("Failed to create conversation: {}", e))
        })?;

        let row = sqlx::query(
            r#"
            SELECT history, revision, updated_at
            FROM conversations
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(conversation_id.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| HistoryStoreError::unavailable(format!("Failed to lock history: {}", e)))?;

        let current = row_to_stored(&row)?;
        let updated = current
            .history
            .with_turn_pair(user_message, model_message, self.max_turns);
        let history_json = serde_json::to_value(&updated)
            .map_err(|e| HistoryStoreError::corrupt(format!("Failed to encode history: {}", e)))?;

        let row = sqlx::query(
            r#"
            UPDATE conversations SET
                history = $2,
                revision = revision + 1,
                updated_at = NOW()
            WHERE id = $1
            RETURNING revision, updated_at
            "#,
        )
        .bind(conversation_id.as_str())
        .bind(history_json)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| HistoryStoreError::unavailable(format!("Failed to update history: {}", e)))?;

        let revision: i64 = row
            .try_get("revision")
            .map_err(|e| HistoryStoreError::corrupt(e.to_string()))?;
        let updated_at: chrono::DateTime<chrono::Utc> = row
            .try_get("updated_at")
            .map_err(|e| HistoryStoreError::corrupt(e.to_string()))?;

        tx.commit().await.map_err(|e| {
            HistoryStoreError::unavailable(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(StoredHistory {
            history: updated,
            revision: revision.max(0) as u64,
            updated_at: Some(Timestamp::from_datetime(updated_at)),
        })
    }

    fn max_turns(&self) -> usize {
        self.max_turns
    }
}

fn row_to_stored(row: &PgRow) -> Result<StoredHistory, HistoryStoreError> {
    let history_json: serde_json::Value = row
        .try_get("history")
        .map_err(|e| HistoryStoreError::corrupt(e.to_string()))?;
    let revision: i64 = row
        .try_get("revision")
        .map_err(|e| HistoryStoreError::corrupt(e.to_string()))?;
    let updated_at: chrono::DateTime<chrono::Utc> = row
        .try_get("updated_at")
        .map_err(|e| HistoryStoreError::corrupt(e.to_string()))?;

    let history: ConversationHistory = serde_json::from_value(history_json)
        .map_err(|e| HistoryStoreError::corrupt(format!("Failed to decode history: {}", e)))?;

    Ok(StoredHistory {
        history,
        revision: revision.max(0) as u64,
        updated_at: Some(Timestamp::from_datetime(updated_at)),
    })
}

#[cfg(test)]
mod tests {
    // These tests need a running PostgreSQL instance.
    // Run with: DATABASE_URL=postgres://... cargo test -- --ignored
    use super::*;
    use crate::domain::conversation::{Role, Turn};
    use sqlx::postgres::PgPoolOptions;

    async fn test_store() -> PostgresHistoryStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .unwrap();
        let store = PostgresHistoryStore::new(pool);
        store.migrate().await.unwrap();
        store
    }

    fn unique_id() -> ConversationId {
        ConversationId::new(format!("test-{}", uuid::Uuid::new_v4())).unwrap()
    }

    #[tokio::test]
    #[ignore]
    async fn read_of_untouched_conversation_is_empty() {
        let store = test_store().await;

        let stored = store.read(&unique_id()).await.unwrap();

        assert_eq!(stored, StoredHistory::empty());
    }

    #[tokio::test]
    #[ignore]
    async fn append_round_trips_through_jsonb() {
        let store = test_store().await;
        let conv = unique_id();

        let committed = store.append_turn_pair(&conv, "hi", "hello").await.unwrap();
        let stored = store.read(&conv).await.unwrap();

        assert_eq!(committed.revision, 1);
        assert_eq!(stored.history, committed.history);
        assert_eq!(
            stored.history.turns(),
            &[Turn::user("hi"), Turn::model("hello")]
        );
    }

    #[tokio::test]
    #[ignore]
    async fn concurrent_appends_serialize_on_row_lock() {
        let store = test_store().await;
        let conv = unique_id();

        let (a, b) = tokio::join!(
            store.append_turn_pair(&conv, "hi", "hello"),
            store.append_turn_pair(&conv, "bye", "goodbye"),
        );
        a.unwrap();
        b.unwrap();

        let stored = store.read(&conv).await.unwrap();
        assert_eq!(stored.revision, 2);
        assert_eq!(stored.history.len(), 4);
        for pair in stored.history.turns().chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Model);
        }
    }

    #[tokio::test]
    #[ignore]
    async fn history_is_trimmed_to_retention_bound() {
        let store = test_store().await;
        let conv = unique_id();

        for n in 0..30 {
            store
                .append_turn_pair(&conv, &format!("u{}", n), &format!("m{}", n))
                .await
                .unwrap();
        }

        let stored = store.read(&conv).await.unwrap();
        assert_eq!(stored.history.len(), MAX_HISTORY);
        assert_eq!(stored.history.turns()[0], Turn::user("u5"));
    }
}
