//! Conversation history configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::conversation::MAX_HISTORY;
use crate::domain::foundation::ConversationId;

/// Where conversation histories live
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    #[default]
    Postgres,
    Memory,
}

/// History configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Storage backend
    #[serde(default)]
    pub backend: HistoryBackend,

    /// Retained entries per conversation
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Conversation used when a request names none
    #[serde(default = "default_conversation_id")]
    pub default_conversation_id: String,
}

impl HistoryConfig {
    /// Parsed default conversation id
    pub fn default_conversation(&self) -> Result<ConversationId, ValidationError> {
        ConversationId::new(self.default_conversation_id.clone())
            .map_err(|e| ValidationError::InvalidConversationId(e.to_string()))
    }

    /// Validate history configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        // Trimming drops whole pairs only.
        if self.max_turns < 2 || self.max_turns % 2 != 0 {
            return Err(ValidationError::InvalidMaxTurns(self.max_turns));
        }
        self.default_conversation()?;
        Ok(())
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            backend: HistoryBackend::default(),
            max_turns: default_max_turns(),
            default_conversation_id: default_conversation_id(),
        }
    }
}

fn default_max_turns() -> usize {
    MAX_HISTORY
}

fn default_conversation_id() -> String {
    "main_chat_session".to_string()
}
