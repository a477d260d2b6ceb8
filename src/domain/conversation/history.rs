//! Conversation history - the bounded, ordered turn list of one conversation.
//!
//! Turns are immutable once stored. A successful exchange contributes exactly
//! one `user` turn followed by one `model` turn; the pair is appended
//! together by [`ConversationHistory::with_turn_pair`] and the oldest turns
//! are dropped once the retention bound is exceeded.
//!
//! The stored document shape is `{"history": [{"role", "parts": [..]}]}`,
//! which is also the shape the generation backend accepts for prior turns.

use serde::{Deserialize, Serialize};

/// Default retention bound for a conversation history, in turns.
pub const MAX_HISTORY: usize = 50;

/// Author of a turn.
///
/// Serialized as the backend's role names (`user` / `model`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person talking to the service.
    User,
    /// The language model.
    Model,
}

impl Role {
    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One message entry in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn.
    pub role: Role,
    /// Text segments of the turn, in order.
    pub parts: Vec<String>,
}

impl Turn {
    /// Creates a single-part user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![text.into()],
        }
    }

    /// Creates a single-part model turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![text.into()],
        }
    }

    /// Returns all parts joined with newlines.
    pub fn text(&self) -> String {
        self.parts.join("\n")
    }
}

/// Ordered sequence of turns for one conversation.
///
/// Order defines chronology; index 0 is the oldest retained turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory(Vec<Turn>);

impl ConversationHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.0
    }

    /// Consumes the history, returning the turn list.
    pub fn into_turns(self) -> Vec<Turn> {
        self.0
    }

    /// Number of turns retained.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no turns are stored.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the most recent turn, if any.
    pub fn last(&self) -> Option<&Turn> {
        self.0.last()
    }

    /// Returns a new history with the `(user, model)` pair appended and the
    /// result trimmed to the most recent `max_turns` entries.
    ///
    /// This is the whole read-modify-write step of a transactional append.
    /// Stores call it on the history they re-read inside their transaction,
    /// never on a copy captured before the model call.
    pub fn with_turn_pair(
        &self,
        user_message: &str,
        model_message: &str,
        max_turns: usize,
    ) -> Self {
        let mut turns = Vec::with_capacity(self.0.len() + 2);
        turns.extend(self.0.iter().cloned());
        turns.push(Turn::user(user_message));
        turns.push(Turn::model(model_message));

        if turns.len() > max_turns {
            let excess = turns.len() - max_turns;
            turns.drain(..excess);
        }

        Self(turns)
    }
}

impl From<Vec<Turn>> for ConversationHistory {
    fn from(turns: Vec<Turn>) -> Self {
        Self(turns)
    }
}
