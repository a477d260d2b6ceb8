//! Prompt construction for a conversation turn.
//!
//! The outgoing payload is the prior history, unchanged, followed by one new
//! `user` turn holding the rendered instruction template: the persona
//! directive, the response schema the model must follow, and the literal
//! user message. Prior turns store the plain user text, so the template only
//! ever appears in the newest turn.

use serde::Serialize;

use super::history::{ConversationHistory, Turn};

/// Persona the model is asked to adopt.
pub const PERSONA_DIRECTIVE: &str = "You are a mental-care companion. \
Listen deeply, respond with empathy, accept what the user shares and never dismiss or judge it. \
Take the whole conversation history into account, analyse the user's latest message below \
and answer strictly in the JSON schema that follows.";

/// Response contract the model must satisfy.
///
/// Field names here are the ones [`parse_analysis`](super::parse_analysis)
/// decodes; the two must change together.
pub const RESPONSE_SCHEMA: &str = r#"{
  "emotion_analysis": {
    "primary_emotion": "string (joy, sadness, anger, fear, anxiety, etc.)",
    "intensity": "float (0.0-1.0)",
    "stress_level": "float (0.0-1.0)"
  },
  "insight": {
    "key_topic": "string (the core of the user's concern)",
    "underlying_need": "string (what the user wants: 'empathy', 'advice', 'to be heard')"
  },
  "ai_response": "string (a gentle, deeply empathetic reply that brings all of the above together)"
}"#;

/// Ordered turns sent to the generation backend.
///
/// The last entry is always the rendered prompt turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptPayload {
    pub contents: Vec<Turn>,
}

impl PromptPayload {
    /// Returns the rendered prompt turn.
    pub fn prompt_turn(&self) -> Option<&Turn> {
        self.contents.last()
    }

    /// Number of prior history turns carried in the payload.
    pub fn history_len(&self) -> usize {
        self.contents.len().saturating_sub(1)
    }
}

/// Builds [`PromptPayload`]s from history and the new user message.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    persona: String,
}

impl PromptBuilder {
    /// Creates a builder with the given persona directive.
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
        }
    }

    /// Renders the instruction text for one user message.
    pub fn render(&self, user_message: &str) -> String {
        format!(
            "{persona}\n\nJSON schema:\n```json\n{schema}\n```\n---\nThe user's latest message:\n\"{message}\"",
            persona = self.persona,
            schema = RESPONSE_SCHEMA,
            message = user_message,
        )
    }

    /// Builds the request payload. Pure: `history` is only read.
    pub fn build(&self, history: &ConversationHistory, user_message: &str) -> PromptPayload {
        let mut contents = Vec::with_capacity(history.len() + 1);
        contents.extend(history.turns().iter().cloned());
        contents.push(Turn::user(self.render(user_message)));
        PromptPayload { contents }
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(PERSONA_DIRECTIVE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::{Role, MAX_HISTORY};

    #[test]
    fn build_on_empty_history_yields_single_prompt_turn() {
        let payload = PromptBuilder::default().build(&ConversationHistory::new(), "hello");

        assert_eq!(payload.contents.len(), 1);
        assert_eq!(payload.history_len(), 0);
        let prompt = payload.prompt_turn().unwrap();
        assert_eq!(prompt.role, Role::User);
        assert_eq!(prompt.parts.len(), 1);
    }

    #[test]
    fn build_keeps_prior_turns_unchanged_and_in_order() {
        let history = ConversationHistory::new()
            .with_turn_pair("hi", "hello", MAX_HISTORY)
            .with_turn_pair("bye", "goodbye", MAX_HISTORY);

        let payload = PromptBuilder::default().build(&history, "again");

        assert_eq!(payload.history_len(), 4);
        assert_eq!(&payload.contents[..4], history.turns());
    }

    #[test]
    fn build_does_not_mutate_history() {
        let history = ConversationHistory::new().with_turn_pair("hi", "hello", MAX_HISTORY);
        let snapshot = history.clone();

        let _ = PromptBuilder::default().build(&history, "again");

        assert_eq!(history, snapshot);
    }

    #[test]
    fn prompt_embeds_persona_schema_and_literal_message() {
        let message = "I'm feeling anxious about work";
        let payload = PromptBuilder::default().build(&ConversationHistory::new(), message);
        let text = payload.prompt_turn().unwrap().text();

        assert!(text.starts_with(PERSONA_DIRECTIVE));
        assert!(text.contains(RESPONSE_SCHEMA));
        assert!(text.contains(&format!("\"{}\"", message)));
    }

    #[test]
    fn schema_names_every_validated_field() {
        for field in [
            "emotion_analysis",
            "primary_emotion",
            "intensity",
            "stress_level",
            "insight",
            "key_topic",
            "underlying_need",
            "ai_response",
        ] {
            assert!(RESPONSE_SCHEMA.contains(field), "schema is missing {}", field);
        }
    }

    #[test]
    fn build_is_deterministic() {
        let history = ConversationHistory::new().with_turn_pair("hi", "hello", MAX_HISTORY);
        let builder = PromptBuilder::default();

        assert_eq!(builder.build(&history, "x"), builder.build(&history, "x"));
    }

    #[test]
    fn custom_persona_is_used() {
        let builder = PromptBuilder::new("Be brief.");
        assert!(builder.render("hey").starts_with("Be brief."));
    }
}
