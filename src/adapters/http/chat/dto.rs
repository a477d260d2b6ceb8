//! HTTP DTOs for the chat endpoint.
//!
//! These types define the JSON request/response structure of `POST /chat`
//! and are the boundary between HTTP and the application layer.

use serde::{Deserialize, Serialize};

use crate::application::ProcessTurnResult;
use crate::domain::conversation::AnalysisResult;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to process one user message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    /// The user's message. Missing is rejected by the handler, not the parser.
    #[serde(default)]
    pub message: Option<String>,
    /// Conversation to continue; the configured default when absent.
    #[serde(default)]
    pub session_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response for a completed turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    /// The reply shown to the user.
    pub ai_message: String,
    /// The full validated analysis.
    pub emotion_parameters: AnalysisResult,
}

impl From<ProcessTurnResult> for ChatResponse {
    fn from(result: ProcessTurnResult) -> Self {
        Self {
            ai_message: result.ai_message().to_string(),
            emotion_parameters: result.analysis,
        }
    }
}

/// Liveness response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::parse_analysis;
    use crate::domain::foundation::ConversationId;

    #[test]
    fn chat_request_accepts_message_only() {
        let request: ChatRequest = serde_json::from_str(r#"{"message":"hello"}"#).unwrap();
        assert_eq!(request.message.as_deref(), Some("hello"));
        assert!(request.session_id.is_none());
    }

    #[test]
    fn chat_request_tolerates_missing_fields() {
        let request: ChatRequest = serde_json::from_str("{}").unwrap();
        assert!(request.message.is_none());
    }

    #[test]
    fn chat_request_reads_session_id() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"message":"hi","session_id":"user-42"}"#).unwrap();
        assert_eq!(request.session_id.as_deref(), Some("user-42"));
    }

    #[test]
    fn chat_response_serializes_reply_and_analysis() {
        let analysis = parse_analysis(
            r#"{"emotion_analysis":{"primary_emotion":"anxiety","intensity":0.7,"stress_level":0.8},
                "insight":{"key_topic":"work","underlying_need":"empathy"},
                "ai_response":"That sounds really hard..."}"#,
        )
        .unwrap();
        let result = ProcessTurnResult {
            conversation_id: ConversationId::new("main_chat_session").unwrap(),
            analysis,
            history_len: 2,
            revision: 1,
        };

        let json = serde_json::to_value(ChatResponse::from(result)).unwrap();

        assert_eq!(json["ai_message"], "That sounds really hard...");
        assert_eq!(json["emotion_parameters"]["emotion_analysis"]["primary_emotion"], "anxiety");
        assert_eq!(json["emotion_parameters"]["insight"]["underlying_need"], "empathy");
        assert_eq!(json["emotion_parameters"]["ai_response"], "That sounds really hard...");
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    #[test]
    fn error_response_has_single_error_field() {
        let json = serde_json::to_value(ErrorResponse::new("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"error": "boom"}));
    }
}
