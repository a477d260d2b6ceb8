//! HTTP handlers for the chat endpoint.
//!
//! These handlers connect Axum routes to the ProcessTurn command handler.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::{ProcessTurnCommand, ProcessTurnError, ProcessTurnHandler};
use crate::domain::conversation::PromptBuilder;
use crate::domain::foundation::ConversationId;
use crate::ports::{GenerationClient, HistoryStore};

use super::dto::{ChatRequest, ChatResponse, ErrorResponse, HealthResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Default upper bound on one turn, matching `server.request_timeout_secs`.
pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(120);

/// Shared state for the chat routes.
///
/// Cloned for each request; dependencies are Arc-wrapped.
#[derive(Clone)]
pub struct ChatAppState {
    pub history_store: Arc<dyn HistoryStore>,
    pub generation_client: Arc<dyn GenerationClient>,
    pub prompt_builder: PromptBuilder,
    pub default_conversation_id: ConversationId,
    /// How long a request waits for its turn before answering 500.
    pub turn_timeout: Duration,
}

impl std::fmt::Debug for ChatAppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatAppState")
            .field("model", &self.generation_client.model())
            .field("max_turns", &self.history_store.max_turns())
            .field("default_conversation_id", &self.default_conversation_id)
            .field("turn_timeout", &self.turn_timeout)
            .finish_non_exhaustive()
    }
}

impl ChatAppState {
    pub fn new(
        history_store: Arc<dyn HistoryStore>,
        generation_client: Arc<dyn GenerationClient>,
        default_conversation_id: ConversationId,
    ) -> Self {
        Self {
            history_store,
            generation_client,
            prompt_builder: PromptBuilder::default(),
            default_conversation_id,
            turn_timeout: DEFAULT_TURN_TIMEOUT,
        }
    }

    /// Sets how long a request waits for its turn.
    pub fn with_turn_timeout(mut self, turn_timeout: Duration) -> Self {
        self.turn_timeout = turn_timeout;
        self
    }

    /// Create the turn handler from the shared state.
    pub fn process_turn_handler(&self) -> ProcessTurnHandler<dyn HistoryStore, dyn GenerationClient> {
        ProcessTurnHandler::new(self.history_store.clone(), self.generation_client.clone())
            .with_prompt_builder(self.prompt_builder.clone())
    }

    /// Resolves the conversation a request addresses.
    fn conversation_for(&self, session_id: Option<String>) -> Result<ConversationId, ChatApiError> {
        match session_id {
            None => Ok(self.default_conversation_id.clone()),
            Some(raw) => ConversationId::new(raw)
                .map_err(|e| ChatApiError::InvalidRequest(e.to_string())),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /chat - Process one user message
pub async fn chat(
    State(state): State<ChatAppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ChatApiError> {
    // Unparseable bodies carry no message.
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("Rejected chat body: {}", rejection);
            ChatRequest::default()
        }
    };

    let conversation_id = state.conversation_for(request.session_id)?;
    let cmd = ProcessTurnCommand::new(conversation_id, request.message.unwrap_or_default());

    // Detached: a timeout must not cancel the turn mid-transaction.
    let handler = state.process_turn_handler();
    let turn = tokio::spawn(async move { handler.handle(cmd).await });

    let result = match tokio::time::timeout(state.turn_timeout, turn).await {
        Ok(Ok(outcome)) => outcome?,
        Ok(Err(join_error)) => return Err(ChatApiError::Aborted(join_error.to_string())),
        Err(_) => return Err(ChatApiError::TimedOut(state.turn_timeout)),
    };

    Ok(Json(ChatResponse::from(result)))
}

/// GET /health - Liveness check
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts to HTTP responses.
#[derive(Debug)]
pub enum ChatApiError {
    /// The request itself is unusable.
    InvalidRequest(String),
    /// The turn pipeline failed.
    Turn(ProcessTurnError),
    /// The turn did not finish within the request timeout.
    TimedOut(Duration),
    /// The turn task panicked or was cancelled.
    Aborted(String),
}

impl From<ProcessTurnError> for ChatApiError {
    fn from(err: ProcessTurnError) -> Self {
        ChatApiError::Turn(err)
    }
}

impl ChatApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ChatApiError::InvalidRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ChatApiError::Turn(ProcessTurnError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "A message is required.".to_string())
            }
            ChatApiError::Turn(ProcessTurnError::GenerationFailed(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "The language model could not be reached.".to_string(),
            ),
            ChatApiError::Turn(ProcessTurnError::MalformedResponse(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "The language model returned an unusable response.".to_string(),
            ),
            ChatApiError::Turn(ProcessTurnError::StoreUnavailable(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Conversation history is unavailable.".to_string(),
            ),
            ChatApiError::TimedOut(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "The request timed out.".to_string(),
            ),
            ChatApiError::Aborted(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "The request could not be completed.".to_string(),
            ),
        }
    }
}

impl IntoResponse for ChatApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        match &self {
            ChatApiError::Turn(err) if status.is_server_error() => {
                tracing::error!("Chat request failed: {}", err);
            }
            ChatApiError::TimedOut(timeout) => {
                tracing::error!(timeout_secs = timeout.as_secs(), "Chat request timed out");
            }
            ChatApiError::Aborted(reason) => {
                tracing::error!("Chat turn aborted: {}", reason);
            }
            _ => {}
        }

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::MalformedResponse;
    use crate::domain::foundation::ValidationError;
    use crate::ports::{GenerationError, HistoryStoreError};

    fn status_of(err: ChatApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ChatApiError::from(ProcessTurnError::Validation(ValidationError::empty_field(
            "message",
        )));
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_request_maps_to_bad_request() {
        let err = ChatApiError::InvalidRequest("bad session".to_string());
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn pipeline_failures_map_to_internal_error() {
        let errors = vec![
            ProcessTurnError::GenerationFailed(GenerationError::RateLimited),
            ProcessTurnError::MalformedResponse(MalformedResponse::MissingReply),
            ProcessTurnError::StoreUnavailable(HistoryStoreError::unavailable("down")),
        ];

        for err in errors {
            assert_eq!(
                status_of(ChatApiError::from(err)),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }

    #[test]
    fn timeout_and_abort_map_to_internal_error() {
        assert_eq!(
            status_of(ChatApiError::TimedOut(Duration::from_secs(1))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ChatApiError::Aborted("task panicked".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn app_state_debug_skips_ports() {
        use crate::adapters::ai::MockGenerationClient;
        use crate::adapters::storage::InMemoryHistoryStore;

        let state = ChatAppState::new(
            Arc::new(InMemoryHistoryStore::new()),
            Arc::new(MockGenerationClient::new()),
            ConversationId::new("main_chat_session").unwrap(),
        )
        .with_turn_timeout(Duration::from_secs(5));

        let debug = format!("{:?}", state);

        assert!(debug.starts_with("ChatAppState"));
        assert!(debug.contains("mock-model-1"));
        assert!(debug.contains("main_chat_session"));
    }

    #[test]
    fn internal_error_message_hides_details() {
        let err = ChatApiError::from(ProcessTurnError::StoreUnavailable(
            HistoryStoreError::unavailable("password authentication failed for user chat"),
        ));
        let (_, message) = err.status_and_message();
        assert!(!message.contains("password"));
    }
}
