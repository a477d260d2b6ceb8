//! ProcessTurn command handler.
//!
//! Runs one conversation turn end to end:
//!
//! ```text
//! Idle -> HistoryLoaded -> PromptBuilt -> ModelInvoked -> Validated -> Persisted -> Completed
//!   \________________________ any failure ________________________/
//!                                  v
//!                                Failed
//! ```
//!
//! Stages advance strictly in order with no retries. A failure at any stage
//! jumps to `Failed` and skips everything after it, so history is written
//! only by turns that succeeded end to end, and always as a whole pair.
//!
//! The history read before the model call only feeds the prompt. The append
//! re-reads inside the store's transaction, so the slow model call holds no
//! lock and concurrent turns cannot overwrite each other.

use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::conversation::{parse_analysis, AnalysisResult, MalformedResponse, PromptBuilder};
use crate::domain::foundation::{ConversationId, ValidationError};
use crate::ports::{GenerationClient, GenerationError, HistoryStore, HistoryStoreError};

/// Command to process one user message.
#[derive(Debug, Clone)]
pub struct ProcessTurnCommand {
    /// The conversation the message belongs to.
    pub conversation_id: ConversationId,
    /// The user's message.
    pub message: String,
}

impl ProcessTurnCommand {
    /// Creates a new process turn command.
    pub fn new(conversation_id: ConversationId, message: impl Into<String>) -> Self {
        Self {
            conversation_id,
            message: message.into(),
        }
    }
}

/// Stage of a turn in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnStage {
    Idle,
    HistoryLoaded,
    PromptBuilt,
    ModelInvoked,
    Validated,
    Persisted,
    Completed,
    Failed,
}

impl TurnStage {
    /// The only stage reachable on success, or `None` from a terminal stage.
    pub fn next(self) -> Option<TurnStage> {
        match self {
            TurnStage::Idle => Some(TurnStage::HistoryLoaded),
            TurnStage::HistoryLoaded => Some(TurnStage::PromptBuilt),
            TurnStage::PromptBuilt => Some(TurnStage::ModelInvoked),
            TurnStage::ModelInvoked => Some(TurnStage::Validated),
            TurnStage::Validated => Some(TurnStage::Persisted),
            TurnStage::Persisted => Some(TurnStage::Completed),
            TurnStage::Completed | TurnStage::Failed => None,
        }
    }

    /// Returns true for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TurnStage::Idle => "idle",
            TurnStage::HistoryLoaded => "history_loaded",
            TurnStage::PromptBuilt => "prompt_built",
            TurnStage::ModelInvoked => "model_invoked",
            TurnStage::Validated => "validated",
            TurnStage::Persisted => "persisted",
            TurnStage::Completed => "completed",
            TurnStage::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TurnStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort a turn.
#[derive(Debug, Clone, Error)]
pub enum ProcessTurnError {
    /// The user message is missing or blank.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The generation backend could not be reached or refused the request.
    #[error("Generation failed: {0}")]
    GenerationFailed(#[from] GenerationError),

    /// The backend replied with something that breaks the response contract.
    #[error("Malformed model response: {0}")]
    MalformedResponse(#[from] MalformedResponse),

    /// The history could not be read or the append could not commit.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] HistoryStoreError),
}

impl ProcessTurnError {
    /// Returns true if the caller can fix the request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ProcessTurnError::Validation(_))
    }
}

/// Result of a successful turn.
#[derive(Debug, Clone)]
pub struct ProcessTurnResult {
    /// Conversation the turn was appended to.
    pub conversation_id: ConversationId,
    /// Validated analysis returned by the model.
    pub analysis: AnalysisResult,
    /// History length after the append.
    pub history_len: usize,
    /// Store revision created by this turn.
    pub revision: u64,
}

impl ProcessTurnResult {
    /// The reply shown to the user.
    pub fn ai_message(&self) -> &str {
        self.analysis.ai_response()
    }
}

/// Tracks the stage of one turn and logs transitions.
///
/// `turn_id` correlates the log lines of a single turn.
struct TurnProgress<'a> {
    conversation_id: &'a ConversationId,
    turn_id: Uuid,
    stage: TurnStage,
}

impl<'a> TurnProgress<'a> {
    fn new(conversation_id: &'a ConversationId) -> Self {
        Self {
            conversation_id,
            turn_id: Uuid::new_v4(),
            stage: TurnStage::Idle,
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.stage.next() {
            tracing::debug!(
                conversation_id = %self.conversation_id,
                turn_id = %self.turn_id,
                from = %self.stage,
                to = %next,
                "Turn advanced"
            );
            self.stage = next;
        }
    }

    fn fail(&mut self, err: impl Into<ProcessTurnError>) -> ProcessTurnError {
        let err = err.into();
        tracing::warn!(
            conversation_id = %self.conversation_id,
            turn_id = %self.turn_id,
            stage = %self.stage,
            "Turn failed: {}",
            err
        );
        self.stage = TurnStage::Failed;
        err
    }
}

/// Handler for ProcessTurn commands.
///
/// Generic over its ports; `?Sized` so `dyn HistoryStore` and
/// `dyn GenerationClient` work when the adapters are chosen at runtime.
pub struct ProcessTurnHandler<S, G>
where
    S: HistoryStore + ?Sized,
    G: GenerationClient + ?Sized,
{
    history_store: Arc<S>,
    generation_client: Arc<G>,
    prompt_builder: PromptBuilder,
}

impl<S, G> Clone for ProcessTurnHandler<S, G>
where
    S: HistoryStore + ?Sized,
    G: GenerationClient + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            history_store: Arc::clone(&self.history_store),
            generation_client: Arc::clone(&self.generation_client),
            prompt_builder: self.prompt_builder.clone(),
        }
    }
}

impl<S, G> ProcessTurnHandler<S, G>
where
    S: HistoryStore + ?Sized,
    G: GenerationClient + ?Sized,
{
    /// Creates a new handler with the default persona.
    pub fn new(history_store: Arc<S>, generation_client: Arc<G>) -> Self {
        Self {
            history_store,
            generation_client,
            prompt_builder: PromptBuilder::default(),
        }
    }

    /// Replaces the prompt builder.
    pub fn with_prompt_builder(mut self, prompt_builder: PromptBuilder) -> Self {
        self.prompt_builder = prompt_builder;
        self
    }

    /// Handles a process turn command.
    pub async fn handle(&self, cmd: ProcessTurnCommand) -> Result<ProcessTurnResult, ProcessTurnError> {
        let mut progress = TurnProgress::new(&cmd.conversation_id);

        let message = cmd.message.trim();
        if message.is_empty() {
            return Err(progress.fail(ValidationError::empty_field("message")));
        }

        let stored = self
            .history_store
            .read(&cmd.conversation_id)
            .await
            .map_err(|e| progress.fail(e))?;
        progress.advance();

        let payload = self.prompt_builder.build(&stored.history, message);
        progress.advance();

        let raw = self
            .generation_client
            .generate(&payload)
            .await
            .map_err(|e| progress.fail(e))?;
        progress.advance();

        let analysis = parse_analysis(&raw).map_err(|e| {
            tracing::debug!(turn_id = %progress.turn_id, "Rejected model output: {}", raw);
            progress.fail(e)
        })?;
        progress.advance();

        let committed = match self
            .history_store
            .append_turn_pair(&cmd.conversation_id, message, analysis.ai_response())
            .await
        {
            Ok(committed) => committed,
            Err(e) => {
                // The reply is dropped from the response; keep it in the logs.
                tracing::error!(
                    conversation_id = %cmd.conversation_id,
                    turn_id = %progress.turn_id,
                    ai_message = %analysis.ai_response(),
                    "Model reply computed but not persisted"
                );
                return Err(progress.fail(e));
            }
        };
        progress.advance();

        tracing::info!(
            conversation_id = %cmd.conversation_id,
            turn_id = %progress.turn_id,
            model = %self.generation_client.model(),
            history_len = committed.history.len(),
            revision = committed.revision,
            primary_emotion = %analysis.primary_emotion(),
            "Turn completed"
        );
        progress.advance();

        Ok(ProcessTurnResult {
            conversation_id: cmd.conversation_id.clone(),
            history_len: committed.history.len(),
            revision: committed.revision,
            analysis,
        })
    }
}
