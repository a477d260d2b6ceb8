//! Conversation module - turns, bounded history, prompts and model replies.
//!
//! Everything here is pure: no I/O, no clocks. The history store and the
//! generation client live behind ports; this module only defines what they
//! exchange and how a turn pair folds into history.

mod analysis;
mod history;
mod prompt;

pub use analysis::{parse_analysis, AnalysisResult, EmotionAnalysis, Insight, MalformedResponse};
pub use history::{ConversationHistory, Role, Turn, MAX_HISTORY};
pub use prompt::{PromptBuilder, PromptPayload, PERSONA_DIRECTIVE, RESPONSE_SCHEMA};
