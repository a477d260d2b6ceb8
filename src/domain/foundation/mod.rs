//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps and validation errors that the
//! conversation module builds on.

mod errors;
mod ids;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{ConversationId, MAX_CONVERSATION_ID_LEN};
pub use timestamp::Timestamp;
