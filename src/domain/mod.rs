//! Domain layer - pure types and rules for the chat service.

pub mod conversation;
pub mod foundation;
