//! Application handlers.
//!
//! Command handlers that orchestrate domain operations over the ports.

pub mod chat;

pub use chat::{
    ProcessTurnCommand, ProcessTurnError, ProcessTurnHandler, ProcessTurnResult, TurnStage,
};
