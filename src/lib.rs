//! Empathic Chat - Conversational emotional-support service
//!
//! Each user message runs one turn: load the bounded history, build a
//! prompt, ask the language model for a structured analysis, validate it,
//! and append the user/model pair to history in one transaction.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod startup;
pub mod telemetry;
