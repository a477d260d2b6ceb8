//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Generation timeout must be between 1 and 300 seconds")]
    InvalidGenerationTimeout,

    #[error("Invalid generation base URL")]
    InvalidBaseUrl,

    #[error("History max_turns must be an even number of at least 2, got {0}")]
    InvalidMaxTurns(usize),

    #[error("Invalid default conversation id: {0}")]
    InvalidConversationId(String),

    #[error(
        "Request timeout ({request_secs}s) must exceed the generation timeout ({generation_secs}s)"
    )]
    RequestTimeoutTooShort { request_secs: u64, generation_secs: u64 },
}
