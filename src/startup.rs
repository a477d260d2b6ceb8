//! Process wiring: config in, router state out.

use secrecy::ExposeSecret;
use std::sync::Arc;
use thiserror::Error;

use crate::adapters::ai::{GeminiClient, GeminiConfig};
use crate::adapters::http::ChatAppState;
use crate::adapters::postgres::PostgresHistoryStore;
use crate::adapters::storage::InMemoryHistoryStore;
use crate::config::{AppConfig, ConfigError, HistoryBackend, ValidationError};
use crate::ports::{GenerationClient, GenerationError, HistoryStore};

/// Errors that stop the service from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Generation client setup failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationError> for StartupError {
    fn from(err: ValidationError) -> Self {
        StartupError::Config(ConfigError::ValidationFailed(err))
    }
}

/// Builds the history store for the configured backend.
pub async fn build_history_store(config: &AppConfig) -> Result<Arc<dyn HistoryStore>, StartupError> {
    let max_turns = config.history.max_turns;

    match config.history.backend {
        HistoryBackend::Memory => {
            tracing::warn!("Using in-memory history; conversations are lost on restart");
            Ok(Arc::new(InMemoryHistoryStore::with_max_turns(max_turns)))
        }
        HistoryBackend::Postgres => {
            let database = config
                .database
                .as_ref()
                .ok_or(ValidationError::MissingRequired("DATABASE__URL"))?;

            let pool = database.pool_options().connect(&database.url).await?;
            let store = PostgresHistoryStore::with_max_turns(pool, max_turns);

            if database.run_migrations {
                store.migrate().await?;
                tracing::info!("Database migrations applied");
            }

            Ok(Arc::new(store))
        }
    }
}

/// Builds the Gemini generation client.
pub fn build_generation_client(config: &AppConfig) -> Result<Arc<dyn GenerationClient>, StartupError> {
    let api_key = config
        .ai
        .gemini_api_key
        .as_ref()
        .ok_or(ValidationError::MissingRequired("AI__GEMINI_API_KEY"))?;

    let gemini = GeminiConfig::new(api_key.expose_secret().clone())
        .with_model(config.ai.model.clone())
        .with_base_url(config.ai.base_url.clone())
        .with_timeout(config.ai.timeout());

    Ok(Arc::new(GeminiClient::new(gemini)?))
}

/// Validates the configuration and assembles the router state.
pub async fn build_state(config: &AppConfig) -> Result<ChatAppState, StartupError> {
    config.validate()?;

    let default_conversation_id = config.history.default_conversation()?;
    let generation_client = build_generation_client(config)?;
    let history_store = build_history_store(config).await?;

    tracing::info!(
        backend = ?config.history.backend,
        model = %generation_client.model(),
        max_turns = config.history.max_turns,
        default_conversation_id = %default_conversation_id,
        "Chat service wired"
    );

    Ok(ChatAppState::new(
        history_store,
        generation_client,
        default_conversation_id,
    ))
}
