//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `EMPATHIC_CHAT` prefix
//! and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use empathic_chat::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr().unwrap());
//! ```

mod ai;
mod database;
mod error;
mod history;
mod server;

pub use ai::AiConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use history::{HistoryBackend, HistoryConfig};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "EMPATHIC_CHAT";

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Generation backend configuration (Gemini)
    #[serde(default)]
    pub ai: AiConfig,

    /// Conversation history configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// Database configuration, required by the Postgres history backend
    pub database: Option<DatabaseConfig>,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `EMPATHIC_CHAT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `EMPATHIC_CHAT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `EMPATHIC_CHAT__AI__GEMINI_API_KEY=...` -> `ai.gemini_api_key = ...`
    /// - `EMPATHIC_CHAT__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// The database section is only checked, and only required, when the
    /// history backend is Postgres.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ai.validate()?;
        self.history.validate()?;
        if self.server.request_timeout_secs <= self.ai.timeout_secs {
            return Err(ValidationError::RequestTimeoutTooShort {
                request_secs: self.server.request_timeout_secs,
                generation_secs: self.ai.timeout_secs,
            });
        }
        if self.history.backend == HistoryBackend::Postgres {
            self.database
                .as_ref()
                .ok_or(ValidationError::MissingRequired("DATABASE__URL"))?
                .validate()?;
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "EMPATHIC_CHAT__AI__GEMINI_API_KEY",
        "EMPATHIC_CHAT__DATABASE__URL",
        "EMPATHIC_CHAT__HISTORY__BACKEND",
        "EMPATHIC_CHAT__HISTORY__MAX_TURNS",
        "EMPATHIC_CHAT__SERVER__PORT",
        "EMPATHIC_CHAT__SERVER__ENVIRONMENT",
        "EMPATHIC_CHAT__SERVER__REQUEST_TIMEOUT_SECS",
        "EMPATHIC_CHAT__AI__TIMEOUT_SECS",
    ];

    fn set_minimal_env() {
        env::set_var("EMPATHIC_CHAT__AI__GEMINI_API_KEY", "AIza-test");
        env::set_var("EMPATHIC_CHAT__DATABASE__URL", "postgresql://test@localhost/chat");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn load_with(extra: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();
        set_minimal_env();
        for (key, value) in extra {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn test_load_from_environment() {
        let config = load_with(&[]).unwrap();

        assert!(config.ai.has_api_key());
        assert_eq!(
            config.database.as_ref().map(|d| d.url.as_str()),
            Some("postgresql://test@localhost/chat")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = load_with(&[]).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.ai.model, "gemini-2.5-flash");
        assert_eq!(config.history.backend, HistoryBackend::Postgres);
        assert_eq!(config.history.max_turns, 50);
    }

    #[test]
    fn test_is_production() {
        let config = load_with(&[("EMPATHIC_CHAT__SERVER__ENVIRONMENT", "production")]).unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_custom_server_port() {
        let config = load_with(&[("EMPATHIC_CHAT__SERVER__PORT", "3000")]).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_memory_backend_needs_no_database() {
        let mut config = load_with(&[("EMPATHIC_CHAT__HISTORY__BACKEND", "memory")]).unwrap();
        config.database = None;

        assert_eq!(config.history.backend, HistoryBackend::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_postgres_backend_requires_database() {
        let mut config = load_with(&[]).unwrap();
        config.database = None;

        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("DATABASE__URL"))
        );
    }

    #[test]
    fn test_odd_max_turns_fails_validation() {
        let config = load_with(&[("EMPATHIC_CHAT__HISTORY__MAX_TURNS", "9")]).unwrap();
        assert_eq!(config.validate(), Err(ValidationError::InvalidMaxTurns(9)));
    }

    #[test]
    fn test_request_timeout_must_exceed_generation_timeout() {
        let config = load_with(&[
            ("EMPATHIC_CHAT__SERVER__REQUEST_TIMEOUT_SECS", "60"),
            ("EMPATHIC_CHAT__AI__TIMEOUT_SECS", "90"),
        ])
        .unwrap();

        assert_eq!(
            config.validate(),
            Err(ValidationError::RequestTimeoutTooShort {
                request_secs: 60,
                generation_secs: 90,
            })
        );
    }

    #[test]
    fn test_equal_timeouts_fail_validation() {
        let mut config = load_with(&[]).unwrap();
        config.server.request_timeout_secs = 90;
        config.ai.timeout_secs = 90;

        assert!(matches!(
            config.validate(),
            Err(ValidationError::RequestTimeoutTooShort { .. })
        ));
    }
}
