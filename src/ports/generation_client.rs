//! Generation Client Port - the external language-model call.
//!
//! The backend receives the ordered turns of a [`PromptPayload`] and is
//! configured to answer with a bare JSON document. The returned text is
//! handed to the response validator untouched; this port does not parse it.
//!
//! No retries happen at this boundary. Any transport or backend failure is
//! reported once and the turn aborts.

use async_trait::async_trait;

use crate::domain::conversation::PromptPayload;

/// Port for language-model generation.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Sends the payload and returns the raw response text.
    async fn generate(&self, payload: &PromptPayload) -> Result<String, GenerationError>;

    /// Identifier of the model answering requests (for logs).
    fn model(&self) -> &str;
}

/// Generation backend errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// API key rejected.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Rate limited by the backend.
    #[error("rate limited by generation backend")]
    RateLimited,

    /// Backend returned a server error.
    #[error("generation backend unavailable: {0}")]
    Unavailable(String),

    /// The prompt was blocked by the backend's safety filters.
    #[error("prompt blocked: {reason}")]
    Blocked {
        /// Block reason reported by the backend.
        reason: String,
    },

    /// The backend answered but the envelope was unusable.
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),
}

impl GenerationError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Creates a blocked error.
    pub fn blocked(reason: impl Into<String>) -> Self {
        Self::Blocked {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_client_is_object_safe() {
        fn _accepts_dyn(_client: &dyn GenerationClient) {}
    }

    #[test]
    fn generation_error_displays_correctly() {
        assert_eq!(
            GenerationError::Timeout { timeout_secs: 90 }.to_string(),
            "request timed out after 90s"
        );
        assert_eq!(
            GenerationError::blocked("SAFETY").to_string(),
            "prompt blocked: SAFETY"
        );
        assert_eq!(
            GenerationError::network("connection reset").to_string(),
            "network error: connection reset"
        );
    }
}
