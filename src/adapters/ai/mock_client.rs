//! Mock Generation Client for testing.
//!
//! Provides a configurable mock implementation of the GenerationClient port,
//! allowing tests to run without calling the real backend.
//!
//! # Features
//!
//! - Pre-configured raw responses, consumed in order
//! - Simulated latency
//! - Error injection
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let client = MockGenerationClient::new()
//!     .with_analysis("anxiety", "work", "That sounds really hard...")
//!     .with_delay(Duration::from_millis(50));
//!
//! let raw = client.generate(&payload).await?;
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::conversation::PromptPayload;
use crate::ports::{GenerationClient, GenerationError};

/// Mock generation client for testing.
#[derive(Debug, Clone)]
pub struct MockGenerationClient {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Simulated latency per request.
    delay: Duration,
    /// Payloads received, for verification.
    calls: Arc<Mutex<Vec<PromptPayload>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return this raw text.
    Raw(String),
    /// Return an error.
    Error(GenerationError),
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerationClient {
    /// Creates a new mock client with no queued responses.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a raw response text.
    pub fn with_raw_response(self, raw: impl Into<String>) -> Self {
        lock(&self.responses).push_back(MockResponse::Raw(raw.into()));
        self
    }

    /// Queues a schema-conformant analysis whose reply is `ai_response`.
    pub fn with_analysis(self, primary_emotion: &str, key_topic: &str, ai_response: &str) -> Self {
        let raw = analysis_json(primary_emotion, key_topic, ai_response);
        self.with_raw_response(raw)
    }

    /// Queues an error.
    pub fn with_error(self, error: GenerationError) -> Self {
        lock(&self.responses).push_back(MockResponse::Error(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of calls made to this client.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded payloads.
    pub fn get_calls(&self) -> Vec<PromptPayload> {
        lock(&self.calls).clone()
    }

    /// Gets the next response or a default analysis.
    fn next_response(&self) -> MockResponse {
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| MockResponse::Raw(analysis_json("calm", "general", "Mock response")))
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate(&self, payload: &PromptPayload) -> Result<String, GenerationError> {
        lock(&self.calls).push(payload.clone());

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response() {
            MockResponse::Raw(raw) => Ok(raw),
            MockResponse::Error(err) => Err(err),
        }
    }

    fn model(&self) -> &str {
        "mock-model-1"
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Renders a schema-conformant model reply.
pub fn analysis_json(primary_emotion: &str, key_topic: &str, ai_response: &str) -> String {
    serde_json::json!({
        "emotion_analysis": {
            "primary_emotion": primary_emotion,
            "intensity": 0.5,
            "stress_level": 0.5
        },
        "insight": {
            "key_topic": key_topic,
            "underlying_need": "empathy"
        },
        "ai_response": ai_response
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::{parse_analysis, ConversationHistory, PromptBuilder};

    fn test_payload() -> PromptPayload {
        PromptBuilder::default().build(&ConversationHistory::new(), "Hello")
    }

    #[tokio::test]
    async fn mock_client_returns_responses_in_order() {
        let client = MockGenerationClient::new()
            .with_raw_response("first")
            .with_raw_response("second");

        assert_eq!(client.generate(&test_payload()).await.unwrap(), "first");
        assert_eq!(client.generate(&test_payload()).await.unwrap(), "second");
    }

    #[tokio::test]
    async fn mock_client_default_response_is_valid_analysis() {
        let client = MockGenerationClient::new();

        let raw = client.generate(&test_payload()).await.unwrap();

        let analysis = parse_analysis(&raw).unwrap();
        assert_eq!(analysis.ai_response(), "Mock response");
    }

    #[tokio::test]
    async fn mock_client_returns_configured_error() {
        let client = MockGenerationClient::new().with_error(GenerationError::RateLimited);

        let err = client.generate(&test_payload()).await.unwrap_err();

        assert!(matches!(err, GenerationError::RateLimited));
    }

    #[tokio::test]
    async fn mock_client_records_calls() {
        let client = MockGenerationClient::new();
        assert_eq!(client.call_count(), 0);

        client.generate(&test_payload()).await.unwrap();

        assert_eq!(client.call_count(), 1);
        assert_eq!(client.get_calls()[0], test_payload());
    }

    #[test]
    fn analysis_json_round_trips_through_validator() {
        let raw = analysis_json("anxiety", "work", "That sounds really hard...");
        let analysis = parse_analysis(&raw).unwrap();

        assert_eq!(analysis.primary_emotion(), "anxiety");
        assert_eq!(analysis.key_topic(), "work");
    }
}
