//! Generation Client Adapters.
//!
//! Implementations of the GenerationClient port.
//!
//! ## Available Adapters
//!
//! - `GeminiClient` - Google Gemini models via the Generative Language API
//! - `MockGenerationClient` - Configurable mock for testing

mod gemini_client;
mod mock_client;

pub use gemini_client::{GeminiClient, GeminiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use mock_client::{analysis_json, MockGenerationClient, MockResponse};
