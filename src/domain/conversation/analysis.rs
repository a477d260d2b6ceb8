//! Emotional analysis returned by the language model, and its validator.
//!
//! The backend is instructed to answer with a JSON document matching
//! [`RESPONSE_SCHEMA`](super::prompt::RESPONSE_SCHEMA). Its output is still
//! untrusted: [`parse_analysis`] decodes every field with its expected type
//! and rejects the reply when anything is missing, mistyped or out of range.
//! A non-empty `ai_response` is the acceptance gate; nothing is extracted
//! from a reply that fails it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Emotion read from the user's latest message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionAnalysis {
    /// Dominant emotion (joy, sadness, anger, fear, anxiety, ...).
    pub primary_emotion: String,
    /// Strength of the emotion, 0.0 to 1.0.
    pub intensity: f64,
    /// Estimated stress, 0.0 to 1.0.
    pub stress_level: f64,
}

/// What the user is talking about and what they seem to need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// Central topic of the user's concern.
    pub key_topic: String,
    /// What the user is looking for (empathy, advice, to be heard, ...).
    pub underlying_need: String,
}

/// Structured result of one turn, produced from the model's raw output.
///
/// Serializes back to the same nested shape the model produced, which is
/// what callers receive as `emotion_parameters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub emotion_analysis: EmotionAnalysis,
    pub insight: Insight,
    /// The reply shown to the user.
    pub ai_response: String,
}

impl AnalysisResult {
    pub fn primary_emotion(&self) -> &str {
        &self.emotion_analysis.primary_emotion
    }

    pub fn intensity(&self) -> f64 {
        self.emotion_analysis.intensity
    }

    pub fn stress_level(&self) -> f64 {
        self.emotion_analysis.stress_level
    }

    pub fn key_topic(&self) -> &str {
        &self.insight.key_topic
    }

    pub fn underlying_need(&self) -> &str {
        &self.insight.underlying_need
    }

    pub fn ai_response(&self) -> &str {
        &self.ai_response
    }
}

/// The model's reply did not satisfy the response contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedResponse {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("response is missing a string 'ai_response'")]
    MissingReply,

    #[error("response has an empty 'ai_response'")]
    EmptyReply,

    #[error("response does not match the schema: {0}")]
    SchemaMismatch(String),

    #[error("'{field}' must be between 0.0 and 1.0, got {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Parses and validates raw model output into an [`AnalysisResult`].
///
/// # Errors
///
/// Returns [`MalformedResponse`] when the text is not JSON, when
/// `ai_response` is absent, not a string or blank, when any schema field is
/// missing or has the wrong type, or when a score falls outside `[0, 1]`.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, MalformedResponse> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| MalformedResponse::InvalidJson(e.to_string()))?;

    match value.get("ai_response") {
        Some(Value::String(reply)) if reply.trim().is_empty() => {
            return Err(MalformedResponse::EmptyReply)
        }
        Some(Value::String(_)) => {}
        _ => return Err(MalformedResponse::MissingReply),
    }

    let result: AnalysisResult = serde_json::from_value(value)
        .map_err(|e| MalformedResponse::SchemaMismatch(e.to_string()))?;

    check_unit_range("emotion_analysis.intensity", result.intensity())?;
    check_unit_range("emotion_analysis.stress_level", result.stress_level())?;

    Ok(result)
}

fn check_unit_range(field: &'static str, value: f64) -> Result<(), MalformedResponse> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(MalformedResponse::OutOfRange { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "emotion_analysis": {"primary_emotion": "anxiety", "intensity": 0.7, "stress_level": 0.8},
        "insight": {"key_topic": "work", "underlying_need": "empathy"},
        "ai_response": "That sounds really hard..."
    }"#;

    #[test]
    fn parses_valid_response() {
        let result = parse_analysis(VALID).unwrap();

        assert_eq!(result.primary_emotion(), "anxiety");
        assert_eq!(result.intensity(), 0.7);
        assert_eq!(result.stress_level(), 0.8);
        assert_eq!(result.key_topic(), "work");
        assert_eq!(result.underlying_need(), "empathy");
        assert_eq!(result.ai_response(), "That sounds really hard...");
    }

    #[test]
    fn accepts_non_ascii_fields() {
        let raw = r#"{
            "emotion_analysis": {"primary_emotion": "anxiety", "intensity": 0.7, "stress_level": 0.8},
            "insight": {"key_topic": "work", "underlying_need": "共感"},
            "ai_response": "That sounds really hard..."
        }"#;

        let result = parse_analysis(raw).unwrap();
        assert_eq!(result.underlying_need(), "共感");
    }

    #[test]
    fn ignores_extra_fields() {
        let raw = r#"{
            "emotion_analysis": {"primary_emotion": "joy", "intensity": 0.2, "stress_level": 0.1, "note": "x"},
            "insight": {"key_topic": "family", "underlying_need": "to be heard"},
            "ai_response": "I'm glad!",
            "confidence": 0.9
        }"#;

        assert!(parse_analysis(raw).is_ok());
    }

    #[test]
    fn rejects_non_json() {
        let err = parse_analysis("Sure! Here is my answer").unwrap_err();
        assert!(matches!(err, MalformedResponse::InvalidJson(_)));
    }

    #[test]
    fn rejects_missing_ai_response() {
        let raw = r#"{
            "emotion_analysis": {"primary_emotion": "anxiety", "intensity": 0.7, "stress_level": 0.8},
            "insight": {"key_topic": "work", "underlying_need": "empathy"}
        }"#;

        assert_eq!(parse_analysis(raw).unwrap_err(), MalformedResponse::MissingReply);
    }

    #[test]
    fn rejects_non_string_ai_response() {
        let raw = r#"{"ai_response": 42}"#;
        assert_eq!(parse_analysis(raw).unwrap_err(), MalformedResponse::MissingReply);
    }

    #[test]
    fn rejects_blank_ai_response() {
        let raw = r#"{
            "emotion_analysis": {"primary_emotion": "anxiety", "intensity": 0.7, "stress_level": 0.8},
            "insight": {"key_topic": "work", "underlying_need": "empathy"},
            "ai_response": "   "
        }"#;

        assert_eq!(parse_analysis(raw).unwrap_err(), MalformedResponse::EmptyReply);
    }

    #[test]
    fn rejects_missing_analysis_section() {
        let raw = r#"{
            "insight": {"key_topic": "work", "underlying_need": "empathy"},
            "ai_response": "Hello"
        }"#;

        let err = parse_analysis(raw).unwrap_err();
        assert!(matches!(err, MalformedResponse::SchemaMismatch(_)));
    }

    #[test]
    fn rejects_mistyped_score() {
        let raw = r#"{
            "emotion_analysis": {"primary_emotion": "anxiety", "intensity": "high", "stress_level": 0.8},
            "insight": {"key_topic": "work", "underlying_need": "empathy"},
            "ai_response": "Hello"
        }"#;

        let err = parse_analysis(raw).unwrap_err();
        assert!(matches!(err, MalformedResponse::SchemaMismatch(_)));
    }

    #[test]
    fn rejects_out_of_range_score() {
        let raw = r#"{
            "emotion_analysis": {"primary_emotion": "anger", "intensity": 0.4, "stress_level": 1.5},
            "insight": {"key_topic": "traffic", "underlying_need": "to vent"},
            "ai_response": "That is frustrating."
        }"#;

        let err = parse_analysis(raw).unwrap_err();
        assert_eq!(
            err,
            MalformedResponse::OutOfRange {
                field: "emotion_analysis.stress_level",
                value: 1.5
            }
        );
    }

    #[test]
    fn serializes_back_to_nested_shape() {
        let result = parse_analysis(VALID).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["emotion_analysis"]["primary_emotion"], "anxiety");
        assert_eq!(json["insight"]["key_topic"], "work");
        assert_eq!(json["ai_response"], "That sounds really hard...");
    }
}
