//! Structured response types
//!
//! Every value a handler or the consolidator produces goes through
//! [`StructuredResponse::from_value`]: structural validation against the
//! type's JSON Schema, deserialization, then the type's own cross-field
//! rules. Construction sites are forced to handle the failure path; an
//! invalid response is unrepresentable outside `Result::Err`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::HashMap;

use relay_ai::SchemaSpec;

/// A candidate value failed schema or cross-field validation
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// A self-validating structured result shape
pub trait StructuredResponse: Sized + Serialize + DeserializeOwned {
    /// Schema name reported to the provider
    const NAME: &'static str;

    /// JSON Schema the raw value must conform to
    fn json_schema() -> serde_json::Value;

    /// Cross-field business rules, checked after deserialization
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Validate a raw JSON value and construct the response
    fn from_value(value: serde_json::Value) -> Result<Self, ValidationError> {
        let schema = Self::json_schema();
        let validator = jsonschema::validator_for(&schema)
            .map_err(|e| ValidationError(format!("invalid schema for {}: {}", Self::NAME, e)))?;

        let errors: Vec<String> = validator
            .iter_errors(&value)
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", path, e)
                }
            })
            .collect();
        if !errors.is_empty() {
            return Err(ValidationError(format!(
                "{} failed schema validation:\n{}",
                Self::NAME,
                errors.join("\n")
            )));
        }

        let parsed: Self = serde_json::from_value(value)
            .map_err(|e| ValidationError(format!("{}: {}", Self::NAME, e)))?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// The schema constraint to hand to a provider
    fn schema_spec() -> SchemaSpec {
        SchemaSpec::new(Self::NAME, Self::json_schema())
    }
}

/// Classified category of a turn's purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Qa,
    Summarization,
    Calculation,
    Unknown,
}

impl IntentKind {
    /// The snake_case token used as the routing key
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Qa => "qa",
            Self::Summarization => "summarization",
            Self::Calculation => "calculation",
            Self::Unknown => "unknown",
        }
    }
}

/// User intent classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIntent {
    /// Type of user intent
    pub intent_type: IntentKind,
    /// Confidence score of the classification
    pub confidence: f64,
    /// Explanation of how the intent was determined
    pub reasoning: String,
}

impl StructuredResponse for UserIntent {
    const NAME: &'static str = "user_intent";

    fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "intent_type": {
                    "type": "string",
                    "enum": ["qa", "summarization", "calculation", "unknown"]
                },
                "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
                "reasoning": { "type": "string" }
            },
            "required": ["intent_type", "confidence", "reasoning"]
        })
    }
}

/// Structured response for Q&A tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    /// Question text
    pub question: String,
    /// The generated answer
    pub answer: String,
    /// Sources supporting the answer
    #[serde(default)]
    pub sources: Vec<String>,
    /// Confidence score of the answer
    pub confidence: f64,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl AnswerResponse {
    /// Construct a validated answer
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        sources: Vec<String>,
        confidence: f64,
    ) -> Result<Self, ValidationError> {
        let response = Self {
            question: question.into(),
            answer: answer.into(),
            sources,
            confidence,
            timestamp: Utc::now(),
        };
        response.validate()?;
        Ok(response)
    }
}

impl StructuredResponse for AnswerResponse {
    const NAME: &'static str = "answer_response";

    fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "question": { "type": "string" },
                "answer": { "type": "string" },
                "sources": { "type": "array", "items": { "type": "string" } },
                "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 }
            },
            "required": ["question", "answer", "confidence"]
        })
    }

    /// High confidence requires at least one source
    fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ValidationError(format!(
                "confidence {} out of range [0, 1]",
                self.confidence
            )));
        }
        if self.confidence >= 0.7 && self.sources.is_empty() {
            return Err(ValidationError(format!(
                "sources cannot be empty when confidence is high ({}); \
                 provide at least one source to support the claim",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// Structured response for summarization tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizationResponse {
    /// Length of the original text
    pub original_length: u64,
    /// The generated summary
    pub summary: String,
    /// Key points extracted from the material
    pub key_points: Vec<String>,
    /// Documents that were summarized
    #[serde(default)]
    pub document_ids: Vec<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl StructuredResponse for SummarizationResponse {
    const NAME: &'static str = "summarization_response";

    fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "original_length": { "type": "integer", "minimum": 0 },
                "summary": { "type": "string" },
                "key_points": { "type": "array", "items": { "type": "string" } },
                "document_ids": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["original_length", "summary", "key_points"]
        })
    }
}

/// Structured response for calculation tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResponse {
    /// The mathematical expression
    pub expression: String,
    /// The calculated result
    pub result: f64,
    /// Step-by-step explanation
    pub explanation: String,
    /// Units, if applicable
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl StructuredResponse for CalculationResponse {
    const NAME: &'static str = "calculation_response";

    fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": { "type": "string" },
                "result": { "type": "number" },
                "explanation": { "type": "string" },
                "units": { "type": ["string", "null"] }
            },
            "required": ["expression", "result", "explanation"]
        })
    }
}

/// Response from the memory consolidation step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMemoryResponse {
    /// Summary of the conversation up to this point
    pub summary: String,
    /// Document ids relevant to the user's last message
    #[serde(default)]
    pub document_ids: Vec<String>,
}

impl StructuredResponse for UpdateMemoryResponse {
    const NAME: &'static str = "update_memory_response";

    fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "summary": { "type": "string" },
                "document_ids": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["summary"]
        })
    }
}

/// A chunk of document content, as returned by retrieval tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Document identifier
    pub doc_id: String,
    /// The actual text content
    pub content: String,
    /// Additional metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Relevance score for retrieval
    #[serde(default)]
    pub relevance_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_high_confidence_requires_sources() {
        let err = AnswerResponse::new("q", "a", vec![], 0.9);
        assert!(err.is_err());
        assert!(err.unwrap_err().0.contains("sources cannot be empty"));
    }

    #[test]
    fn test_answer_high_confidence_with_sources_ok() {
        let ok = AnswerResponse::new(
            "What is the capital of France?",
            "Paris",
            vec!["encyclopedia".to_string()],
            0.95,
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_answer_low_confidence_without_sources_ok() {
        assert!(AnswerResponse::new("q", "a", vec![], 0.5).is_ok());
    }

    #[test]
    fn test_answer_boundary_confidence() {
        // 0.7 is the high-confidence threshold, inclusive
        assert!(AnswerResponse::new("q", "a", vec![], 0.7).is_err());
        assert!(AnswerResponse::new("q", "a", vec![], 0.69).is_ok());
    }

    #[test]
    fn test_answer_confidence_out_of_range() {
        assert!(AnswerResponse::new("q", "a", vec!["s".into()], 1.5).is_err());
    }

    #[test]
    fn test_from_value_enforces_cross_field_rule() {
        let value = serde_json::json!({
            "question": "q",
            "answer": "a",
            "sources": [],
            "confidence": 0.9
        });
        assert!(AnswerResponse::from_value(value).is_err());
    }

    #[test]
    fn test_from_value_rejects_missing_required() {
        let value = serde_json::json!({"answer": "a", "confidence": 0.2});
        let err = AnswerResponse::from_value(value).unwrap_err();
        assert!(err.0.contains("question"), "got: {}", err.0);
    }

    #[test]
    fn test_from_value_rejects_wrong_type() {
        let value = serde_json::json!({
            "question": "q",
            "answer": "a",
            "confidence": "high"
        });
        assert!(AnswerResponse::from_value(value).is_err());
    }

    #[test]
    fn test_from_value_accepts_valid_answer() {
        let value = serde_json::json!({
            "question": "What is the capital of France?",
            "answer": "Paris",
            "sources": ["encyclopedia"],
            "confidence": 0.95
        });
        let response = AnswerResponse::from_value(value).unwrap();
        assert_eq!(response.answer, "Paris");
        assert_eq!(response.sources, vec!["encyclopedia".to_string()]);
    }

    #[test]
    fn test_summarization_empty_key_points_not_rejected() {
        let value = serde_json::json!({
            "original_length": 1200,
            "summary": "short",
            "key_points": []
        });
        let response = SummarizationResponse::from_value(value).unwrap();
        assert!(response.key_points.is_empty());
    }

    #[test]
    fn test_summarization_missing_key_points_rejected() {
        let value = serde_json::json!({"original_length": 10, "summary": "s"});
        assert!(SummarizationResponse::from_value(value).is_err());
    }

    #[test]
    fn test_calculation_units_optional() {
        let value = serde_json::json!({
            "expression": "2 + 2",
            "result": 4.0,
            "explanation": "add"
        });
        let response = CalculationResponse::from_value(value).unwrap();
        assert!(response.units.is_none());
    }

    #[test]
    fn test_user_intent_rejects_unknown_variant() {
        let value = serde_json::json!({
            "intent_type": "translation",
            "confidence": 0.8,
            "reasoning": "r"
        });
        assert!(UserIntent::from_value(value).is_err());
    }

    #[test]
    fn test_user_intent_accepts_all_kinds() {
        for kind in ["qa", "summarization", "calculation", "unknown"] {
            let value = serde_json::json!({
                "intent_type": kind,
                "confidence": 0.5,
                "reasoning": "r"
            });
            let intent = UserIntent::from_value(value).unwrap();
            assert_eq!(intent.intent_type.as_str(), kind);
        }
    }

    #[test]
    fn test_update_memory_defaults_document_ids() {
        let value = serde_json::json!({"summary": "talked about France"});
        let response = UpdateMemoryResponse::from_value(value).unwrap();
        assert!(response.document_ids.is_empty());
    }
}
