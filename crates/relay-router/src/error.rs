//! Error types for relay-router

use thiserror::Error;

/// Result type alias using relay-router Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while routing a turn.
///
/// Every variant is scoped to a single turn: the failed turn aborts, the
/// session's checkpoint keeps the audit trail of whatever nodes completed,
/// and the session remains usable on the next turn.
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the inference provider layer
    #[error(transparent)]
    Inference(#[from] relay_ai::Error),

    /// The intent classifier could not produce a conformant UserIntent
    #[error("intent classification failed: {0}")]
    Classification(String),

    /// A task handler's candidate output failed schema or cross-field
    /// validation after exhausting its retry budget
    #[error("response validation failed for {schema}: {message}")]
    ResponseValidation { schema: String, message: String },

    /// The memory consolidator could not produce a conformant response
    #[error("structured output rejected: {0}")]
    StructuredOutput(String),

    /// The checkpoint store failed to load or persist state
    #[error("checkpoint store error: {0}")]
    Checkpoint(String),

    /// Router misconfiguration, surfaced before any turn executes
    #[error("router configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a response-validation error for a named schema
    pub fn validation(schema: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResponseValidation {
            schema: schema.into(),
            message: message.into(),
        }
    }
}
