//! Error types for relay-ai

use thiserror::Error;

/// Result type alias using relay-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when interacting with inference providers
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response
    #[error("API error: {message} (type: {error_type})")]
    Api { error_type: String, message: String },

    /// Invalid API key
    #[error("Invalid or missing API key")]
    InvalidApiKey,

    /// Provider could not produce a value conforming to the requested schema
    #[error("Structured output failure: {0}")]
    StructuredOutput(String),

    /// Unexpected response format
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    /// Create an API error from type and message
    pub fn api(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Check if this error indicates a structured-output failure
    pub fn is_structured_output(&self) -> bool {
        matches!(self, Error::StructuredOutput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_helper() {
        let e = Error::api("invalid_request_error", "bad field");
        assert!(e.to_string().contains("bad field"));
        assert!(e.to_string().contains("invalid_request_error"));
    }

    #[test]
    fn test_is_structured_output() {
        assert!(Error::StructuredOutput("no JSON in reply".into()).is_structured_output());
        assert!(!Error::InvalidApiKey.is_structured_output());
    }
}
