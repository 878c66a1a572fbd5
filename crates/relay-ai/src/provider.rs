//! Inference provider abstraction
//!
//! The router consumes language-model inference through this trait. Providers
//! own their own retry and timeout policy; callers treat both methods as
//! single, potentially long-running operations.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChatRequest, Message, SchemaSpec};

/// A language-model inference backend
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Run a completion over the request's messages with its bound tool set.
    ///
    /// The returned assistant message may contain tool calls.
    async fn complete(&self, request: &ChatRequest) -> Result<Message>;

    /// Run a completion constrained to the given JSON schema.
    ///
    /// Returns the raw JSON value, or `Error::StructuredOutput` if the
    /// provider could not produce conformant JSON.
    async fn complete_structured(
        &self,
        request: &ChatRequest,
        schema: &SchemaSpec,
    ) -> Result<serde_json::Value>;
}
