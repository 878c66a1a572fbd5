//! relay-ai: Inference provider abstraction
//!
//! This crate provides the narrow interface through which the turn router
//! consumes language-model inference: free-text completion with a bound tool
//! set, and schema-constrained structured completion.

pub mod error;
pub mod provider;
pub mod providers;
pub mod types;

pub use error::{Error, Result};
pub use provider::InferenceProvider;
pub use providers::OpenAiProvider;
pub use types::*;
