//! relay-router: turn routing for a conversational assistant
//!
//! A user turn flows through a small node graph: an intent classifier picks
//! one of three task handlers (question answering, summarization,
//! calculation), the handler runs a tool-augmented reasoning loop and emits
//! a schema-validated response, and a memory consolidator digests the
//! conversation before the turn ends. Conversation state is checkpointed
//! after every node through a pluggable store.

pub mod checkpoint;
pub mod classifier;
pub mod error;
pub mod memory;
pub mod prompts;
pub mod reason;
pub mod router;
pub mod schemas;
pub mod state;
pub mod task;
pub mod tool;

pub use checkpoint::{CheckpointStore, FileStore, MemoryStore};
pub use error::{Error, Result};
pub use prompts::{DefaultPrompts, PromptSet};
pub use reason::ReasonLimits;
pub use router::{TurnRequest, TurnRouter};
pub use schemas::{
    AnswerResponse, CalculationResponse, DocumentChunk, IntentKind, StructuredResponse,
    SummarizationResponse, UpdateMemoryResponse, UserIntent,
};
pub use state::{ConversationState, NextStep, StateUpdate};
pub use task::TaskKind;
pub use tool::{BoxedTool, Tool, ToolResult};
