//! Conversation state and the partial-update reducer

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use relay_ai::Message;

use crate::schemas::{IntentKind, UserIntent};

/// Control token naming the component to invoke next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
    ClassifyIntent,
    QaAgent,
    SummarizationAgent,
    CalculationAgent,
    UpdateMemory,
    /// Terminal marker
    End,
}

impl NextStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClassifyIntent => "classify_intent",
            Self::QaAgent => "qa_agent",
            Self::SummarizationAgent => "summarization_agent",
            Self::CalculationAgent => "calculation_agent",
            Self::UpdateMemory => "update_memory",
            Self::End => "end",
        }
    }
}

impl From<IntentKind> for NextStep {
    /// Routing rule: the classified intent is the routing key. An unknown
    /// intent terminates the turn without a task handler.
    fn from(kind: IntentKind) -> Self {
        match kind {
            IntentKind::Qa => Self::QaAgent,
            IntentKind::Summarization => Self::SummarizationAgent,
            IntentKind::Calculation => Self::CalculationAgent,
            IntentKind::Unknown => Self::End,
        }
    }
}

/// Mutable per-session state, owned by the turn router and checkpointed
/// after every node execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    /// Latest raw user turn text; absent outside an active turn
    pub user_input: Option<String>,
    /// Ordered conversation messages; append-only, merged monotonically
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Last-classified intent
    pub intent: Option<UserIntent>,
    /// Which component to invoke next
    pub next_step: NextStep,
    /// Rolling digest, overwritten each turn by the memory consolidator
    #[serde(default)]
    pub conversation_summary: String,
    /// Document ids currently in context, overwritten each turn
    #[serde(default)]
    pub active_documents: BTreeSet<String>,
    /// Audit copy of the last structured response; opaque to the router
    pub current_response: Option<serde_json::Value>,
    /// Tool names invoked during the last task-handler call
    #[serde(default)]
    pub tools_used: Vec<String>,
    /// Checkpoint identity; immutable once set
    pub session_id: String,
    pub user_id: String,
    /// Append-only audit trail of every component that executed
    #[serde(default)]
    pub actions_taken: Vec<String>,
}

impl ConversationState {
    /// Fresh state for a new session
    pub fn new(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            user_input: None,
            messages: vec![],
            intent: None,
            next_step: NextStep::End,
            conversation_summary: String::new(),
            active_documents: BTreeSet::new(),
            current_response: None,
            tools_used: vec![],
            session_id: session_id.into(),
            user_id: user_id.into(),
            actions_taken: vec![],
        }
    }

    /// Apply a partial update. This is the single mutation point nodes go
    /// through: `messages` and `actions_taken` concatenate, every other
    /// field is overwrite-if-set.
    pub fn apply(&mut self, update: StateUpdate) {
        self.messages.extend(update.messages);
        self.actions_taken.extend(update.actions_taken);
        if let Some(intent) = update.intent {
            self.intent = Some(intent);
        }
        if let Some(next_step) = update.next_step {
            self.next_step = next_step;
        }
        if let Some(summary) = update.conversation_summary {
            self.conversation_summary = summary;
        }
        if let Some(documents) = update.active_documents {
            self.active_documents = documents;
        }
        if let Some(response) = update.current_response {
            self.current_response = Some(response);
        }
        if let Some(tools_used) = update.tools_used {
            self.tools_used = tools_used;
        }
    }
}

/// A node's partial state update, merged by [`ConversationState::apply`]
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    /// New messages to concatenate onto the conversation
    pub messages: Vec<Message>,
    /// Audit entries to concatenate onto the trail
    pub actions_taken: Vec<String>,
    pub intent: Option<UserIntent>,
    pub next_step: Option<NextStep>,
    pub conversation_summary: Option<String>,
    pub active_documents: Option<BTreeSet<String>>,
    pub current_response: Option<serde_json::Value>,
    pub tools_used: Option<Vec<String>>,
}
