//! Task handler nodes
//!
//! One handler per supported intent. All three share the reasoning loop in
//! [`crate::reason`] and differ only in template and response schema, so the
//! per-kind work is a single generic function monomorphized per schema.

use relay_ai::{InferenceProvider, Message};

use crate::{
    error::{Error, Result},
    prompts::PromptSet,
    reason::{self, ReasonLimits},
    schemas::{AnswerResponse, CalculationResponse, StructuredResponse, SummarizationResponse},
    state::{ConversationState, NextStep, StateUpdate},
    tool::BoxedTool,
};

/// The three task handlers a classified turn can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Qa,
    Summarization,
    Calculation,
}

impl TaskKind {
    pub const ALL: [TaskKind; 3] = [
        TaskKind::Qa,
        TaskKind::Summarization,
        TaskKind::Calculation,
    ];

    /// Audit-trail entry recorded when this handler runs
    pub fn action_name(self) -> &'static str {
        match self {
            TaskKind::Qa => "qa_agent",
            TaskKind::Summarization => "summarization_agent",
            TaskKind::Calculation => "calculation_agent",
        }
    }
}

/// Run the handler for `kind` against the pending user input.
///
/// The returned update carries the new user message plus everything the
/// reasoning loop produced, and always routes onward to memory
/// consolidation.
pub async fn run(
    kind: TaskKind,
    provider: &dyn InferenceProvider,
    prompts: &dyn PromptSet,
    tools: &[BoxedTool],
    limits: &ReasonLimits,
    state: &ConversationState,
) -> Result<StateUpdate> {
    match kind {
        TaskKind::Qa => finish::<AnswerResponse>(kind, provider, prompts, tools, limits, state).await,
        TaskKind::Summarization => {
            finish::<SummarizationResponse>(kind, provider, prompts, tools, limits, state).await
        }
        TaskKind::Calculation => {
            finish::<CalculationResponse>(kind, provider, prompts, tools, limits, state).await
        }
    }
}

async fn finish<R: StructuredResponse>(
    kind: TaskKind,
    provider: &dyn InferenceProvider,
    prompts: &dyn PromptSet,
    tools: &[BoxedTool],
    limits: &ReasonLimits,
    state: &ConversationState,
) -> Result<StateUpdate> {
    let input = state.user_input.as_deref().unwrap_or("");
    let request = prompts.task_prompt(kind, input, &state.messages);

    let outcome = reason::run::<R>(provider, tools, request, limits).await?;
    tracing::info!(
        handler = kind.action_name(),
        tools = outcome.tools_used.len(),
        "task handler produced a response"
    );

    let mut messages = Vec::with_capacity(1 + outcome.transcript.len());
    messages.push(Message::user(input));
    messages.extend(outcome.transcript);

    Ok(StateUpdate {
        messages,
        actions_taken: vec![kind.action_name().to_string()],
        current_response: Some(
            serde_json::to_value(&outcome.response)
                .map_err(|e| Error::StructuredOutput(e.to_string()))?,
        ),
        tools_used: Some(outcome.tools_used),
        next_step: Some(NextStep::UpdateMemory),
        ..Default::default()
    })
}
