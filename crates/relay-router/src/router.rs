//! Turn orchestration
//!
//! `TurnRouter` drives one user turn through the node graph: classify the
//! intent, run the matching task handler, consolidate memory, end. State is
//! checkpointed after every node, and the router holds no per-session state
//! of its own, so concurrent sessions and crash recovery both fall out of
//! the store.

use std::sync::Arc;

use relay_ai::InferenceProvider;

use crate::{
    checkpoint::CheckpointStore,
    classifier,
    error::{Error, Result},
    memory,
    prompts::PromptSet,
    reason::ReasonLimits,
    state::{ConversationState, NextStep},
    task::{self, TaskKind},
    tool::BoxedTool,
};

/// One user turn addressed to a session
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub session_id: String,
    pub user_id: String,
    pub user_input: String,
}

/// Orchestrates turns over a provider, prompt set, tool set, and store.
pub struct TurnRouter {
    provider: Arc<dyn InferenceProvider>,
    prompts: Arc<dyn PromptSet>,
    tools: Vec<BoxedTool>,
    store: Arc<dyn CheckpointStore>,
    limits: ReasonLimits,
}

impl TurnRouter {
    /// Build a router, verifying the prompt set is usable up front.
    pub fn new(
        provider: Arc<dyn InferenceProvider>,
        prompts: Arc<dyn PromptSet>,
        tools: Vec<BoxedTool>,
        store: Arc<dyn CheckpointStore>,
    ) -> Result<Self> {
        if prompts.intent_template().trim().is_empty() {
            return Err(Error::Config("intent template is empty".to_string()));
        }
        for kind in TaskKind::ALL {
            if prompts.task_template(kind).trim().is_empty() {
                return Err(Error::Config(format!(
                    "task template for {} is empty",
                    kind.action_name()
                )));
            }
        }
        if prompts.memory_template().trim().is_empty() {
            return Err(Error::Config("memory template is empty".to_string()));
        }

        Ok(Self {
            provider,
            prompts,
            tools,
            store,
            limits: ReasonLimits::default(),
        })
    }

    /// Replace the default reasoning-loop budgets
    pub fn with_limits(mut self, limits: ReasonLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Run one full turn and return the final state.
    ///
    /// A failure mid-turn leaves the session's checkpoint at the last
    /// completed node; the session stays usable for subsequent turns.
    pub async fn run_turn(&self, request: TurnRequest) -> Result<ConversationState> {
        if request.user_input.trim().is_empty() {
            return Err(Error::Classification("empty user input".to_string()));
        }

        let mut state = match self.store.load(&request.session_id).await? {
            Some(existing) => {
                if existing.user_id != request.user_id {
                    return Err(Error::Config(format!(
                        "session {} belongs to user {}, not {}",
                        existing.session_id, existing.user_id, request.user_id
                    )));
                }
                existing
            }
            None => ConversationState::new(&request.session_id, &request.user_id),
        };

        state.user_input = Some(request.user_input);
        state.next_step = NextStep::ClassifyIntent;
        self.store.save(&state).await?;

        tracing::info!(session = %state.session_id, "turn started");
        self.drive(state).await
    }

    /// Resume a checkpointed session from wherever its last turn stopped.
    ///
    /// A session whose checkpoint is already at the end is returned as-is.
    pub async fn resume(&self, session_id: &str) -> Result<ConversationState> {
        let state = self
            .store
            .load(session_id)
            .await?
            .ok_or_else(|| Error::Checkpoint(format!("no checkpoint for session {}", session_id)))?;

        if state.next_step == NextStep::End {
            return Ok(state);
        }
        tracing::info!(session = %state.session_id, from = state.next_step.as_str(), "resuming turn");
        self.drive(state).await
    }

    async fn drive(&self, mut state: ConversationState) -> Result<ConversationState> {
        loop {
            let node = state.next_step;
            let update = match node {
                NextStep::ClassifyIntent => {
                    classifier::classify(self.provider.as_ref(), self.prompts.as_ref(), &state)
                        .await?
                }
                NextStep::QaAgent => self.run_task(TaskKind::Qa, &state).await?,
                NextStep::SummarizationAgent => {
                    self.run_task(TaskKind::Summarization, &state).await?
                }
                NextStep::CalculationAgent => self.run_task(TaskKind::Calculation, &state).await?,
                NextStep::UpdateMemory => {
                    memory::consolidate(self.provider.as_ref(), self.prompts.as_ref(), &state)
                        .await?
                }
                NextStep::End => {
                    state.user_input = None;
                    self.store.save(&state).await?;
                    tracing::info!(session = %state.session_id, "turn complete");
                    return Ok(state);
                }
            };

            state.apply(update);
            self.store.save(&state).await?;
            tracing::debug!(
                session = %state.session_id,
                node = node.as_str(),
                next = state.next_step.as_str(),
                "node completed"
            );
        }
    }

    async fn run_task(
        &self,
        kind: TaskKind,
        state: &ConversationState,
    ) -> Result<crate::state::StateUpdate> {
        task::run(
            kind,
            self.provider.as_ref(),
            self.prompts.as_ref(),
            &self.tools,
            &self.limits,
            state,
        )
        .await
    }
}
