//! Intent classification node
//!
//! First node of every turn. Asks the provider for a `UserIntent`
//! constrained to its schema and routes to the matching task handler.

use relay_ai::InferenceProvider;

use crate::{
    error::{Error, Result},
    prompts::PromptSet,
    schemas::{StructuredResponse, UserIntent},
    state::{ConversationState, NextStep, StateUpdate},
};

/// Classify the pending user input and pick the next node.
///
/// A turn with no pending input cannot be classified; that is a caller bug
/// surfaced as `Error::Classification` rather than a silent no-op.
pub async fn classify(
    provider: &dyn InferenceProvider,
    prompts: &dyn PromptSet,
    state: &ConversationState,
) -> Result<StateUpdate> {
    let input = state.user_input.as_deref().unwrap_or("").trim();
    if input.is_empty() {
        return Err(Error::Classification(
            "no user input to classify".to_string(),
        ));
    }

    let request = prompts.intent_prompt(input, &state.messages);
    let value = provider
        .complete_structured(&request, &UserIntent::schema_spec())
        .await
        .map_err(|e| match e {
            relay_ai::Error::StructuredOutput(message) => Error::Classification(message),
            other => Error::Inference(other),
        })?;

    let intent =
        UserIntent::from_value(value).map_err(|e| Error::Classification(e.to_string()))?;

    let next_step = NextStep::from(intent.intent_type);
    tracing::info!(
        intent = intent.intent_type.as_str(),
        confidence = intent.confidence,
        next = next_step.as_str(),
        "intent classified"
    );

    Ok(StateUpdate {
        actions_taken: vec!["classify_intent".to_string()],
        intent: Some(intent),
        next_step: Some(next_step),
        ..Default::default()
    })
}
