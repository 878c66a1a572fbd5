//! Memory consolidation node
//!
//! Every successful task handler converges here. The consolidator digests
//! the full message history into a rolling summary and the set of document
//! ids still relevant, then terminates the turn.

use std::collections::BTreeSet;

use relay_ai::InferenceProvider;

use crate::{
    error::{Error, Result},
    prompts::PromptSet,
    schemas::{StructuredResponse, UpdateMemoryResponse},
    state::{ConversationState, NextStep, StateUpdate},
};

/// Consolidate conversation memory and end the turn.
pub async fn consolidate(
    provider: &dyn InferenceProvider,
    prompts: &dyn PromptSet,
    state: &ConversationState,
) -> Result<StateUpdate> {
    let request = prompts.memory_prompt(&state.messages);

    let value = provider
        .complete_structured(&request, &UpdateMemoryResponse::schema_spec())
        .await
        .map_err(|e| match e {
            relay_ai::Error::StructuredOutput(message) => Error::StructuredOutput(message),
            other => Error::Inference(other),
        })?;
    let response =
        UpdateMemoryResponse::from_value(value).map_err(|e| Error::StructuredOutput(e.to_string()))?;

    let active_documents: BTreeSet<String> = response.document_ids.into_iter().collect();
    tracing::debug!(
        documents = active_documents.len(),
        "conversation memory consolidated"
    );

    Ok(StateUpdate {
        actions_taken: vec!["update_memory".to_string()],
        conversation_summary: Some(response.summary),
        active_documents: Some(active_documents),
        next_step: Some(NextStep::End),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::DefaultPrompts;
    use async_trait::async_trait;
    use relay_ai::{ChatRequest, Message, SchemaSpec};

    struct FixedProvider {
        value: relay_ai::Result<serde_json::Value>,
    }

    #[async_trait]
    impl InferenceProvider for FixedProvider {
        async fn complete(&self, _request: &ChatRequest) -> relay_ai::Result<Message> {
            Ok(Message::assistant_text(""))
        }

        async fn complete_structured(
            &self,
            _request: &ChatRequest,
            _schema: &SchemaSpec,
        ) -> relay_ai::Result<serde_json::Value> {
            match &self.value {
                Ok(v) => Ok(v.clone()),
                Err(relay_ai::Error::StructuredOutput(m)) => {
                    Err(relay_ai::Error::StructuredOutput(m.clone()))
                }
                Err(_) => unreachable!(),
            }
        }
    }

    #[tokio::test]
    async fn test_consolidation_dedupes_documents_and_ends_turn() {
        let provider = FixedProvider {
            value: Ok(serde_json::json!({
                "summary": "User asked about France.",
                "document_ids": ["d2", "d1", "d2"]
            })),
        };
        let update = consolidate(&provider, &DefaultPrompts, &ConversationState::new("s", "u"))
            .await
            .unwrap();

        assert_eq!(update.next_step, Some(NextStep::End));
        assert_eq!(update.actions_taken, vec!["update_memory"]);
        assert_eq!(
            update.conversation_summary.as_deref(),
            Some("User asked about France.")
        );
        let documents = update.active_documents.unwrap();
        assert_eq!(
            documents.into_iter().collect::<Vec<_>>(),
            vec!["d1".to_string(), "d2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_malformed_consolidation_is_structured_output_error() {
        let provider = FixedProvider {
            value: Ok(serde_json::json!({ "document_ids": ["d1"] })),
        };
        let err = consolidate(&provider, &DefaultPrompts, &ConversationState::new("s", "u"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StructuredOutput(_)));
    }

    #[tokio::test]
    async fn test_provider_rejection_is_structured_output_error() {
        let provider = FixedProvider {
            value: Err(relay_ai::Error::StructuredOutput("empty body".into())),
        };
        let err = consolidate(&provider, &DefaultPrompts, &ConversationState::new("s", "u"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StructuredOutput(_)));
    }
}
