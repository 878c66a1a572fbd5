//! Tool-augmented reasoning loop
//!
//! One loop shared by all task handlers: iterate completions with a bound
//! tool set, execute requested tools, then ask for a final response
//! constrained to the handler's schema. Both the tool-step budget and the
//! validation retry budget are bounded; exhausting either aborts with
//! `Error::ResponseValidation`.

use std::collections::HashMap;

use relay_ai::{ChatRequest, InferenceProvider, Message};

use crate::{
    error::{Error, Result},
    schemas::StructuredResponse,
    tool::{BoxedTool, ToolResult, to_tool_spec},
};

/// Budgets for one reasoning-loop run
#[derive(Debug, Clone)]
pub struct ReasonLimits {
    /// Maximum tool-call iterations before giving up
    pub max_steps: u32,
    /// Re-asks allowed after a candidate fails validation
    pub max_validation_retries: u32,
}

impl Default for ReasonLimits {
    fn default() -> Self {
        Self {
            max_steps: 8,
            max_validation_retries: 2,
        }
    }
}

/// Outcome of a reasoning-loop run
#[derive(Debug)]
pub struct Reasoning<R> {
    /// The validated structured response
    pub response: R,
    /// Messages produced during the loop, in order
    pub transcript: Vec<Message>,
    /// Names of tools invoked, in invocation order
    pub tools_used: Vec<String>,
}

/// Run the reasoning loop until a schema-conformant response is produced.
pub async fn run<R: StructuredResponse>(
    provider: &dyn InferenceProvider,
    tools: &[BoxedTool],
    mut request: ChatRequest,
    limits: &ReasonLimits,
) -> Result<Reasoning<R>> {
    request.tools = tools.iter().map(|t| to_tool_spec(t.as_ref())).collect();
    let validators = compile_validators(tools);

    let mut transcript: Vec<Message> = Vec::new();
    let mut tools_used: Vec<String> = Vec::new();

    let mut steps = 0u32;
    loop {
        if steps >= limits.max_steps {
            return Err(Error::validation(
                R::NAME,
                format!("tool-step budget of {} exhausted", limits.max_steps),
            ));
        }
        steps += 1;

        let assistant = provider.complete(&request).await?;
        let tool_calls: Vec<(String, String, serde_json::Value)> = assistant
            .tool_calls()
            .into_iter()
            .map(|(id, name, args)| (id.to_string(), name.to_string(), args.clone()))
            .collect();

        transcript.push(assistant.clone());
        request.push(assistant);

        if tool_calls.is_empty() {
            break;
        }

        for (id, name, arguments) in tool_calls {
            let result = execute_tool(tools, &validators, &name, arguments).await;
            tracing::debug!(tool = %name, is_error = result.is_error, "tool executed");
            tools_used.push(name.clone());
            let message = Message::tool_result(id, name, result.content, result.is_error);
            transcript.push(message.clone());
            request.push(message);
        }
    }

    // The model stopped calling tools; ask for the schema-constrained value.
    let mut attempts = 0u32;
    loop {
        let candidate = match provider
            .complete_structured(&request, &R::schema_spec())
            .await
        {
            Ok(value) => R::from_value(value),
            Err(relay_ai::Error::StructuredOutput(message)) => {
                Err(crate::schemas::ValidationError(message))
            }
            Err(other) => return Err(Error::Inference(other)),
        };

        match candidate {
            Ok(response) => {
                return Ok(Reasoning {
                    response,
                    transcript,
                    tools_used,
                });
            }
            Err(failure) => {
                if attempts >= limits.max_validation_retries {
                    return Err(Error::validation(R::NAME, failure.to_string()));
                }
                attempts += 1;
                tracing::warn!(
                    schema = R::NAME,
                    attempt = attempts,
                    "candidate response failed validation: {}",
                    failure
                );
                let feedback = Message::user(format!(
                    "The previous response failed validation: {}. Produce a corrected response.",
                    failure
                ));
                transcript.push(feedback.clone());
                request.push(feedback);
            }
        }
    }
}

fn compile_validators(tools: &[BoxedTool]) -> HashMap<String, jsonschema::Validator> {
    let mut validators = HashMap::new();
    for tool in tools {
        match jsonschema::validator_for(&tool.parameters_schema()) {
            Ok(validator) => {
                validators.insert(tool.name().to_string(), validator);
            }
            Err(e) => {
                tracing::warn!(
                    "Invalid tool parameter schema for '{}', skipping validation: {}",
                    tool.name(),
                    e
                );
            }
        }
    }
    validators
}

async fn execute_tool(
    tools: &[BoxedTool],
    validators: &HashMap<String, jsonschema::Validator>,
    name: &str,
    arguments: serde_json::Value,
) -> ToolResult {
    let Some(tool) = tools.iter().find(|t| t.name() == name) else {
        return ToolResult::error(format!("Tool not found: {}", name));
    };

    if let Some(validator) = validators.get(name) {
        let errors: Vec<String> = validator
            .iter_errors(&arguments)
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", path, e)
                }
            })
            .collect();
        if !errors.is_empty() {
            return ToolResult::error(format!(
                "Tool argument validation failed:\n{}",
                errors.join("\n")
            ));
        }
    }

    tool.execute(arguments).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::AnswerResponse;
    use crate::tool::Tool;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use relay_ai::{Content, SchemaSpec};
    use std::sync::Arc;

    /// A provider that replays scripted completions and structured values.
    struct ScriptedProvider {
        completions: Mutex<Vec<Message>>,
        structured: Mutex<Vec<relay_ai::Result<serde_json::Value>>>,
    }

    impl ScriptedProvider {
        fn new(
            completions: Vec<Message>,
            structured: Vec<relay_ai::Result<serde_json::Value>>,
        ) -> Self {
            Self {
                completions: Mutex::new(completions),
                structured: Mutex::new(structured),
            }
        }
    }

    #[async_trait]
    impl InferenceProvider for ScriptedProvider {
        async fn complete(&self, _request: &ChatRequest) -> relay_ai::Result<Message> {
            let mut completions = self.completions.lock();
            if completions.is_empty() {
                Ok(Message::assistant_text("done"))
            } else {
                Ok(completions.remove(0))
            }
        }

        async fn complete_structured(
            &self,
            _request: &ChatRequest,
            _schema: &SchemaSpec,
        ) -> relay_ai::Result<serde_json::Value> {
            let mut structured = self.structured.lock();
            if structured.is_empty() {
                Err(relay_ai::Error::StructuredOutput("script exhausted".into()))
            } else {
                structured.remove(0)
            }
        }
    }

    struct CountingCalculator {
        calls: Arc<Mutex<u32>>,
    }

    #[async_trait]
    impl Tool for CountingCalculator {
        fn name(&self) -> &str {
            "calculator"
        }
        fn description(&self) -> &str {
            "Evaluate arithmetic"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": { "expression": { "type": "string" } },
                "required": ["expression"]
            })
        }
        async fn execute(&self, _arguments: serde_json::Value) -> ToolResult {
            *self.calls.lock() += 1;
            ToolResult::text("4")
        }
    }

    fn valid_answer() -> serde_json::Value {
        serde_json::json!({
            "question": "q",
            "answer": "Paris",
            "sources": ["encyclopedia"],
            "confidence": 0.95
        })
    }

    #[tokio::test]
    async fn test_loop_without_tool_calls() {
        let provider = ScriptedProvider::new(
            vec![Message::assistant_text("I know this")],
            vec![Ok(valid_answer())],
        );
        let outcome = run::<AnswerResponse>(
            &provider,
            &[],
            ChatRequest::default(),
            &ReasonLimits::default(),
        )
        .await
        .unwrap();
        assert_eq!(outcome.response.answer, "Paris");
        assert!(outcome.tools_used.is_empty());
        assert_eq!(outcome.transcript.len(), 1);
    }

    #[tokio::test]
    async fn test_loop_executes_tools_and_records_names() {
        let calls = Arc::new(Mutex::new(0));
        let tool: BoxedTool = Arc::new(CountingCalculator {
            calls: calls.clone(),
        });
        let provider = ScriptedProvider::new(
            vec![
                Message::assistant(vec![Content::tool_call(
                    "c1",
                    "calculator",
                    serde_json::json!({"expression": "2+2"}),
                )]),
                Message::assistant_text("the answer is 4"),
            ],
            vec![Ok(valid_answer())],
        );

        let outcome = run::<AnswerResponse>(
            &provider,
            &[tool],
            ChatRequest::default(),
            &ReasonLimits::default(),
        )
        .await
        .unwrap();

        assert_eq!(*calls.lock(), 1);
        assert_eq!(outcome.tools_used, vec!["calculator"]);
        // assistant w/ tool call, tool result, final assistant
        assert_eq!(outcome.transcript.len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_tool_arguments_become_error_result() {
        let calls = Arc::new(Mutex::new(0));
        let tool: BoxedTool = Arc::new(CountingCalculator {
            calls: calls.clone(),
        });
        let provider = ScriptedProvider::new(
            vec![
                // missing required "expression"
                Message::assistant(vec![Content::tool_call(
                    "c1",
                    "calculator",
                    serde_json::json!({}),
                )]),
                Message::assistant_text("giving up on the tool"),
            ],
            vec![Ok(valid_answer())],
        );

        let outcome = run::<AnswerResponse>(
            &provider,
            &[tool],
            ChatRequest::default(),
            &ReasonLimits::default(),
        )
        .await
        .unwrap();

        // The tool itself never ran, but the invocation is still recorded.
        assert_eq!(*calls.lock(), 0);
        assert_eq!(outcome.tools_used, vec!["calculator"]);
        let tool_result = &outcome.transcript[1];
        assert!(tool_result.text().contains("validation failed"));
    }

    #[tokio::test]
    async fn test_unknown_tool_reported_to_model() {
        let provider = ScriptedProvider::new(
            vec![
                Message::assistant(vec![Content::tool_call(
                    "c1",
                    "nonexistent",
                    serde_json::json!({}),
                )]),
                Message::assistant_text("ok"),
            ],
            vec![Ok(valid_answer())],
        );

        let outcome = run::<AnswerResponse>(
            &provider,
            &[],
            ChatRequest::default(),
            &ReasonLimits::default(),
        )
        .await
        .unwrap();
        assert!(outcome.transcript[1].text().contains("Tool not found"));
    }

    #[tokio::test]
    async fn test_validation_retry_then_success() {
        let invalid = serde_json::json!({
            "question": "q", "answer": "Paris", "sources": [], "confidence": 0.9
        });
        let provider = ScriptedProvider::new(
            vec![Message::assistant_text("answering")],
            vec![Ok(invalid), Ok(valid_answer())],
        );

        let outcome = run::<AnswerResponse>(
            &provider,
            &[],
            ChatRequest::default(),
            &ReasonLimits::default(),
        )
        .await
        .unwrap();
        assert_eq!(outcome.response.sources, vec!["encyclopedia".to_string()]);
        // transcript gained the validation feedback message
        assert_eq!(outcome.transcript.len(), 2);
    }

    #[tokio::test]
    async fn test_retry_budget_exhaustion_is_validation_error() {
        let invalid = serde_json::json!({
            "question": "q", "answer": "Paris", "sources": [], "confidence": 0.9
        });
        let provider = ScriptedProvider::new(
            vec![Message::assistant_text("answering")],
            vec![Ok(invalid.clone()), Ok(invalid.clone()), Ok(invalid)],
        );

        let err = run::<AnswerResponse>(
            &provider,
            &[],
            ChatRequest::default(),
            &ReasonLimits {
                max_steps: 8,
                max_validation_retries: 2,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::ResponseValidation { .. }));
    }

    #[tokio::test]
    async fn test_step_budget_exhaustion() {
        // The model keeps calling the tool forever.
        let looping: Vec<Message> = (0..10)
            .map(|i| {
                Message::assistant(vec![Content::tool_call(
                    format!("c{}", i),
                    "calculator",
                    serde_json::json!({"expression": "1+1"}),
                )])
            })
            .collect();
        let tool: BoxedTool = Arc::new(CountingCalculator {
            calls: Arc::new(Mutex::new(0)),
        });
        let provider = ScriptedProvider::new(looping, vec![]);

        let err = run::<AnswerResponse>(
            &provider,
            &[tool],
            ChatRequest::default(),
            &ReasonLimits {
                max_steps: 3,
                max_validation_retries: 0,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::ResponseValidation { .. }));
        assert!(err.to_string().contains("budget"));
    }
}
