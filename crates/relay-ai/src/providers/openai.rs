//! OpenAI-compatible Chat Completions provider (non-streaming)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    provider::InferenceProvider,
    types::{ChatRequest, Content, Message, SchemaSpec},
};

/// Client for OpenAI-compatible chat completion endpoints
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    /// Create a new provider with an explicit API key
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Create from the OPENAI_API_KEY environment variable
    pub fn from_env(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| Error::InvalidApiKey)?;
        Ok(Self::new(api_key, base_url, model))
    }

    async fn send(
        &self,
        request: &ChatRequest,
        response_format: Option<serde_json::Value>,
    ) -> Result<WireAssistant> {
        let body = self.build_request(request, response_format);
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        tracing::debug!(model = %self.model, messages = body.messages.len(), "sending chat completion");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(Error::InvalidApiKey);
            }
            return Err(Error::api(format!("http_{}", status.as_u16()), text));
        }

        let completion: ChatResponse = response.json().await?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::UnexpectedResponse("no choices in completion".to_string()))?;

        Ok(choice.message)
    }

    fn build_request(
        &self,
        request: &ChatRequest,
        response_format: Option<serde_json::Value>,
    ) -> WireRequest {
        let mut messages = Vec::new();

        if let Some(ref system_prompt) = request.system_prompt {
            messages.push(WireMessage {
                role: "system".to_string(),
                content: Some(system_prompt.clone()),
                tool_calls: None,
                tool_call_id: None,
            });
        }

        for msg in &request.messages {
            messages.push(convert_message(msg));
        }

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(
                request
                    .tools
                    .iter()
                    .map(|t| WireTool {
                        tool_type: "function".to_string(),
                        function: WireFunction {
                            name: t.name.clone(),
                            description: Some(t.description.clone()),
                            parameters: Some(t.parameters.clone()),
                        },
                    })
                    .collect(),
            )
        };

        let has_tools = tools.is_some();
        WireRequest {
            model: self.model.clone(),
            messages,
            tools,
            tool_choice: if has_tools {
                Some(serde_json::json!("auto"))
            } else {
                None
            },
            response_format,
        }
    }
}

#[async_trait]
impl InferenceProvider for OpenAiProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<Message> {
        let wire = self.send(request, None).await?;

        let mut content = Vec::new();
        if let Some(text) = wire.content {
            if !text.is_empty() {
                content.push(Content::text(text));
            }
        }
        for tc in wire.tool_calls.unwrap_or_default() {
            let arguments = serde_json::from_str(&tc.function.arguments)
                .unwrap_or_else(|_| serde_json::json!({}));
            content.push(Content::tool_call(tc.id, tc.function.name, arguments));
        }

        Ok(Message::assistant(content))
    }

    async fn complete_structured(
        &self,
        request: &ChatRequest,
        schema: &SchemaSpec,
    ) -> Result<serde_json::Value> {
        let response_format = serde_json::json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema.name,
                "schema": schema.schema,
                "strict": true,
            }
        });

        let wire = self.send(request, Some(response_format)).await?;
        let text = wire.content.unwrap_or_default();
        if text.trim().is_empty() {
            return Err(Error::StructuredOutput(format!(
                "empty response for schema '{}'",
                schema.name
            )));
        }

        serde_json::from_str(&text).map_err(|e| {
            Error::StructuredOutput(format!(
                "response for schema '{}' is not valid JSON: {}",
                schema.name, e
            ))
        })
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireAssistant,
}

#[derive(Debug, Deserialize)]
struct WireAssistant {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

fn convert_message(msg: &Message) -> WireMessage {
    match msg {
        Message::System { content, .. } => WireMessage {
            role: "system".to_string(),
            content: Some(content.clone()),
            tool_calls: None,
            tool_call_id: None,
        },
        Message::User { content, .. } => WireMessage {
            role: "user".to_string(),
            content: Some(content.clone()),
            tool_calls: None,
            tool_call_id: None,
        },
        Message::Assistant { content, .. } => {
            let mut text_parts = Vec::new();
            let mut tool_calls = Vec::new();

            for c in content {
                match c {
                    Content::Text { text } => text_parts.push(text.clone()),
                    Content::ToolCall {
                        id,
                        name,
                        arguments,
                    } => tool_calls.push(WireToolCall {
                        id: id.clone(),
                        call_type: "function".to_string(),
                        function: WireFunctionCall {
                            name: name.clone(),
                            arguments: serde_json::to_string(arguments).unwrap_or_default(),
                        },
                    }),
                }
            }

            WireMessage {
                role: "assistant".to_string(),
                content: if text_parts.is_empty() {
                    None
                } else {
                    Some(text_parts.join(""))
                },
                tool_calls: if tool_calls.is_empty() {
                    None
                } else {
                    Some(tool_calls)
                },
                tool_call_id: None,
            }
        }
        Message::ToolResult {
            tool_call_id,
            content,
            ..
        } => WireMessage {
            role: "tool".to_string(),
            content: Some(content.clone()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.clone()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_user_message() {
        let wire = convert_message(&Message::user("hello"));
        assert_eq!(wire.role, "user");
        assert_eq!(wire.content.as_deref(), Some("hello"));
    }

    #[test]
    fn test_convert_assistant_with_tool_call() {
        let msg = Message::assistant(vec![Content::tool_call(
            "call_1",
            "calculator",
            serde_json::json!({"expression": "2+2"}),
        )]);
        let wire = convert_message(&msg);
        assert_eq!(wire.role, "assistant");
        assert!(wire.content.is_none());
        let calls = wire.tool_calls.unwrap();
        assert_eq!(calls[0].function.name, "calculator");
        assert!(calls[0].function.arguments.contains("2+2"));
    }

    #[test]
    fn test_convert_tool_result_carries_call_id() {
        let wire = convert_message(&Message::tool_result("call_9", "calculator", "4", false));
        assert_eq!(wire.role, "tool");
        assert_eq!(wire.tool_call_id.as_deref(), Some("call_9"));
    }

    #[test]
    fn test_build_request_includes_system_and_tools() {
        let provider = OpenAiProvider::new("key", "https://api.openai.com/v1", "gpt-4o-mini");
        let request = ChatRequest::with_system("you are a router").bind_tools(vec![
            crate::types::ToolSpec::new("calculator", "math", serde_json::json!({"type": "object"})),
        ]);
        let wire = provider.build_request(&request, None);
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(wire.tools.as_ref().unwrap().len(), 1);
        assert!(wire.tool_choice.is_some());
    }

    #[test]
    fn test_build_request_no_tools_omits_tool_choice() {
        let provider = OpenAiProvider::new("key", "https://api.openai.com/v1", "gpt-4o-mini");
        let wire = provider.build_request(&ChatRequest::default(), None);
        assert!(wire.tools.is_none());
        assert!(wire.tool_choice.is_none());
    }
}
