//! OpenAI chat-completions provider.
//!
//! The same adapter serves api.openai.com and any OpenAI-compatible gateway
//! (OpenRouter, vLLM, LiteLLM, ...) behind a configured base URL: Bearer
//! authentication, function-style tool calls, `/chat/completions`.
//!
//! [`OpenAiEmbedder`] covers the `/embeddings` endpoint for retrieval.

use async_trait::async_trait;
use respondo_core::error::ProviderError;
use respondo_core::message::{ChatMessage, MessageToolCall, Role};
use respondo_core::provider::{ChatRequest, ChatResponse, Embedder, ToolDefinition, Usage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// An OpenAI-compatible chat-completions provider.
pub struct OpenAiProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// api.openai.com with the default base URL.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", OPENAI_BASE_URL, api_key)
    }

    /// Any OpenAI-compatible gateway behind a custom base URL.
    pub fn gateway(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::new("gateway", base_url, api_key)
    }

    fn to_api_messages(messages: &[ChatMessage]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::System => "system".into(),
                    Role::Tool => "tool".into(),
                },
                content: Some(m.content.clone()),
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .iter()
                            .map(|tc| ApiToolCall {
                                id: tc.id.clone(),
                                r#type: "function".into(),
                                function: ApiFunction {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                },
                            })
                            .collect(),
                    )
                },
                tool_call_id: m.tool_call_id.clone(),
            })
            .collect()
    }

    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }
}

#[async_trait]
impl respondo_core::Provider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ChatRequest,
    ) -> std::result::Result<ChatResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited { retry_after_secs: 2 });
        }
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError { status_code: status, message: error_body });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        let tool_calls: Vec<MessageToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| MessageToolCall {
                id: if tc.id.is_empty() { MessageToolCall::fresh_id() } else { tc.id },
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        let message = ChatMessage {
            role: Role::Assistant,
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            tool_call_id: None,
        };

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ChatResponse { message, usage, model: api_response.model })
    }
}

/// Embedding client against an OpenAI-style `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiEmbedder {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
        let url = format!("{}/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 429 {
            return Err(ProviderError::RateLimited { retry_after_secs: 2 });
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError { status_code: status, message: error_body });
        }

        let api_response: EmbeddingResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse embedding response: {e}"),
            })?;

        api_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 200,
                message: "No embedding in response".into(),
            })
    }
}

// --- OpenAI API types ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    #[serde(default)]
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use respondo_core::Provider;

    #[test]
    fn gateway_constructor_trims_trailing_slash() {
        let provider = OpenAiProvider::gateway("https://llm.internal/v1/", "key");
        assert_eq!(provider.name(), "gateway");
        assert_eq!(provider.base_url, "https://llm.internal/v1");
    }

    #[test]
    fn tool_calls_wrap_in_function_objects() {
        let mut msg = ChatMessage::assistant("");
        msg.tool_calls = vec![MessageToolCall {
            id: "call_1".into(),
            name: "create_opportunity".into(),
            arguments: r#"{"title":"Plano anual"}"#.into(),
        }];

        let api = OpenAiProvider::to_api_messages(&[msg]);
        let calls = api[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].r#type, "function");
        assert_eq!(calls[0].function.name, "create_opportunity");
    }

    #[test]
    fn tool_results_keep_call_id() {
        let msg = ChatMessage::tool_result("call_1", r#"{"success":true}"#);
        let api = OpenAiProvider::to_api_messages(&[msg]);
        assert_eq!(api[0].role, "tool");
        assert_eq!(api[0].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn tool_definitions_nest_under_function() {
        let tools = vec![ToolDefinition {
            name: "save_memory".into(),
            description: "Persist durable facts".into(),
            parameters: serde_json::json!({"type": "object"}),
        }];
        let api = OpenAiProvider::to_api_tools(&tools);
        assert_eq!(api[0].r#type, "function");
        assert_eq!(api[0].function.name, "save_memory");
    }

    #[test]
    fn parses_api_response_with_tool_calls() {
        let resp: ApiResponse = serde_json::from_str(
            r#"{
                "model": "gpt-4o",
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_abc",
                            "type": "function",
                            "function": {"name": "update_contact", "arguments": "{\"email\":\"a@b.com\"}"}
                        }]
                    }
                }],
                "usage": {"prompt_tokens": 50, "completion_tokens": 12, "total_tokens": 62}
            }"#,
        )
        .unwrap();
        let calls = resp.choices[0].message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "update_contact");
        assert_eq!(resp.usage.unwrap().total_tokens, 62);
    }

    #[test]
    fn parses_embedding_response() {
        let resp: EmbeddingResponse = serde_json::from_str(
            r#"{"data": [{"embedding": [0.1, 0.2], "index": 0}], "model": "text-embedding-3-small"}"#,
        )
        .unwrap();
        assert_eq!(resp.data[0].embedding, vec![0.1, 0.2]);
    }
}
