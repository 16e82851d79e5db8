//! Provider trait — the abstraction over LLM backends.
//!
//! A Provider knows how to send a transcript to an LLM and get a response
//! back: final text, requested tool calls, and token usage. The orchestrator
//! drives the tool loop without knowing which provider is behind the trait.
//!
//! Implementations: Anthropic Messages API, OpenAI chat completions, and any
//! OpenAI-compatible gateway.

use crate::error::ProviderError;
use crate::message::ChatMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration for a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The model to use (e.g. "claude-sonnet-4-20250514", "gpt-4o")
    pub model: String,

    /// The transcript messages
    pub messages: Vec<ChatMessage>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tools the model may call. Only tools enabled on the agent profile are
    /// ever present here.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

fn default_temperature() -> f32 {
    0.7
}

impl ChatRequest {
    /// A request with defaults for everything but model and messages.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: default_temperature(),
            max_tokens: None,
            tools: Vec::new(),
        }
    }
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated assistant message (text and/or tool calls)
    pub message: ChatMessage,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn add(&mut self, other: &Usage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// The core Provider trait.
///
/// Every LLM backend implements this. The orchestrator calls `complete()`
/// without knowing which provider is being used — pure polymorphism.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g. "anthropic", "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: ChatRequest,
    ) -> std::result::Result<ChatResponse, ProviderError>;
}

/// Embedding generation, consumed by the knowledge retriever.
///
/// Retrieval is a best-effort enhancement: callers hold an
/// `Option<Arc<dyn Embedder>>` and take the typed "no RAG available" branch
/// when embeddings are unconfigured.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text into a vector.
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults() {
        let req = ChatRequest::new("gpt-4o", vec![ChatMessage::user("oi")]);
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert!(req.tools.is_empty());
        assert!(req.max_tokens.is_none());
    }

    #[test]
    fn usage_accumulates() {
        let mut total = Usage::default();
        total.add(&Usage { prompt_tokens: 100, completion_tokens: 20, total_tokens: 120 });
        total.add(&Usage { prompt_tokens: 150, completion_tokens: 30, total_tokens: 180 });
        assert_eq!(total.total_tokens, 300);
        assert_eq!(total.completion_tokens, 50);
    }

    #[test]
    fn tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "update_contact".into(),
            description: "Update fields on the current contact".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "email": { "type": "string" }
                }
            }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("update_contact"));
        assert!(json.contains("email"));
    }
}
