//! Chat transcript types exchanged with LLM providers.
//!
//! These are the ephemeral, per-invocation messages sent to a provider: the
//! system prompt, the clipped conversation history, the inbound customer
//! message, and the assistant/tool turns accumulated by the orchestrator.
//! They are distinct from the durable [`crate::crm::ThreadMessage`] records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// History messages are clipped to this many characters before being sent to
/// a provider. History exists for conversational continuity; verbatim recall
/// is the contact memory's job.
pub const HISTORY_CLIP_CHARS: usize = 400;

/// The role of a message sender in a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end customer
    User,
    /// The AI agent
    Assistant,
    /// System instructions (persona, rules)
    System,
    /// Tool execution result
    Tool,
}

/// A single message in a provider transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), tool_calls: Vec::new(), tool_call_id: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a tool result message answering a specific tool call.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Create a history message with its content clipped to
    /// [`HISTORY_CLIP_CHARS`], respecting UTF-8 boundaries.
    pub fn from_history(role: Role, content: &str) -> Self {
        let clipped = clip(content, HISTORY_CLIP_CHARS);
        Self { role, content: clipped, tool_calls: Vec::new(), tool_call_id: None }
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call (the provider's id, e.g. `toolu_...`)
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a JSON string
    pub arguments: String,
}

impl MessageToolCall {
    /// Generate a fresh call id (used when a provider omits one).
    pub fn fresh_id() -> String {
        Uuid::new_v4().to_string()
    }
}

/// Clip a string to at most `max` characters on a char boundary.
pub fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}
