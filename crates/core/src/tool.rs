//! CrmTool trait — the abstraction over agent side effects.
//!
//! Tools are what let the agent act on tenant data: update a contact, open an
//! opportunity, persist a memory fact, schedule a follow-up. Each tool is
//! schema-described so the same definition feeds both the provider request
//! and the executor — schema and behavior cannot drift independently.

use crate::error::ToolError;
use crate::provider::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Scope a tool call executes in. Every tool effect is bounded to one
/// tenant/contact/thread triple.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub tenant_id: String,
    pub agent_id: String,
    pub contact_id: String,
    pub thread_id: String,
}

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the provider's tool_call id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// The result of a tool execution, fed back to the model verbatim.
///
/// Failures are data, not errors: a failed tool call becomes a
/// `success: false` outcome so the model can adapt its next turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,

    /// Human-readable result or failure description
    pub message: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into(), data: None }
    }

    pub fn ok_with(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self { success: true, message: message.into(), data: Some(data) }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), data: None }
    }
}

/// The core tool trait.
///
/// Each CRM tool implements this. Tools are registered in the
/// [`ToolRegistry`] and only the profile-enabled subset is exposed per
/// invocation.
#[async_trait]
pub trait CrmTool: Send + Sync {
    /// The unique name of this tool (e.g. "save_memory").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments in the given scope.
    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &ToolContext,
    ) -> std::result::Result<ToolOutcome, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// The orchestrator uses this to:
/// 1. Get tool definitions to send to the provider
/// 2. Look up and execute tools when the provider requests them
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn CrmTool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn CrmTool>) {
        let name = tool.name().to_string();
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn CrmTool>> {
        self.tools.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// All tool definitions in registration order (for the provider request
    /// and the prompt's tools-available section).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order.iter().filter_map(|n| self.tools.get(n)).map(|t| t.to_definition()).collect()
    }

    /// Registered tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }

    /// Execute a tool call. Never fails upward: unknown tools, bad arguments
    /// and execution errors all become `success: false` outcomes that are
    /// surfaced to the model as tool results.
    pub async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> ToolOutcome {
        let Some(tool) = self.tools.get(&call.name) else {
            return ToolOutcome::fail(format!("Unknown tool: {}", call.name));
        };
        match tool.execute(call.arguments.clone(), ctx).await {
            Ok(outcome) => outcome,
            Err(e) => ToolOutcome::fail(e.to_string()),
        }
    }
}
