//! The provider round-trip loop.
//!
//! Runs as a small state machine: wait for the model, execute any tools
//! it requested, feed the results back, and repeat until the model
//! produces text or the round ceiling is hit. An empty final answer gets
//! exactly one no-tools follow-up turn before the canned fallback.

use respondo_core::{
    ChatMessage, ChatRequest, MessageToolCall, Provider, ProviderError, ToolCall, ToolContext,
    ToolRegistry, Usage,
};
use respondo_providers::complete_with_retry;
use tracing::{debug, warn};

/// Tool round-trips allowed per invocation.
pub const MAX_TOOL_ROUNDS: usize = 5;

/// Sent to the customer when the model never produces usable text.
pub const FALLBACK_MESSAGE: &str =
    "Desculpe, não consegui processar sua mensagem agora. Pode tentar novamente em instantes?";

const FOLLOW_UP_INSTRUCTION: &str =
    "Responda agora ao cliente em linguagem natural, sem usar ferramentas.";

/// Loop states. Tool requests always lead back to the model; `Responding`
/// hands off to the follow-up/fallback tail, which is terminal.
enum LoopState {
    Composing,
    AwaitingModel,
    ToolsRequested(Vec<MessageToolCall>),
    ExecutingTools(Vec<MessageToolCall>),
    Responding(String),
}

/// Outcome of one full loop run.
#[derive(Debug, Clone)]
pub struct Orchestration {
    pub text: String,
    pub fallback_reason: Option<String>,
    pub tools_executed: Vec<String>,
    pub usage: Usage,
    pub model: String,
}

pub struct Orchestrator<'a> {
    provider: &'a dyn Provider,
    registry: &'a ToolRegistry,
    model: String,
    temperature: f32,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        provider: &'a dyn Provider,
        registry: &'a ToolRegistry,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            provider,
            registry,
            model: model.into(),
            temperature,
        }
    }

    pub async fn run(
        &self,
        system_prompt: &str,
        mut history: Vec<ChatMessage>,
        user_message: &str,
        tool_ctx: &ToolContext,
    ) -> Result<Orchestration, ProviderError> {
        let definitions = self.registry.definitions();
        let mut messages: Vec<ChatMessage> = Vec::with_capacity(history.len() + 2);
        let mut usage = Usage::default();
        let mut tools_executed: Vec<String> = Vec::new();
        let mut rounds = 0usize;
        let mut state = LoopState::Composing;

        let text = loop {
            match state {
                LoopState::Composing => {
                    messages.push(ChatMessage::system(system_prompt));
                    messages.extend(std::mem::take(&mut history));
                    messages.push(ChatMessage::user(user_message));
                    state = LoopState::AwaitingModel;
                }
                LoopState::AwaitingModel => {
                    let mut request = ChatRequest::new(&self.model, messages.clone());
                    request.temperature = self.temperature;
                    request.tools = definitions.clone();
                    let response = complete_with_retry(self.provider, request).await?;
                    if let Some(u) = &response.usage {
                        usage.add(u);
                    }
                    if !response.message.tool_calls.is_empty() && rounds < MAX_TOOL_ROUNDS {
                        let calls = response.message.tool_calls.clone();
                        messages.push(response.message);
                        state = LoopState::ToolsRequested(calls);
                    } else {
                        if !response.message.tool_calls.is_empty() {
                            warn!(
                                rounds,
                                "tool round ceiling reached, dropping pending tool calls"
                            );
                        }
                        state = LoopState::Responding(response.message.content);
                    }
                }
                LoopState::ToolsRequested(calls) => {
                    rounds += 1;
                    state = LoopState::ExecutingTools(calls);
                }
                LoopState::ExecutingTools(calls) => {
                    for call in calls {
                        let tool_call = ToolCall {
                            id: call.id.clone(),
                            name: call.name.clone(),
                            arguments: serde_json::from_str(&call.arguments)
                                .unwrap_or(serde_json::Value::Null),
                        };
                        let outcome = self.registry.execute(&tool_call, tool_ctx).await;
                        debug!(tool = %call.name, success = outcome.success, "tool executed");
                        tools_executed.push(call.name);
                        let payload = serde_json::to_string(&outcome)
                            .unwrap_or_else(|_| outcome.message.clone());
                        messages.push(ChatMessage::tool_result(call.id, payload));
                    }
                    state = LoopState::AwaitingModel;
                }
                LoopState::Responding(text) => break text,
            }
        };

        if !text.trim().is_empty() {
            return Ok(Orchestration {
                text,
                fallback_reason: None,
                tools_executed,
                usage,
                model: self.model.clone(),
            });
        }

        // One follow-up turn without tools before giving up.
        messages.push(ChatMessage::user(FOLLOW_UP_INSTRUCTION));
        let mut request = ChatRequest::new(&self.model, messages);
        request.temperature = self.temperature;
        let response = complete_with_retry(self.provider, request).await?;
        if let Some(u) = &response.usage {
            usage.add(u);
        }

        if !response.message.content.trim().is_empty() {
            return Ok(Orchestration {
                text: response.message.content,
                fallback_reason: None,
                tools_executed,
                usage,
                model: self.model.clone(),
            });
        }

        let reason = if tools_executed.is_empty() {
            "empty_response_no_tools".to_string()
        } else {
            format!("empty_response_after_tools:{}", tools_executed.join(","))
        };
        warn!(%reason, "model produced no text, sending fallback");
        Ok(Orchestration {
            text: FALLBACK_MESSAGE.to_string(),
            fallback_reason: Some(reason),
            tools_executed,
            usage,
            model: self.model.clone(),
        })
    }
}
