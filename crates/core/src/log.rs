//! Invocation accounting types.
//!
//! One [`AgentLogEntry`] row is written per invocation, whatever its outcome.
//! A [`UsageLogEntry`] row is additionally written on success/fallback — the
//! billing and analytics input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal outcome of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStatus {
    /// A genuine model reply was produced and delivered/returned.
    Success,
    /// No usable model text; the fixed apology was substituted.
    Fallback,
    /// Denied by the working-hours gate before any model call.
    SkippedOutOfHours,
    /// Denied by the per-conversation message cap before any model call.
    SkippedMaxMessages,
    /// The invocation aborted with an error.
    Error,
}

impl std::fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Fallback => write!(f, "fallback"),
            Self::SkippedOutOfHours => write!(f, "skipped_out_of_hours"),
            Self::SkippedMaxMessages => write!(f, "skipped_max_messages"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One row per invocation. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentLogEntry {
    pub id: String,
    pub tenant_id: String,
    pub agent_id: String,
    pub thread_id: String,
    /// The inbound customer message.
    pub input: String,
    /// The delivered (or returned) text; empty on skipped/error outcomes.
    pub output: String,
    pub status: InvocationStatus,
    pub tokens_used: u32,
    pub latency_ms: u64,
    #[serde(default)]
    pub tools_executed: Vec<String>,
    /// Why the fallback fired, e.g. "empty_response_after_tools:save_memory".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AgentLogEntry {
    /// A skipped/denied entry: zero tokens, no output, no tools.
    pub fn skipped(
        tenant_id: &str,
        agent_id: &str,
        thread_id: &str,
        input: &str,
        status: InvocationStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.into(),
            agent_id: agent_id.into(),
            thread_id: thread_id.into(),
            input: input.into(),
            output: String::new(),
            status,
            tokens_used: 0,
            latency_ms: 0,
            tools_executed: Vec::new(),
            fallback_reason: None,
            created_at: Utc::now(),
        }
    }
}

/// Per-invocation billing/analytics record. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLogEntry {
    pub id: String,
    pub tenant_id: String,
    pub agent_id: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub latency_ms: u64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&InvocationStatus::SkippedOutOfHours).unwrap();
        assert_eq!(json, "\"skipped_out_of_hours\"");
        assert_eq!(InvocationStatus::SkippedMaxMessages.to_string(), "skipped_max_messages");
    }

    #[test]
    fn skipped_entry_has_zero_tokens() {
        let entry = AgentLogEntry::skipped("t-1", "a-1", "th-1", "oi", InvocationStatus::SkippedOutOfHours);
        assert_eq!(entry.tokens_used, 0);
        assert!(entry.output.is_empty());
        assert!(entry.tools_executed.is_empty());
    }
}
