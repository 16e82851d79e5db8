//! Agent profile — per-tenant configuration of one autonomous agent.
//!
//! Read-only input to an invocation; owned by tenant settings. The profile
//! decides tone, goal, enabled tools, working hours, provider/model and the
//! per-conversation message cap.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default per-conversation cap on successful agent replies.
pub const DEFAULT_MESSAGE_CAP: u32 = 200;

/// The closed set of supported provider families.
///
/// Selection goes through this enum and the provider registry — there is no
/// free-form slug dispatch anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Anthropic Messages API (content blocks, tool_use/tool_result)
    Anthropic,
    /// OpenAI chat completions
    OpenAi,
    /// Any OpenAI-compatible gateway behind a configured base URL
    Gateway,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anthropic => write!(f, "anthropic"),
            Self::OpenAi => write!(f, "open_ai"),
            Self::Gateway => write!(f, "gateway"),
        }
    }
}

/// One day's attendance window, local to the schedule's timezone.
/// Times are "HH:MM"; the window is half-open: [start, end).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub start: String,
    pub end: String,
}

/// Timezone-qualified weekly schedule.
///
/// `days` is keyed by lowercase English weekday name ("monday".."sunday").
/// A missing key means the agent does not attend that day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkingHours {
    #[serde(default)]
    pub enabled: bool,

    /// IANA timezone name, e.g. "America/Sao_Paulo"
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub days: HashMap<String, DayWindow>,
}

fn default_timezone() -> String {
    "America/Sao_Paulo".into()
}

/// A learned feedback rule, shown to the model when active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRule {
    pub instruction: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Configuration of one autonomous agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: String,
    pub tenant_id: String,

    /// Display name used as sender metadata on delivered messages.
    pub name: String,

    /// Persona description, e.g. "amigável e direto".
    pub tone: String,

    /// Primary goal, e.g. "qualificar o lead e agendar uma demonstração".
    pub goal: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,

    /// Names of the tools this agent may call. Only these are sent to the
    /// provider and registered with the executor.
    #[serde(default)]
    pub enabled_tools: Vec<String>,

    #[serde(default)]
    pub working_hours: WorkingHours,

    /// Auto-reply sent when a message arrives outside working hours.
    #[serde(default = "default_out_of_hours_message")]
    pub out_of_hours_message: String,

    pub provider: ProviderKind,

    /// Model override; `None` uses the provider's configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default = "default_message_cap")]
    pub message_cap: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default)]
    pub feedback_rules: Vec<FeedbackRule>,

    /// Optional free-text hints per tool name, rendered into the prompt's
    /// tools-available section ("use schedule_meeting when ...").
    #[serde(default)]
    pub tool_hints: HashMap<String, String>,

    /// Payment-provider checkout URL template, e.g.
    /// "https://pay.example.com/{tenant}". When set, `send_payment_link`
    /// resolves here before searching knowledge chunks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_base_url: Option<String>,
}

fn default_message_cap() -> u32 {
    DEFAULT_MESSAGE_CAP
}

fn default_temperature() -> f32 {
    0.7
}

fn default_out_of_hours_message() -> String {
    "No momento estamos fora do nosso horário de atendimento. \
     Responderemos sua mensagem assim que possível."
        .into()
}

impl AgentProfile {
    /// Whether a tool name is enabled on this profile.
    pub fn tool_enabled(&self, name: &str) -> bool {
        self.enabled_tools.iter().any(|t| t == name)
    }

    /// Feedback rules that are active, capped at `limit` entries.
    pub fn active_feedback_rules(&self, limit: usize) -> Vec<&FeedbackRule> {
        self.feedback_rules.iter().filter(|r| r.active).take(limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> AgentProfile {
        AgentProfile {
            id: "a-1".into(),
            tenant_id: "t-1".into(),
            name: "Sofia".into(),
            tone: "amigável".into(),
            goal: "qualificar leads".into(),
            custom_instructions: None,
            enabled_tools: vec!["save_memory".into(), "update_contact".into()],
            working_hours: WorkingHours::default(),
            out_of_hours_message: default_out_of_hours_message(),
            provider: ProviderKind::Anthropic,
            model: None,
            message_cap: DEFAULT_MESSAGE_CAP,
            temperature: 0.7,
            feedback_rules: Vec::new(),
            tool_hints: HashMap::new(),
            payment_base_url: None,
        }
    }

    #[test]
    fn tool_enabled_checks_list() {
        let p = profile();
        assert!(p.tool_enabled("save_memory"));
        assert!(!p.tool_enabled("send_payment_link"));
    }

    #[test]
    fn active_rules_filter_and_cap() {
        let mut p = profile();
        for i in 0..30 {
            p.feedback_rules.push(FeedbackRule {
                instruction: format!("regra {i}"),
                active: i % 2 == 0,
            });
        }
        let active = p.active_feedback_rules(10);
        assert_eq!(active.len(), 10);
        assert!(active.iter().all(|r| r.active));
    }

    #[test]
    fn provider_kind_parses_snake_case() {
        let kind: ProviderKind = serde_json::from_str("\"open_ai\"").unwrap();
        assert_eq!(kind, ProviderKind::OpenAi);
        // Display matches the serde spelling so config keys and log output agree.
        assert_eq!(kind.to_string(), "open_ai");
        assert_eq!(ProviderKind::Anthropic.to_string(), "anthropic");
    }

    #[test]
    fn profile_defaults_from_minimal_json() {
        let json = serde_json::json!({
            "id": "a-2",
            "tenant_id": "t-1",
            "name": "Bot",
            "tone": "formal",
            "goal": "vender",
            "provider": "gateway"
        });
        let p: AgentProfile = serde_json::from_value(json).unwrap();
        assert_eq!(p.message_cap, DEFAULT_MESSAGE_CAP);
        assert!(!p.working_hours.enabled);
        assert!(p.out_of_hours_message.contains("horário"));
    }
}
