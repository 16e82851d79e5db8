//! CRM tools the agent can call.
//!
//! Each tool is one module implementing [`respondo_core::CrmTool`]: the name,
//! description and parameter schema live next to the handler, and
//! `to_definition()` derives the provider-facing schema from the same source,
//! so schema and behavior cannot drift apart.
//!
//! [`build_registry`] assembles the registry for one invocation, registering
//! only the tools enabled on the agent profile.

pub mod create_opportunity;
pub mod create_task;
pub mod save_memory;
pub mod schedule_follow_up;
pub mod schedule_meeting;
pub mod send_payment_link;
pub mod transfer_to_human;
pub mod update_contact;
pub mod update_qualification;

use respondo_core::profile::AgentProfile;
use respondo_core::tool::ToolRegistry;
use respondo_store::Store;
use std::sync::Arc;

/// Every tool name, in canonical registration order.
pub const ALL_TOOLS: &[&str] = &[
    "update_contact",
    "create_opportunity",
    "create_task",
    "schedule_meeting",
    "transfer_to_human",
    "save_memory",
    "schedule_follow_up",
    "send_payment_link",
    "update_qualification",
];

/// Build the registry for one invocation: only tools enabled on the profile
/// are registered, so neither the provider nor the executor ever sees the
/// rest.
pub fn build_registry(store: &Store, profile: &AgentProfile) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    for &name in ALL_TOOLS {
        if !profile.tool_enabled(name) {
            continue;
        }
        match name {
            "update_contact" => {
                registry.register(Arc::new(update_contact::UpdateContactTool::new(store.clone())));
            }
            "create_opportunity" => {
                registry.register(Arc::new(create_opportunity::CreateOpportunityTool::new(
                    store.clone(),
                )));
            }
            "create_task" => {
                registry.register(Arc::new(create_task::CreateTaskTool::new(store.clone())));
            }
            "schedule_meeting" => {
                registry.register(Arc::new(schedule_meeting::ScheduleMeetingTool::new(
                    store.clone(),
                )));
            }
            "transfer_to_human" => {
                registry.register(Arc::new(transfer_to_human::TransferToHumanTool::new(
                    store.clone(),
                )));
            }
            "save_memory" => {
                registry.register(Arc::new(save_memory::SaveMemoryTool::new(store.clone())));
            }
            "schedule_follow_up" => {
                registry.register(Arc::new(schedule_follow_up::ScheduleFollowUpTool::new(
                    store.clone(),
                )));
            }
            "send_payment_link" => {
                registry.register(Arc::new(send_payment_link::SendPaymentLinkTool::new(
                    store.clone(),
                    profile.payment_base_url.clone(),
                )));
            }
            "update_qualification" => {
                registry.register(Arc::new(update_qualification::UpdateQualificationTool::new(
                    store.clone(),
                )));
            }
            _ => unreachable!("unknown tool name in ALL_TOOLS"),
        }
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with_tools(tools: &[&str]) -> AgentProfile {
        serde_json::from_value(serde_json::json!({
            "id": "a-1",
            "tenant_id": "t-1",
            "name": "Sofia",
            "tone": "amigável",
            "goal": "qualificar leads",
            "provider": "anthropic",
            "enabled_tools": tools,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn registry_contains_only_enabled_tools() {
        let store = Store::in_memory().await.unwrap();
        let profile = profile_with_tools(&["save_memory", "update_contact"]);
        let registry = build_registry(&store, &profile);
        assert_eq!(registry.names(), vec!["update_contact", "save_memory"]);
    }

    #[tokio::test]
    async fn no_enabled_tools_yields_empty_registry() {
        let store = Store::in_memory().await.unwrap();
        let registry = build_registry(&store, &profile_with_tools(&[]));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn full_registry_covers_all_tools() {
        let store = Store::in_memory().await.unwrap();
        let registry = build_registry(&store, &profile_with_tools(ALL_TOOLS));
        assert_eq!(registry.len(), ALL_TOOLS.len());
        let defs = registry.definitions();
        assert!(defs.iter().all(|d| d.parameters["type"] == "object"));
    }
}
