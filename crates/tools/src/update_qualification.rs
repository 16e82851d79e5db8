//! `update_qualification` — merge qualification fields on the contact memory.
//!
//! `interest_level: "hot"` additionally promotes the contact's lifecycle
//! stage to `opportunity`, whatever the prior qualification state.

use async_trait::async_trait;
use chrono::Utc;
use respondo_core::crm::{ContactMemory, STAGE_OPPORTUNITY};
use respondo_core::error::ToolError;
use respondo_core::tool::{CrmTool, ToolContext, ToolOutcome};
use respondo_store::Store;
use tracing::debug;

pub struct UpdateQualificationTool {
    store: Store,
}

impl UpdateQualificationTool {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CrmTool for UpdateQualificationTool {
    fn name(&self) -> &str {
        "update_qualification"
    }

    fn description(&self) -> &str {
        "Atualiza a qualificação do lead: budget, necessidade, prazo, interest_level (cold/warm/hot)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "budget": { "type": "string", "description": "Orçamento do lead" },
                "need": { "type": "string", "description": "Necessidade identificada" },
                "timeline": { "type": "string", "description": "Prazo de decisão" },
                "interest_level": {
                    "type": "string",
                    "description": "Nível de interesse: cold, warm ou hot"
                }
            }
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        let Some(fields) = arguments.as_object() else {
            return Err(ToolError::InvalidArguments("Expected an object of fields".into()));
        };
        if fields.is_empty() {
            return Ok(ToolOutcome::fail("Nenhum campo de qualificação informado."));
        }

        let mut memory = match self.store.memory_for_contact(&ctx.contact_id).await {
            Ok(Some(memory)) => memory,
            Ok(None) => ContactMemory::empty(&ctx.tenant_id, &ctx.contact_id),
            Err(e) => return Ok(ToolOutcome::fail(e.to_string())),
        };

        memory.merge_qualification(fields);
        memory.updated_at = Utc::now();
        if let Err(e) = self.store.upsert_memory(&memory).await {
            return Ok(ToolOutcome::fail(e.to_string()));
        }

        let mut promoted = false;
        if fields.get("interest_level").and_then(|v| v.as_str()) == Some("hot") {
            match self.store.get_contact(&ctx.contact_id).await {
                Ok(mut contact) => {
                    contact.lifecycle_stage = STAGE_OPPORTUNITY.to_string();
                    if let Err(e) = self.store.update_contact(&contact).await {
                        debug!(error = %e, "Failed to promote contact lifecycle stage");
                    } else {
                        promoted = true;
                    }
                }
                Err(e) => debug!(error = %e, "Contact not found for lifecycle promotion"),
            }
        }

        Ok(ToolOutcome::ok_with(
            if promoted {
                "Qualificação atualizada; contato promovido a oportunidade".to_string()
            } else {
                "Qualificação atualizada".to_string()
            },
            serde_json::json!({ "qualification": memory.qualification, "promoted": promoted }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use respondo_core::crm::Contact;

    fn ctx() -> ToolContext {
        ToolContext {
            tenant_id: "t-1".into(),
            agent_id: "a-1".into(),
            contact_id: "c-1".into(),
            thread_id: "th-1".into(),
        }
    }

    async fn store_with_contact() -> Store {
        let store = Store::in_memory().await.unwrap();
        store
            .insert_contact(&Contact {
                id: "c-1".into(),
                tenant_id: "t-1".into(),
                name: "João".into(),
                email: None,
                phone: None,
                company_id: None,
                lifecycle_stage: "lead".into(),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn merges_fields_without_promotion() {
        let store = store_with_contact().await;
        let tool = UpdateQualificationTool::new(store.clone());
        let outcome = tool
            .execute(serde_json::json!({"budget": "5k", "interest_level": "warm"}), &ctx())
            .await
            .unwrap();
        assert!(outcome.success);

        let memory = store.memory_for_contact("c-1").await.unwrap().unwrap();
        assert_eq!(memory.qualification["budget"], "5k");
        assert_eq!(store.get_contact("c-1").await.unwrap().lifecycle_stage, "lead");
    }

    #[tokio::test]
    async fn hot_interest_promotes_lifecycle_stage() {
        let store = store_with_contact().await;
        let tool = UpdateQualificationTool::new(store.clone());
        let outcome = tool
            .execute(serde_json::json!({"interest_level": "hot"}), &ctx())
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.data.unwrap()["promoted"], true);
        assert_eq!(
            store.get_contact("c-1").await.unwrap().lifecycle_stage,
            STAGE_OPPORTUNITY
        );
    }

    #[tokio::test]
    async fn promotion_happens_regardless_of_prior_state() {
        let store = store_with_contact().await;
        let tool = UpdateQualificationTool::new(store.clone());
        tool.execute(serde_json::json!({"interest_level": "cold"}), &ctx()).await.unwrap();
        tool.execute(serde_json::json!({"interest_level": "hot"}), &ctx()).await.unwrap();
        assert_eq!(
            store.get_contact("c-1").await.unwrap().lifecycle_stage,
            STAGE_OPPORTUNITY
        );
    }

    #[tokio::test]
    async fn empty_arguments_fail() {
        let store = store_with_contact().await;
        let tool = UpdateQualificationTool::new(store);
        let outcome = tool.execute(serde_json::json!({}), &ctx()).await.unwrap();
        assert!(!outcome.success);
    }
}
