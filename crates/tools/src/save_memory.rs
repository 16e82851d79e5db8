//! `save_memory` — persist durable facts about the current contact.
//!
//! The memory record is created lazily on first write. Facts and objections
//! append only when the exact string is absent, so two concurrent
//! invocations saving the same fact converge on one occurrence. The
//! qualification map shallow-merges with last-write-wins per key.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use respondo_core::crm::ContactMemory;
use respondo_core::error::ToolError;
use respondo_core::tool::{CrmTool, ToolContext, ToolOutcome};
use respondo_store::Store;

pub struct SaveMemoryTool {
    store: Store,
}

impl SaveMemoryTool {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CrmTool for SaveMemoryTool {
    fn name(&self) -> &str {
        "save_memory"
    }

    fn description(&self) -> &str {
        "Salva informações duradouras sobre o contato: fatos, objeções, próxima ação e qualificação."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "facts": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Fatos relevantes sobre o contato"
                },
                "objections": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Objeções levantadas pelo contato"
                },
                "next_action": { "type": "string", "description": "Próxima ação combinada" },
                "next_action_date": {
                    "type": "string",
                    "description": "Data da próxima ação no formato AAAA-MM-DD"
                },
                "qualification": {
                    "type": "object",
                    "description": "Campos de qualificação, ex: budget, interest_level"
                }
            }
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        let mut memory = match self.store.memory_for_contact(&ctx.contact_id).await {
            Ok(Some(memory)) => memory,
            Ok(None) => ContactMemory::empty(&ctx.tenant_id, &ctx.contact_id),
            Err(e) => return Ok(ToolOutcome::fail(e.to_string())),
        };

        let mut added_facts = 0;
        if let Some(facts) = arguments["facts"].as_array() {
            for fact in facts.iter().filter_map(|f| f.as_str()) {
                if memory.push_fact(fact) {
                    added_facts += 1;
                }
            }
        }

        let mut added_objections = 0;
        if let Some(objections) = arguments["objections"].as_array() {
            for objection in objections.iter().filter_map(|o| o.as_str()) {
                if memory.push_objection(objection) {
                    added_objections += 1;
                }
            }
        }

        if let Some(next_action) = arguments["next_action"].as_str() {
            memory.next_action = Some(next_action.to_string());
        }
        if let Some(raw) = arguments["next_action_date"].as_str() {
            match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => memory.next_action_date = Some(date),
                Err(_) => {
                    return Ok(ToolOutcome::fail(format!(
                        "Data inválida: \"{raw}\". Use o formato AAAA-MM-DD."
                    )));
                }
            }
        }

        if let Some(fields) = arguments["qualification"].as_object() {
            memory.merge_qualification(fields);
        }

        memory.updated_at = Utc::now();
        if let Err(e) = self.store.upsert_memory(&memory).await {
            return Ok(ToolOutcome::fail(e.to_string()));
        }

        Ok(ToolOutcome::ok_with(
            format!("Memória atualizada: {added_facts} fato(s) e {added_objections} objeção(ões) novos"),
            serde_json::json!({
                "facts_added": added_facts,
                "objections_added": added_objections,
                "total_facts": memory.facts.len(),
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ToolContext {
        ToolContext {
            tenant_id: "t-1".into(),
            agent_id: "a-1".into(),
            contact_id: "c-1".into(),
            thread_id: "th-1".into(),
        }
    }

    #[tokio::test]
    async fn lazily_creates_memory_record() {
        let store = Store::in_memory().await.unwrap();
        let tool = SaveMemoryTool::new(store.clone());
        let outcome = tool
            .execute(serde_json::json!({"facts": ["prefere plano anual"]}), &ctx())
            .await
            .unwrap();
        assert!(outcome.success);

        let memory = store.memory_for_contact("c-1").await.unwrap().unwrap();
        assert_eq!(memory.facts, vec!["prefere plano anual"]);
    }

    #[tokio::test]
    async fn duplicate_facts_are_suppressed() {
        let store = Store::in_memory().await.unwrap();
        let tool = SaveMemoryTool::new(store.clone());
        let args = serde_json::json!({"facts": ["tem equipe de 12 pessoas"]});

        tool.execute(args.clone(), &ctx()).await.unwrap();
        let second = tool.execute(args, &ctx()).await.unwrap();
        assert!(second.success);
        assert_eq!(second.data.unwrap()["facts_added"], 0);

        let memory = store.memory_for_contact("c-1").await.unwrap().unwrap();
        assert_eq!(memory.facts.len(), 1);
    }

    #[tokio::test]
    async fn qualification_shallow_merges() {
        let store = Store::in_memory().await.unwrap();
        let tool = SaveMemoryTool::new(store.clone());
        tool.execute(
            serde_json::json!({"qualification": {"budget": "5k", "interest_level": "warm"}}),
            &ctx(),
        )
        .await
        .unwrap();
        tool.execute(
            serde_json::json!({"qualification": {"interest_level": "hot"}}),
            &ctx(),
        )
        .await
        .unwrap();

        let memory = store.memory_for_contact("c-1").await.unwrap().unwrap();
        assert_eq!(memory.qualification["budget"], "5k");
        assert_eq!(memory.qualification["interest_level"], "hot");
    }

    #[tokio::test]
    async fn invalid_next_action_date_fails() {
        let store = Store::in_memory().await.unwrap();
        let tool = SaveMemoryTool::new(store);
        let outcome = tool
            .execute(serde_json::json!({"next_action_date": "semana que vem"}), &ctx())
            .await
            .unwrap();
        assert!(!outcome.success);
    }
}
