//! `schedule_follow_up` — queue a future outbound message on this thread.
//!
//! Date plus optional time (default 09:00) must combine into a valid
//! instant; anything unparseable is a failure outcome, never a guess. The
//! message is persisted `pending` for an external scheduler to deliver.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use respondo_core::crm::{ScheduleStatus, ScheduledMessage};
use respondo_core::error::ToolError;
use respondo_core::tool::{CrmTool, ToolContext, ToolOutcome};
use respondo_store::Store;
use uuid::Uuid;

const DEFAULT_TIME: &str = "09:00";

pub struct ScheduleFollowUpTool {
    store: Store,
}

impl ScheduleFollowUpTool {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CrmTool for ScheduleFollowUpTool {
    fn name(&self) -> &str {
        "schedule_follow_up"
    }

    fn description(&self) -> &str {
        "Agenda uma mensagem de follow-up para ser enviada nesta conversa em data futura."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": { "type": "string", "description": "Texto da mensagem de follow-up" },
                "date": { "type": "string", "description": "Data de envio no formato AAAA-MM-DD" },
                "time": {
                    "type": "string",
                    "description": "Horário de envio no formato HH:MM (padrão 09:00)"
                }
            },
            "required": ["message", "date"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        let message = arguments["message"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'message' argument".into()))?;
        let date_raw = arguments["date"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'date' argument".into()))?;
        let time_raw = arguments["time"].as_str().unwrap_or(DEFAULT_TIME);

        let Ok(date) = NaiveDate::parse_from_str(date_raw, "%Y-%m-%d") else {
            return Ok(ToolOutcome::fail(format!(
                "Data inválida: \"{date_raw}\". Use o formato AAAA-MM-DD."
            )));
        };
        let Ok(time) = NaiveTime::parse_from_str(time_raw, "%H:%M") else {
            return Ok(ToolOutcome::fail(format!(
                "Horário inválido: \"{time_raw}\". Use o formato HH:MM."
            )));
        };

        let scheduled = ScheduledMessage {
            id: Uuid::new_v4().to_string(),
            tenant_id: ctx.tenant_id.clone(),
            thread_id: ctx.thread_id.clone(),
            content: message.to_string(),
            send_at: date.and_time(time).and_utc(),
            status: ScheduleStatus::Pending,
        };

        if let Err(e) = self.store.insert_scheduled_message(&scheduled).await {
            return Ok(ToolOutcome::fail(e.to_string()));
        }

        Ok(ToolOutcome::ok_with(
            format!("Follow-up agendado para {date_raw} às {time_raw}"),
            serde_json::json!({ "scheduled_message_id": scheduled.id }),
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
    async fn schedules_pending_message_with_default_time() {
        let store = Store::in_memory().await.unwrap();
        let tool = ScheduleFollowUpTool::new(store.clone());
        let outcome = tool
            .execute(
                serde_json::json!({"message": "Oi! Conseguiu avaliar a proposta?", "date": "2026-04-15"}),
                &ctx(),
            )
            .await
            .unwrap();
        assert!(outcome.success);

        let pending = store.pending_scheduled_messages("th-1").await.unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].send_at.to_rfc3339().starts_with("2026-04-15T09:00"));
    }

    #[tokio::test]
    async fn unparseable_date_fails() {
        let store = Store::in_memory().await.unwrap();
        let tool = ScheduleFollowUpTool::new(store.clone());
        let outcome = tool
            .execute(serde_json::json!({"message": "oi", "date": "15/04/2026"}), &ctx())
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(store.pending_scheduled_messages("th-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn explicit_time_is_respected() {
        let store = Store::in_memory().await.unwrap();
        let tool = ScheduleFollowUpTool::new(store.clone());
        tool.execute(
            serde_json::json!({"message": "oi", "date": "2026-04-15", "time": "14:30"}),
            &ctx(),
        )
        .await
        .unwrap();
        let pending = store.pending_scheduled_messages("th-1").await.unwrap();
        assert!(pending[0].send_at.to_rfc3339().starts_with("2026-04-15T14:30"));
    }
}
