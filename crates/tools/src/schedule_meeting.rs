//! `schedule_meeting` — book a meeting with the current contact.
//!
//! Persisted as a dated task so it shows up on the tenant's agenda; calendar
//! integration happens outside this component.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use respondo_core::crm::Task;
use respondo_core::error::ToolError;
use respondo_core::tool::{CrmTool, ToolContext, ToolOutcome};
use respondo_store::Store;
use uuid::Uuid;

pub struct ScheduleMeetingTool {
    store: Store,
}

impl ScheduleMeetingTool {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CrmTool for ScheduleMeetingTool {
    fn name(&self) -> &str {
        "schedule_meeting"
    }

    fn description(&self) -> &str {
        "Agenda uma reunião com o contato atual em data e horário específicos."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "subject": { "type": "string", "description": "Assunto da reunião" },
                "date": { "type": "string", "description": "Data no formato AAAA-MM-DD" },
                "time": {
                    "type": "string",
                    "description": "Horário no formato HH:MM (padrão 09:00)"
                }
            },
            "required": ["subject", "date"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        let subject = arguments["subject"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'subject' argument".into()))?;
        let date_raw = arguments["date"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'date' argument".into()))?;
        let time_raw = arguments["time"].as_str().unwrap_or("09:00");

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

        let when = date.and_time(time).and_utc();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            tenant_id: ctx.tenant_id.clone(),
            contact_id: ctx.contact_id.clone(),
            title: format!("Reunião: {subject}"),
            description: None,
            due_at: Some(when),
            done: false,
        };

        if let Err(e) = self.store.insert_task(&task).await {
            return Ok(ToolOutcome::fail(e.to_string()));
        }

        Ok(ToolOutcome::ok_with(
            format!("Reunião \"{subject}\" agendada para {date_raw} às {time_raw}"),
            serde_json::json!({ "task_id": task.id, "scheduled_for": when.to_rfc3339() }),
        ))
    }
}
