//! `create_task` — register a follow-up task for the current contact.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use respondo_core::crm::Task;
use respondo_core::error::ToolError;
use respondo_core::tool::{CrmTool, ToolContext, ToolOutcome};
use respondo_store::Store;
use uuid::Uuid;

pub struct CreateTaskTool {
    store: Store,
}

impl CreateTaskTool {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CrmTool for CreateTaskTool {
    fn name(&self) -> &str {
        "create_task"
    }

    fn description(&self) -> &str {
        "Cria uma tarefa de acompanhamento para o contato atual."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "title": { "type": "string", "description": "Título da tarefa" },
                "description": { "type": "string", "description": "Detalhes da tarefa" },
                "due_date": {
                    "type": "string",
                    "description": "Data limite no formato AAAA-MM-DD (opcional)"
                }
            },
            "required": ["title"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        let title = arguments["title"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'title' argument".into()))?;

        let due_at: Option<DateTime<Utc>> = match arguments["due_date"].as_str() {
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => {
                    let time = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default();
                    Some(date.and_time(time).and_utc())
                }
                Err(_) => {
                    return Ok(ToolOutcome::fail(format!(
                        "Data inválida: \"{raw}\". Use o formato AAAA-MM-DD."
                    )));
                }
            },
            None => None,
        };

        let task = Task {
            id: Uuid::new_v4().to_string(),
            tenant_id: ctx.tenant_id.clone(),
            contact_id: ctx.contact_id.clone(),
            title: title.to_string(),
            description: arguments["description"].as_str().map(String::from),
            due_at,
            done: false,
        };

        if let Err(e) = self.store.insert_task(&task).await {
            return Ok(ToolOutcome::fail(e.to_string()));
        }

        Ok(ToolOutcome::ok_with(
            format!("Tarefa \"{title}\" criada"),
            serde_json::json!({ "task_id": task.id }),
        ))
    }
}
