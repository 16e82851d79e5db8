//! `update_contact` — patch fields on the current contact.

use async_trait::async_trait;
use respondo_core::error::ToolError;
use respondo_core::tool::{CrmTool, ToolContext, ToolOutcome};
use respondo_store::Store;

pub struct UpdateContactTool {
    store: Store,
}

impl UpdateContactTool {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CrmTool for UpdateContactTool {
    fn name(&self) -> &str {
        "update_contact"
    }

    fn description(&self) -> &str {
        "Atualiza dados do contato atual. Informe apenas os campos que devem mudar."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Nome completo do contato" },
                "email": { "type": "string", "description": "Endereço de e-mail" },
                "phone": { "type": "string", "description": "Telefone com DDD" },
                "lifecycle_stage": {
                    "type": "string",
                    "description": "Estágio do contato: lead, opportunity, customer"
                }
            }
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        let mut contact = match self.store.get_contact(&ctx.contact_id).await {
            Ok(c) => c,
            Err(e) => return Ok(ToolOutcome::fail(e.to_string())),
        };

        let mut updated: Vec<&str> = Vec::new();

        if let Some(name) = arguments["name"].as_str() {
            contact.name = name.to_string();
            updated.push("name");
        }
        if let Some(email) = arguments["email"].as_str() {
            contact.email = Some(email.to_string());
            updated.push("email");
        }
        if let Some(phone) = arguments["phone"].as_str() {
            contact.phone = Some(phone.to_string());
            updated.push("phone");
        }
        if let Some(stage) = arguments["lifecycle_stage"].as_str() {
            contact.lifecycle_stage = stage.to_string();
            updated.push("lifecycle_stage");
        }

        if updated.is_empty() {
            return Ok(ToolOutcome::fail(
                "Nenhum campo reconhecido para atualizar. Campos aceitos: name, email, phone, lifecycle_stage.",
            ));
        }

        if let Err(e) = self.store.update_contact(&contact).await {
            return Ok(ToolOutcome::fail(e.to_string()));
        }

        Ok(ToolOutcome::ok_with(
            format!("Contato atualizado: {}", updated.join(", ")),
            serde_json::json!({ "updated_fields": updated }),
        ))
    }
}
