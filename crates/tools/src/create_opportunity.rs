//! `create_opportunity` — open a sales deal for the current contact.
//!
//! New opportunities land on the tenant's first pipeline stage (lowest
//! position) with status `open`. A tenant without any pipeline stage cannot
//! receive opportunities, and the tool says so instead of inventing a stage.

use async_trait::async_trait;
use respondo_core::crm::{Opportunity, OpportunityStatus};
use respondo_core::error::ToolError;
use respondo_core::tool::{CrmTool, ToolContext, ToolOutcome};
use respondo_store::Store;
use uuid::Uuid;

pub struct CreateOpportunityTool {
    store: Store,
}

impl CreateOpportunityTool {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CrmTool for CreateOpportunityTool {
    fn name(&self) -> &str {
        "create_opportunity"
    }

    fn description(&self) -> &str {
        "Cria uma oportunidade de venda para o contato atual, no primeiro estágio do funil."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "title": { "type": "string", "description": "Título da oportunidade" },
                "amount": {
                    "type": "number",
                    "description": "Valor estimado em reais (opcional)"
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

        let stages = match self.store.stages_for_tenant(&ctx.tenant_id).await {
            Ok(stages) => stages,
            Err(e) => return Ok(ToolOutcome::fail(e.to_string())),
        };
        let Some(first_stage) = stages.first() else {
            return Ok(ToolOutcome::fail(
                "Nenhum estágio de funil configurado para este workspace. \
                 Configure o funil de vendas antes de criar oportunidades.",
            ));
        };

        let amount_cents = arguments["amount"]
            .as_f64()
            .map(|v| (v * 100.0).round() as i64)
            .unwrap_or(0);

        let opportunity = Opportunity {
            id: Uuid::new_v4().to_string(),
            tenant_id: ctx.tenant_id.clone(),
            contact_id: ctx.contact_id.clone(),
            title: title.to_string(),
            amount_cents,
            stage_id: first_stage.id.clone(),
            status: OpportunityStatus::Open,
        };

        if let Err(e) = self.store.insert_opportunity(&opportunity).await {
            return Ok(ToolOutcome::fail(e.to_string()));
        }

        Ok(ToolOutcome::ok_with(
            format!("Oportunidade \"{title}\" criada no estágio {}", first_stage.name),
            serde_json::json!({ "opportunity_id": opportunity.id, "stage": first_stage.name }),
        ))
    }
}
