//! `transfer_to_human` — flag the thread for human attention.
//!
//! Sets a boolean on the thread; the conversation loop itself continues so
//! the model can still close politely in its final turn.

use async_trait::async_trait;
use respondo_core::error::ToolError;
use respondo_core::tool::{CrmTool, ToolContext, ToolOutcome};
use respondo_store::Store;

pub struct TransferToHumanTool {
    store: Store,
}

impl TransferToHumanTool {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CrmTool for TransferToHumanTool {
    fn name(&self) -> &str {
        "transfer_to_human"
    }

    fn description(&self) -> &str {
        "Marca a conversa para atendimento humano quando o cliente pedir ou o assunto exigir."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "reason": { "type": "string", "description": "Motivo da transferência" }
            }
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        if let Err(e) = self.store.mark_thread_needs_human(&ctx.thread_id).await {
            return Ok(ToolOutcome::fail(e.to_string()));
        }

        let reason = arguments["reason"].as_str().unwrap_or("não informado");
        Ok(ToolOutcome::ok_with(
            "Conversa marcada para atendimento humano",
            serde_json::json!({ "reason": reason }),
        ))
    }
}
