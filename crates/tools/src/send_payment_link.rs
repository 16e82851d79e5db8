//! `send_payment_link` — resolve a checkout link for the customer.
//!
//! Resolution order:
//! 1. the profile's payment-provider base URL template,
//! 2. a keyword-scored search over the tenant's published knowledge chunks,
//! 3. a human-readable placeholder that is explicitly not a link.
//!
//! The model is told which case it got, so the placeholder is never dressed
//! up as a real link to the end customer. When the thread negotiates an
//! opportunity and an amount was requested, the opportunity amount is
//! updated as a side effect.

use async_trait::async_trait;
use respondo_core::error::ToolError;
use respondo_core::tool::{CrmTool, ToolContext, ToolOutcome};
use respondo_knowledge::payment::find_payment_link;
use respondo_store::Store;
use tracing::debug;

const PLACEHOLDER: &str =
    "nenhum link de pagamento configurado; oriente o cliente a aguardar o time financeiro";

pub struct SendPaymentLinkTool {
    store: Store,
    payment_base_url: Option<String>,
}

impl SendPaymentLinkTool {
    pub fn new(store: Store, payment_base_url: Option<String>) -> Self {
        Self { store, payment_base_url }
    }

    fn resolve_from_profile(&self, ctx: &ToolContext) -> Option<String> {
        let template = self.payment_base_url.as_deref()?;
        Some(template.replace("{tenant}", &ctx.tenant_id))
    }
}

#[async_trait]
impl CrmTool for SendPaymentLinkTool {
    fn name(&self) -> &str {
        "send_payment_link"
    }

    fn description(&self) -> &str {
        "Obtém o link de pagamento oficial para enviar ao cliente. \
         Use sempre que o cliente pedir pix, boleto ou link de pagamento."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "description": {
                    "type": "string",
                    "description": "O que o cliente quer pagar, ex: plano anual"
                },
                "amount": {
                    "type": "number",
                    "description": "Valor em reais, se conhecido"
                }
            }
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        let description = arguments["description"].as_str().unwrap_or_default();

        let (link, source) = if let Some(link) = self.resolve_from_profile(ctx) {
            (Some(link), "payment_provider")
        } else {
            let chunks = match self.store.published_chunks(&ctx.tenant_id, &ctx.agent_id).await {
                Ok(chunks) => chunks,
                Err(e) => return Ok(ToolOutcome::fail(e.to_string())),
            };
            match find_payment_link(&chunks, description) {
                Some(link) => (Some(link), "knowledge_base"),
                None => (None, "unavailable"),
            }
        };

        // Side effect: the negotiated amount lands on the linked opportunity.
        if let Some(amount) = arguments["amount"].as_f64() {
            if let Ok(thread) = self.store.get_thread(&ctx.thread_id).await {
                if let Some(opportunity_id) = thread.opportunity_id {
                    let cents = (amount * 100.0).round() as i64;
                    if let Err(e) =
                        self.store.update_opportunity_amount(&opportunity_id, cents).await
                    {
                        debug!(error = %e, "Failed to update opportunity amount");
                    }
                }
            }
        }

        match link {
            Some(link) => Ok(ToolOutcome::ok_with(
                format!("Link de pagamento: {link}"),
                serde_json::json!({ "link": link, "source": source }),
            )),
            None => Ok(ToolOutcome::ok_with(
                PLACEHOLDER,
                serde_json::json!({ "link": null, "source": source }),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use respondo_core::crm::{KnowledgeChunk, Opportunity, OpportunityStatus, Thread};

    fn ctx() -> ToolContext {
        ToolContext {
            tenant_id: "t-1".into(),
            agent_id: "a-1".into(),
            contact_id: "c-1".into(),
            thread_id: "th-1".into(),
        }
    }

    #[tokio::test]
    async fn profile_url_wins_over_knowledge() {
        let store = Store::in_memory().await.unwrap();
        store
            .insert_knowledge_chunk(&KnowledgeChunk {
                id: "k-1".into(),
                tenant_id: "t-1".into(),
                agent_id: None,
                title: "Pagamento".into(),
                content: "https://pay.example.com/kb".into(),
                content_type: "article".into(),
                published: true,
                embedding: None,
            })
            .await
            .unwrap();

        let tool =
            SendPaymentLinkTool::new(store, Some("https://pay.example.com/{tenant}".into()));
        let outcome = tool.execute(serde_json::json!({}), &ctx()).await.unwrap();
        assert!(outcome.success);
        let data = outcome.data.unwrap();
        assert_eq!(data["link"], "https://pay.example.com/t-1");
        assert_eq!(data["source"], "payment_provider");
    }

    #[tokio::test]
    async fn falls_back_to_knowledge_base() {
        let store = Store::in_memory().await.unwrap();
        store
            .insert_knowledge_chunk(&KnowledgeChunk {
                id: "k-1".into(),
                tenant_id: "t-1".into(),
                agent_id: None,
                title: "Link de pagamento".into(),
                content: "Checkout em https://pay.example.com/plano-anual".into(),
                content_type: "article".into(),
                published: true,
                embedding: None,
            })
            .await
            .unwrap();

        let tool = SendPaymentLinkTool::new(store, None);
        let outcome = tool
            .execute(serde_json::json!({"description": "plano anual"}), &ctx())
            .await
            .unwrap();
        let data = outcome.data.unwrap();
        assert_eq!(data["link"], "https://pay.example.com/plano-anual");
        assert_eq!(data["source"], "knowledge_base");
    }

    #[tokio::test]
    async fn placeholder_is_not_a_link() {
        let store = Store::in_memory().await.unwrap();
        let tool = SendPaymentLinkTool::new(store, None);
        let outcome = tool.execute(serde_json::json!({}), &ctx()).await.unwrap();
        assert!(outcome.success);
        let data = outcome.data.unwrap();
        assert!(data["link"].is_null());
        assert!(!outcome.message.contains("http"));
    }

    #[tokio::test]
    async fn updates_linked_opportunity_amount() {
        let store = Store::in_memory().await.unwrap();
        store
            .insert_opportunity(&Opportunity {
                id: "o-1".into(),
                tenant_id: "t-1".into(),
                contact_id: "c-1".into(),
                title: "Plano anual".into(),
                amount_cents: 0,
                stage_id: "s-1".into(),
                status: OpportunityStatus::Open,
            })
            .await
            .unwrap();
        store
            .insert_thread(&Thread {
                id: "th-1".into(),
                tenant_id: "t-1".into(),
                contact_id: "c-1".into(),
                channel: "whatsapp".into(),
                needs_human: false,
                opportunity_id: Some("o-1".into()),
            })
            .await
            .unwrap();

        let tool =
            SendPaymentLinkTool::new(store.clone(), Some("https://pay.example.com/x".into()));
        tool.execute(serde_json::json!({"amount": 1200.0}), &ctx()).await.unwrap();

        assert_eq!(store.get_opportunity("o-1").await.unwrap().amount_cents, 120_000);
    }
}
