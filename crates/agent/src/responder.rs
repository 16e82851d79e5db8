//! End-to-end agent invocation.
//!
//! `Responder::respond` is the single entry point: it runs the pre-flight
//! gates, assembles the prompt context, drives the orchestrator and writes
//! the accounting rows. Accounting is best effort; a failed log write never
//! fails the invocation.

use crate::gating::within_working_hours;
use crate::orchestrator::Orchestrator;
use crate::prompt::{compose, PromptContext};
use chrono::Utc;
use respondo_core::{
    AgentLogEntry, AgentProfile, ChatMessage, Direction, Embedder, Error, InvocationStatus,
    MessageDelivery, Provider, ProviderError, ProviderKind, Role, SenderMeta, StoreError,
    ToolContext, UsageLogEntry,
};
use respondo_knowledge::KnowledgeRetriever;
use respondo_store::Store;
use respondo_tools::build_registry;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Prior thread messages fed to the model.
const HISTORY_MESSAGES: u32 = 20;

/// Resolves a configured provider for an agent. Implemented by
/// `ProviderRegistry`; tests substitute their own.
pub trait ProviderSelector: Send + Sync {
    fn select(&self, kind: ProviderKind) -> Result<Arc<dyn Provider>, ProviderError>;
    fn default_model(&self, kind: ProviderKind) -> String;
    fn embedder(&self) -> Option<Arc<dyn Embedder>>;
}

impl ProviderSelector for respondo_providers::ProviderRegistry {
    fn select(&self, kind: ProviderKind) -> Result<Arc<dyn Provider>, ProviderError> {
        self.get(kind)
    }

    fn default_model(&self, kind: ProviderKind) -> String {
        self.default_model(kind)
    }

    fn embedder(&self) -> Option<Arc<dyn Embedder>> {
        self.embedder()
    }
}

/// One inbound customer message to answer.
#[derive(Debug, Clone)]
pub struct RespondRequest {
    pub agent_id: String,
    pub contact_id: String,
    pub thread_id: String,
    pub message: String,
    /// Test invocations skip delivery but still log and bill.
    pub is_test_mode: bool,
}

#[derive(Debug, Clone)]
pub enum RespondOutcome {
    Replied {
        response: String,
        response_time_ms: u64,
        tokens_used: u32,
        tools_executed: Vec<String>,
    },
    /// Denied by a pre-flight gate; no model call was made.
    Skipped(InvocationStatus),
}

pub struct Responder {
    store: Store,
    providers: Arc<dyn ProviderSelector>,
    retriever: KnowledgeRetriever,
    delivery: Arc<dyn MessageDelivery>,
}

impl Responder {
    pub fn new(
        store: Store,
        providers: Arc<dyn ProviderSelector>,
        delivery: Arc<dyn MessageDelivery>,
    ) -> Self {
        let retriever = KnowledgeRetriever::new(store.clone(), providers.embedder());
        Self {
            store,
            providers,
            retriever,
            delivery,
        }
    }

    pub async fn respond(&self, req: &RespondRequest) -> Result<RespondOutcome, Error> {
        let started = Instant::now();

        let profile = match self.store.get_agent(&req.agent_id).await {
            Ok(profile) => profile,
            Err(StoreError::NotFound { .. }) => {
                return Err(Error::config(format!("agent not found: {}", req.agent_id)));
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(skipped) = self.run_gates(req, &profile).await? {
            return Ok(RespondOutcome::Skipped(skipped));
        }

        let provider = match self.providers.select(profile.provider) {
            Ok(provider) => provider,
            Err(ProviderError::NotConfigured(msg)) => return Err(Error::config(msg)),
            Err(e) => return Err(e.into()),
        };
        let model = profile
            .model
            .clone()
            .unwrap_or_else(|| self.providers.default_model(profile.provider));

        let (contact, history, memory, opportunities) = tokio::join!(
            self.store.get_contact(&req.contact_id),
            self.store.recent_messages(&req.thread_id, HISTORY_MESSAGES),
            self.store.memory_for_contact(&req.contact_id),
            self.store.open_opportunities_by_contact(&req.contact_id),
        );
        let contact = match contact {
            Ok(contact) => contact,
            Err(StoreError::NotFound { .. }) => {
                return Err(Error::config(format!("contact not found: {}", req.contact_id)));
            }
            Err(e) => return Err(e.into()),
        };
        let history = history.unwrap_or_else(|e| {
            warn!(error = %e, "failed to load thread history");
            Vec::new()
        });
        let memory = memory.unwrap_or_else(|e| {
            warn!(error = %e, "failed to load contact memory");
            None
        });
        let opportunities = opportunities.unwrap_or_else(|e| {
            warn!(error = %e, "failed to load open opportunities");
            Vec::new()
        });
        let company = match &contact.company_id {
            Some(company_id) => self.store.get_company(company_id).await.unwrap_or_else(|e| {
                warn!(error = %e, "failed to load company");
                None
            }),
            None => None,
        };

        let knowledge = self
            .retriever
            .retrieve(&profile.tenant_id, &profile.id, &req.message)
            .await;

        let registry = build_registry(&self.store, &profile);
        let definitions = registry.definitions();
        let prompt = compose(&PromptContext {
            profile: &profile,
            contact: &contact,
            company: company.as_ref(),
            opportunities: &opportunities,
            memory: memory.as_ref(),
            tools: &definitions,
            knowledge: &knowledge,
        });

        let chat_history: Vec<ChatMessage> = history
            .iter()
            .map(|m| {
                let role = match m.direction {
                    Direction::Inbound => Role::User,
                    Direction::Outbound => Role::Assistant,
                };
                ChatMessage::from_history(role, &m.content)
            })
            .collect();

        let tool_ctx = ToolContext {
            tenant_id: profile.tenant_id.clone(),
            agent_id: profile.id.clone(),
            contact_id: req.contact_id.clone(),
            thread_id: req.thread_id.clone(),
        };

        let orchestrator =
            Orchestrator::new(provider.as_ref(), &registry, &model, profile.temperature);
        let result = orchestrator
            .run(&prompt, chat_history, &req.message, &tool_ctx)
            .await;

        let latency_ms = started.elapsed().as_millis() as u64;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.write_agent_log(AgentLogEntry {
                    id: Uuid::new_v4().to_string(),
                    tenant_id: profile.tenant_id.clone(),
                    agent_id: profile.id.clone(),
                    thread_id: req.thread_id.clone(),
                    input: req.message.clone(),
                    output: String::new(),
                    status: InvocationStatus::Error,
                    tokens_used: 0,
                    latency_ms,
                    tools_executed: Vec::new(),
                    fallback_reason: None,
                    created_at: Utc::now(),
                })
                .await;
                return Err(e.into());
            }
        };

        if !req.is_test_mode {
            let sender = SenderMeta {
                agent_id: profile.id.clone(),
                agent_name: profile.name.clone(),
            };
            if let Err(e) = self
                .delivery
                .send(&req.thread_id, &outcome.text, &sender)
                .await
            {
                self.write_agent_log(AgentLogEntry {
                    id: Uuid::new_v4().to_string(),
                    tenant_id: profile.tenant_id.clone(),
                    agent_id: profile.id.clone(),
                    thread_id: req.thread_id.clone(),
                    input: req.message.clone(),
                    output: outcome.text.clone(),
                    status: InvocationStatus::Error,
                    tokens_used: outcome.usage.total_tokens,
                    latency_ms: started.elapsed().as_millis() as u64,
                    tools_executed: outcome.tools_executed.clone(),
                    fallback_reason: outcome.fallback_reason.clone(),
                    created_at: Utc::now(),
                })
                .await;
                return Err(e.into());
            }
        }

        let status = if outcome.fallback_reason.is_some() {
            InvocationStatus::Fallback
        } else {
            InvocationStatus::Success
        };
        info!(
            agent_id = %profile.id,
            thread_id = %req.thread_id,
            %status,
            tokens = outcome.usage.total_tokens,
            latency_ms,
            "invocation finished"
        );

        self.write_agent_log(AgentLogEntry {
            id: Uuid::new_v4().to_string(),
            tenant_id: profile.tenant_id.clone(),
            agent_id: profile.id.clone(),
            thread_id: req.thread_id.clone(),
            input: req.message.clone(),
            output: outcome.text.clone(),
            status,
            tokens_used: outcome.usage.total_tokens,
            latency_ms,
            tools_executed: outcome.tools_executed.clone(),
            fallback_reason: outcome.fallback_reason.clone(),
            created_at: Utc::now(),
        })
        .await;
        self.write_usage_log(UsageLogEntry {
            id: Uuid::new_v4().to_string(),
            tenant_id: profile.tenant_id.clone(),
            agent_id: profile.id.clone(),
            model: outcome.model.clone(),
            prompt_tokens: outcome.usage.prompt_tokens,
            completion_tokens: outcome.usage.completion_tokens,
            latency_ms,
            created_at: Utc::now(),
        })
        .await;

        Ok(RespondOutcome::Replied {
            response: outcome.text,
            response_time_ms: latency_ms,
            tokens_used: outcome.usage.total_tokens,
            tools_executed: outcome.tools_executed,
        })
    }

    /// Pre-flight gates. Each denial writes its log row before returning.
    async fn run_gates(
        &self,
        req: &RespondRequest,
        profile: &AgentProfile,
    ) -> Result<Option<InvocationStatus>, Error> {
        if !within_working_hours(&profile.working_hours, Utc::now()) {
            // The auto-reply is a pre-check side effect; test mode exempts
            // only the final delivery, not this one.
            let sender = SenderMeta {
                agent_id: profile.id.clone(),
                agent_name: profile.name.clone(),
            };
            if let Err(e) = self
                .delivery
                .send(&req.thread_id, &profile.out_of_hours_message, &sender)
                .await
            {
                warn!(error = %e, "out-of-hours auto-reply failed");
            }
            self.write_agent_log(AgentLogEntry::skipped(
                &profile.tenant_id,
                &profile.id,
                &req.thread_id,
                &req.message,
                InvocationStatus::SkippedOutOfHours,
            ))
            .await;
            return Ok(Some(InvocationStatus::SkippedOutOfHours));
        }

        let sent = self
            .store
            .count_success_logs(&profile.id, &req.thread_id)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to count prior responses");
                0
            });
        if sent >= profile.message_cap {
            self.write_agent_log(AgentLogEntry::skipped(
                &profile.tenant_id,
                &profile.id,
                &req.thread_id,
                &req.message,
                InvocationStatus::SkippedMaxMessages,
            ))
            .await;
            return Ok(Some(InvocationStatus::SkippedMaxMessages));
        }

        Ok(None)
    }

    async fn write_agent_log(&self, entry: AgentLogEntry) {
        if let Err(e) = self.store.insert_agent_log(&entry).await {
            warn!(error = %e, "failed to write agent log");
        }
    }

    async fn write_usage_log(&self, entry: UsageLogEntry) {
        if let Err(e) = self.store.insert_usage_log(&entry).await {
            warn!(error = %e, "failed to write usage log");
        }
    }
}
