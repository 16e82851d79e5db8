//! CRM entities the responder reads and writes.
//!
//! Persistent storage is the relational store; these are the value objects
//! that cross crate boundaries. Lifecycle: all entities except
//! [`ThreadMessage`] are mutated in place; the responder never deletes
//! records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle stage a contact is promoted to when qualification marks the
/// interest level "hot".
pub const STAGE_OPPORTUNITY: &str = "opportunity";

/// A CRM contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    /// Free-form lifecycle stage: "lead", "opportunity", "customer", ...
    pub lifecycle_stage: String,
}

/// A company linked to one or more contacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpportunityStatus {
    Open,
    Won,
    Lost,
}

impl std::fmt::Display for OpportunityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Won => write!(f, "won"),
            Self::Lost => write!(f, "lost"),
        }
    }
}

/// A sales deal linked to a contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: String,
    pub tenant_id: String,
    pub contact_id: String,
    pub title: String,
    pub amount_cents: i64,
    pub stage_id: String,
    pub status: OpportunityStatus,
}

/// One stage of a tenant's sales pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStage {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub position: i64,
}

/// A follow-up item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub tenant_id: String,
    pub contact_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub done: bool,
}

/// A conversation thread for one contact on one channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub tenant_id: String,
    pub contact_id: String,
    pub channel: String,
    /// Set by the `transfer_to_human` tool; never cleared by the responder.
    #[serde(default)]
    pub needs_human: bool,
    /// Opportunity this thread is negotiating, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opportunity_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderKind {
    Customer,
    Agent,
    Human,
}

/// Immutable record of one exchange turn. Written by the delivery
/// collaborator, read here for history context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub thread_id: String,
    pub direction: Direction,
    pub sender: SenderKind,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Durable per-contact memory, distinct from raw message history.
///
/// `facts` and `objections` are append-only and never contain duplicate
/// exact-string entries. `qualification` is shallow-merged on write with
/// last-write-wins per key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMemory {
    pub id: String,
    pub tenant_id: String,
    pub contact_id: String,
    #[serde(default)]
    pub facts: Vec<String>,
    #[serde(default)]
    pub objections: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action_date: Option<NaiveDate>,
    #[serde(default)]
    pub qualification: serde_json::Map<String, serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

impl ContactMemory {
    /// A fresh, empty memory for a contact (created lazily on first write).
    pub fn empty(tenant_id: impl Into<String>, contact_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant_id.into(),
            contact_id: contact_id.into(),
            facts: Vec::new(),
            objections: Vec::new(),
            next_action: None,
            next_action_date: None,
            qualification: serde_json::Map::new(),
            updated_at: Utc::now(),
        }
    }

    /// Append a fact unless the exact string is already present.
    /// Returns whether the fact was added.
    pub fn push_fact(&mut self, fact: &str) -> bool {
        if self.facts.iter().any(|f| f == fact) {
            return false;
        }
        self.facts.push(fact.to_string());
        true
    }

    /// Append an objection unless the exact string is already present.
    pub fn push_objection(&mut self, objection: &str) -> bool {
        if self.objections.iter().any(|o| o == objection) {
            return false;
        }
        self.objections.push(objection.to_string());
        true
    }

    /// Shallow-merge qualification fields, last write wins per key.
    pub fn merge_qualification(&mut self, fields: &serde_json::Map<String, serde_json::Value>) {
        for (key, value) in fields {
            self.qualification.insert(key.clone(), value.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Pending,
    Sent,
    Cancelled,
}

/// A future-dated outbound message, delivered by an external scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledMessage {
    pub id: String,
    pub tenant_id: String,
    pub thread_id: String,
    pub content: String,
    pub send_at: DateTime<Utc>,
    pub status: ScheduleStatus,
}

/// A tenant-scoped knowledge fragment with an optional embedding.
/// Read-only to the responder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub id: String,
    pub tenant_id: String,
    /// When set, the chunk is scoped to one agent; `None` is tenant-wide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub title: String,
    pub content: String,
    pub content_type: String,
    #[serde(default)]
    pub published: bool,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

/// A retrieval result handed to the prompt composer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    pub content: String,
    pub title: String,
    pub content_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_fact_suppresses_exact_duplicates() {
        let mut mem = ContactMemory::empty("t-1", "c-1");
        assert!(mem.push_fact("prefere contato por WhatsApp"));
        assert!(!mem.push_fact("prefere contato por WhatsApp"));
        assert_eq!(mem.facts.len(), 1);
    }

    #[test]
    fn push_fact_keeps_near_duplicates() {
        // Dedup is exact-string only; paraphrases are kept.
        let mut mem = ContactMemory::empty("t-1", "c-1");
        assert!(mem.push_fact("tem 2 filhos"));
        assert!(mem.push_fact("tem dois filhos"));
        assert_eq!(mem.facts.len(), 2);
    }

    #[test]
    fn qualification_merge_is_last_write_wins() {
        let mut mem = ContactMemory::empty("t-1", "c-1");
        let mut first = serde_json::Map::new();
        first.insert("budget".into(), serde_json::json!("5k"));
        first.insert("interest_level".into(), serde_json::json!("warm"));
        mem.merge_qualification(&first);

        let mut second = serde_json::Map::new();
        second.insert("interest_level".into(), serde_json::json!("hot"));
        mem.merge_qualification(&second);

        assert_eq!(mem.qualification["budget"], "5k");
        assert_eq!(mem.qualification["interest_level"], "hot");
    }

    #[test]
    fn opportunity_status_serializes_lowercase() {
        let json = serde_json::to_string(&OpportunityStatus::Open).unwrap();
        assert_eq!(json, "\"open\"");
    }
}
