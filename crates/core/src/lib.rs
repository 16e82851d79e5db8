//! # Respondo Core
//!
//! Domain types, traits, and error definitions for the Respondo agent
//! responder. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator is defined as a trait here (LLM provider, CRM tool,
//! message delivery). Implementations live in their respective crates. This
//! enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod crm;
pub mod delivery;
pub mod error;
pub mod log;
pub mod message;
pub mod profile;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use crm::{
    Company, Contact, ContactMemory, Direction, KnowledgeChunk, KnowledgeSnippet, Opportunity,
    OpportunityStatus, PipelineStage, ScheduleStatus, ScheduledMessage, SenderKind, Task, Thread,
    ThreadMessage,
};
pub use delivery::{MessageDelivery, SenderMeta};
pub use error::{DeliveryError, Error, ProviderError, Result, StoreError, ToolError};
pub use log::{AgentLogEntry, InvocationStatus, UsageLogEntry};
pub use message::{ChatMessage, MessageToolCall, Role};
pub use profile::{AgentProfile, DayWindow, FeedbackRule, ProviderKind, WorkingHours};
pub use provider::{ChatRequest, ChatResponse, Embedder, Provider, ToolDefinition, Usage};
pub use tool::{CrmTool, ToolCall, ToolContext, ToolOutcome, ToolRegistry};
