//! Agent orchestration: gating, prompt composition and the tool loop.
//!
//! The entry point is [`Responder::respond`], which runs a single agent
//! invocation end to end: pre-checks, context assembly, the provider
//! round-trip loop and accounting.

mod gating;
mod orchestrator;
mod prompt;
mod responder;

pub use gating::within_working_hours;
pub use orchestrator::{Orchestration, Orchestrator, FALLBACK_MESSAGE, MAX_TOOL_ROUNDS};
pub use prompt::{compose, PromptContext, MAX_FEEDBACK_RULES, MAX_PROMPT_FACTS};
pub use responder::{ProviderSelector, RespondOutcome, RespondRequest, Responder};
