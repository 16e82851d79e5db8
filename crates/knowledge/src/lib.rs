//! Knowledge retrieval.
//!
//! Embeds the inbound message, ranks the tenant's published chunks by cosine
//! similarity, and hands the top snippets to the prompt composer. Retrieval
//! is strictly best-effort: every failure path degrades to an empty result
//! and the invocation continues without grounding.
//!
//! [`payment`] holds the keyword scorer `send_payment_link` uses to find a
//! checkout URL in the knowledge base.

pub mod payment;
mod retriever;
mod vector;

pub use retriever::{KnowledgeRetriever, MAX_SNIPPETS, SIMILARITY_THRESHOLD};
pub use vector::cosine_similarity;
