//! LLM provider adapters.
//!
//! Three families, all behind [`respondo_core::Provider`]:
//! - [`AnthropicProvider`]: the Anthropic Messages API with native
//!   `tool_use` / `tool_result` content blocks
//! - [`OpenAiProvider`]: OpenAI chat completions with function-style tools,
//!   also serving any OpenAI-compatible gateway via a custom base URL
//! - [`OpenAiEmbedder`]: the `/embeddings` endpoint, consumed by retrieval
//!
//! Selection is enum-keyed through [`ProviderRegistry`]; there is no
//! stringly-typed dispatch. [`complete_with_retry`] wraps any provider with
//! the single fixed-delay rate-limit retry the responder uses.

mod anthropic;
mod openai;
mod registry;
mod retry;

pub use anthropic::AnthropicProvider;
pub use openai::{OpenAiEmbedder, OpenAiProvider};
pub use registry::ProviderRegistry;
pub use retry::{RATE_LIMIT_RETRY_DELAY, complete_with_retry};
