//! Similarity-ranked retrieval over published knowledge chunks.

use crate::vector::cosine_similarity;
use respondo_core::crm::{KnowledgeChunk, KnowledgeSnippet};
use respondo_core::provider::Embedder;
use respondo_store::Store;
use std::sync::Arc;
use tracing::{debug, warn};

/// Minimum cosine similarity for a chunk to be considered relevant.
pub const SIMILARITY_THRESHOLD: f32 = 0.65;

/// Most snippets ever handed to the prompt composer.
pub const MAX_SNIPPETS: usize = 10;

/// Retrieves knowledge snippets for an inbound message.
///
/// Holds `Option<Arc<dyn Embedder>>`: when embeddings are unconfigured the
/// retriever exists but always returns empty, and the responder carries on
/// without grounding.
pub struct KnowledgeRetriever {
    store: Store,
    embedder: Option<Arc<dyn Embedder>>,
}

impl KnowledgeRetriever {
    pub fn new(store: Store, embedder: Option<Arc<dyn Embedder>>) -> Self {
        Self { store, embedder }
    }

    /// The top snippets relevant to `query`, best first.
    ///
    /// Never fails: an unconfigured embedder, an embedding error, or a store
    /// error all degrade to an empty result. Chunks that were never embedded
    /// are skipped.
    pub async fn retrieve(
        &self,
        tenant_id: &str,
        agent_id: &str,
        query: &str,
    ) -> Vec<KnowledgeSnippet> {
        let Some(embedder) = &self.embedder else {
            debug!("No embedder configured, skipping retrieval");
            return Vec::new();
        };

        let query_embedding = match embedder.embed(query).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Query embedding failed, continuing without knowledge");
                return Vec::new();
            }
        };

        let chunks = match self.store.published_chunks(tenant_id, agent_id).await {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(error = %e, "Knowledge lookup failed, continuing without knowledge");
                return Vec::new();
            }
        };

        rank(&query_embedding, chunks)
    }
}

/// Score, filter and order chunks against a query embedding.
fn rank(query_embedding: &[f32], chunks: Vec<KnowledgeChunk>) -> Vec<KnowledgeSnippet> {
    let mut scored: Vec<(f32, KnowledgeChunk)> = chunks
        .into_iter()
        .filter_map(|chunk| {
            let embedding = chunk.embedding.as_deref()?;
            let score = cosine_similarity(query_embedding, embedding);
            (score >= SIMILARITY_THRESHOLD).then_some((score, chunk))
        })
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored
        .into_iter()
        .take(MAX_SNIPPETS)
        .map(|(_, chunk)| KnowledgeSnippet {
            content: chunk.content,
            title: chunk.title,
            content_type: chunk.content_type,
        })
        .collect()
}
