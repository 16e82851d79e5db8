//! Knowledge chunk storage. Embeddings are BLOBs of little-endian f32;
//! a NULL blob means the chunk was never embedded and is skipped by
//! retrieval ranking.

use crate::{Store, blob_to_embedding, embedding_to_blob};
use respondo_core::crm::KnowledgeChunk;
use respondo_core::error::StoreError;
use sqlx::Row;

fn map_err(query: &str) -> impl Fn(sqlx::Error) -> StoreError + '_ {
    move |e| StoreError::QueryFailed(format!("{query}: {e}"))
}

impl Store {
    pub async fn insert_knowledge_chunk(&self, chunk: &KnowledgeChunk) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO knowledge_chunks
                 (id, tenant_id, agent_id, title, content, content_type, published, embedding)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&chunk.id)
        .bind(&chunk.tenant_id)
        .bind(&chunk.agent_id)
        .bind(&chunk.title)
        .bind(&chunk.content)
        .bind(&chunk.content_type)
        .bind(chunk.published)
        .bind(chunk.embedding.as_deref().map(embedding_to_blob))
        .execute(self.pool())
        .await
        .map_err(map_err("insert_knowledge_chunk"))?;
        Ok(())
    }

    /// Published chunks visible to an agent: tenant-wide chunks plus chunks
    /// scoped to this agent.
    pub async fn published_chunks(
        &self,
        tenant_id: &str,
        agent_id: &str,
    ) -> Result<Vec<KnowledgeChunk>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM knowledge_chunks
             WHERE tenant_id = ? AND published = 1
               AND (agent_id IS NULL OR agent_id = ?)",
        )
        .bind(tenant_id)
        .bind(agent_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_err("published_chunks"))?;

        rows.iter()
            .map(|r| {
                let embedding: Option<Vec<u8>> = r.try_get("embedding")?;
                Ok(KnowledgeChunk {
                    id: r.try_get("id")?,
                    tenant_id: r.try_get("tenant_id")?,
                    agent_id: r.try_get("agent_id")?,
                    title: r.try_get("title")?,
                    content: r.try_get("content")?,
                    content_type: r.try_get("content_type")?,
                    published: r.try_get("published")?,
                    embedding: embedding.map(|b| blob_to_embedding(&b)),
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(map_err("published_chunks"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, agent_id: Option<&str>, published: bool) -> KnowledgeChunk {
        KnowledgeChunk {
            id: id.into(),
            tenant_id: "t-1".into(),
            agent_id: agent_id.map(Into::into),
            title: format!("artigo {id}"),
            content: "Nosso plano anual custa R$ 1.200.".into(),
            content_type: "article".into(),
            published,
            embedding: Some(vec![0.1, 0.2, 0.3]),
        }
    }

    #[tokio::test]
    async fn published_chunks_scope_by_tenant_agent_and_flag() {
        let store = Store::in_memory().await.unwrap();
        store.insert_knowledge_chunk(&chunk("k-1", None, true)).await.unwrap();
        store.insert_knowledge_chunk(&chunk("k-2", Some("a-1"), true)).await.unwrap();
        store.insert_knowledge_chunk(&chunk("k-3", Some("a-2"), true)).await.unwrap();
        store.insert_knowledge_chunk(&chunk("k-4", None, false)).await.unwrap();

        let mut ids: Vec<_> = store
            .published_chunks("t-1", "a-1")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        ids.sort();
        assert_eq!(ids, ["k-1", "k-2"]);
    }

    #[tokio::test]
    async fn embedding_blob_survives_roundtrip() {
        let store = Store::in_memory().await.unwrap();
        store.insert_knowledge_chunk(&chunk("k-1", None, true)).await.unwrap();
        let loaded = store.published_chunks("t-1", "a-1").await.unwrap();
        assert_eq!(loaded[0].embedding.as_deref(), Some(&[0.1f32, 0.2, 0.3][..]));
    }

    #[tokio::test]
    async fn missing_embedding_is_none() {
        let store = Store::in_memory().await.unwrap();
        let mut c = chunk("k-1", None, true);
        c.embedding = None;
        store.insert_knowledge_chunk(&c).await.unwrap();
        let loaded = store.published_chunks("t-1", "a-1").await.unwrap();
        assert!(loaded[0].embedding.is_none());
    }
}
