//! Agent profile storage. Profiles are persisted as a single JSON document
//! per agent so new profile fields never require a schema migration.

use crate::Store;
use respondo_core::error::StoreError;
use respondo_core::profile::AgentProfile;
use sqlx::Row;

impl Store {
    pub async fn upsert_agent(&self, profile: &AgentProfile) -> Result<(), StoreError> {
        let json = serde_json::to_string(profile)
            .map_err(|e| StoreError::Storage(format!("Failed to serialize profile: {e}")))?;
        sqlx::query(
            "INSERT INTO agents (id, tenant_id, profile) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET tenant_id = excluded.tenant_id,
                                           profile = excluded.profile",
        )
        .bind(&profile.id)
        .bind(&profile.tenant_id)
        .bind(&json)
        .execute(self.pool())
        .await
        .map_err(|e| StoreError::QueryFailed(format!("upsert_agent: {e}")))?;
        Ok(())
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<AgentProfile, StoreError> {
        let row = sqlx::query("SELECT profile FROM agents WHERE id = ?")
            .bind(agent_id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StoreError::QueryFailed(format!("get_agent: {e}")))?
            .ok_or_else(|| StoreError::NotFound {
                entity: "agent",
                id: agent_id.to_string(),
            })?;

        let json: String = row
            .try_get("profile")
            .map_err(|e| StoreError::QueryFailed(format!("get_agent: {e}")))?;
        serde_json::from_str(&json)
            .map_err(|e| StoreError::Storage(format!("Corrupt agent profile: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use respondo_core::profile::ProviderKind;

    fn sample_profile() -> AgentProfile {
        serde_json::from_value(serde_json::json!({
            "id": "agent-1",
            "tenant_id": "tenant-1",
            "name": "Clara",
            "tone": "amigável",
            "goal": "qualificar leads",
            "provider": "anthropic"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn roundtrips_profile() {
        let store = Store::in_memory().await.unwrap();
        let profile = sample_profile();
        store.upsert_agent(&profile).await.unwrap();

        let loaded = store.get_agent("agent-1").await.unwrap();
        assert_eq!(loaded.name, "Clara");
        assert_eq!(loaded.provider, ProviderKind::Anthropic);
    }

    #[tokio::test]
    async fn missing_agent_is_not_found() {
        let store = Store::in_memory().await.unwrap();
        let err = store.get_agent("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "agent", .. }));
    }

    #[tokio::test]
    async fn upsert_overwrites() {
        let store = Store::in_memory().await.unwrap();
        let mut profile = sample_profile();
        store.upsert_agent(&profile).await.unwrap();
        profile.name = "Bia".into();
        store.upsert_agent(&profile).await.unwrap();
        assert_eq!(store.get_agent("agent-1").await.unwrap().name, "Bia");
    }
}
