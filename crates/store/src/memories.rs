//! Contact memory persistence.
//!
//! One row per contact (UNIQUE constraint); writers upsert the whole record.
//! List and map fields are stored as JSON text.

use crate::Store;
use respondo_core::crm::ContactMemory;
use respondo_core::error::StoreError;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Row;

fn map_err(query: &str) -> impl Fn(sqlx::Error) -> StoreError + '_ {
    move |e| StoreError::QueryFailed(format!("{query}: {e}"))
}

fn json_err(field: &str, e: serde_json::Error) -> StoreError {
    StoreError::Storage(format!("Corrupt memory field {field}: {e}"))
}

impl Store {
    /// The memory record for a contact, if one exists.
    pub async fn memory_for_contact(
        &self,
        contact_id: &str,
    ) -> Result<Option<ContactMemory>, StoreError> {
        let row = sqlx::query("SELECT * FROM contact_memories WHERE contact_id = ?")
            .bind(contact_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_err("memory_for_contact"))?;

        let Some(row) = row else { return Ok(None) };

        let facts: String = row.try_get("facts").map_err(map_err("memory_for_contact"))?;
        let objections: String = row
            .try_get("objections")
            .map_err(map_err("memory_for_contact"))?;
        let qualification: String = row
            .try_get("qualification")
            .map_err(map_err("memory_for_contact"))?;
        let next_action_date: Option<String> = row
            .try_get("next_action_date")
            .map_err(map_err("memory_for_contact"))?;
        let updated_at: String = row
            .try_get("updated_at")
            .map_err(map_err("memory_for_contact"))?;

        Ok(Some(ContactMemory {
            id: row.try_get("id").map_err(map_err("memory_for_contact"))?,
            tenant_id: row
                .try_get("tenant_id")
                .map_err(map_err("memory_for_contact"))?,
            contact_id: row
                .try_get("contact_id")
                .map_err(map_err("memory_for_contact"))?,
            facts: serde_json::from_str(&facts).map_err(|e| json_err("facts", e))?,
            objections: serde_json::from_str(&objections).map_err(|e| json_err("objections", e))?,
            next_action: row
                .try_get("next_action")
                .map_err(map_err("memory_for_contact"))?,
            next_action_date: next_action_date
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            qualification: serde_json::from_str(&qualification)
                .map_err(|e| json_err("qualification", e))?,
            updated_at: DateTime::parse_from_rfc3339(&updated_at)
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }))
    }

    /// Insert or replace the memory record for a contact.
    pub async fn upsert_memory(&self, memory: &ContactMemory) -> Result<(), StoreError> {
        let facts = serde_json::to_string(&memory.facts)
            .map_err(|e| StoreError::Storage(format!("Failed to serialize facts: {e}")))?;
        let objections = serde_json::to_string(&memory.objections)
            .map_err(|e| StoreError::Storage(format!("Failed to serialize objections: {e}")))?;
        let qualification = serde_json::to_string(&memory.qualification)
            .map_err(|e| StoreError::Storage(format!("Failed to serialize qualification: {e}")))?;

        sqlx::query(
            "INSERT INTO contact_memories
                 (id, tenant_id, contact_id, facts, objections, next_action,
                  next_action_date, qualification, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(contact_id) DO UPDATE SET
                 facts = excluded.facts,
                 objections = excluded.objections,
                 next_action = excluded.next_action,
                 next_action_date = excluded.next_action_date,
                 qualification = excluded.qualification,
                 updated_at = excluded.updated_at",
        )
        .bind(&memory.id)
        .bind(&memory.tenant_id)
        .bind(&memory.contact_id)
        .bind(&facts)
        .bind(&objections)
        .bind(&memory.next_action)
        .bind(memory.next_action_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(&qualification)
        .bind(memory.updated_at.to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(map_err("upsert_memory"))?;
        Ok(())
    }
}
