//! Agent and usage log persistence. Both tables are append-only.

use crate::Store;
use respondo_core::error::StoreError;
use respondo_core::log::{AgentLogEntry, InvocationStatus, UsageLogEntry};
use chrono::{DateTime, Utc};
use sqlx::Row;

fn map_err(query: &str) -> impl Fn(sqlx::Error) -> StoreError + '_ {
    move |e| StoreError::QueryFailed(format!("{query}: {e}"))
}

fn parse_status(s: &str) -> InvocationStatus {
    match s {
        "success" => InvocationStatus::Success,
        "fallback" => InvocationStatus::Fallback,
        "skipped_out_of_hours" => InvocationStatus::SkippedOutOfHours,
        "skipped_max_messages" => InvocationStatus::SkippedMaxMessages,
        _ => InvocationStatus::Error,
    }
}

impl Store {
    pub async fn insert_agent_log(&self, entry: &AgentLogEntry) -> Result<(), StoreError> {
        let tools = serde_json::to_string(&entry.tools_executed)
            .map_err(|e| StoreError::Storage(format!("Failed to serialize tools: {e}")))?;
        sqlx::query(
            "INSERT INTO agent_logs
                 (id, tenant_id, agent_id, thread_id, input, output, status,
                  tokens_used, latency_ms, tools_executed, fallback_reason, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.tenant_id)
        .bind(&entry.agent_id)
        .bind(&entry.thread_id)
        .bind(&entry.input)
        .bind(&entry.output)
        .bind(entry.status.to_string())
        .bind(entry.tokens_used)
        .bind(entry.latency_ms as i64)
        .bind(&tools)
        .bind(&entry.fallback_reason)
        .bind(entry.created_at.to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(map_err("insert_agent_log"))?;
        Ok(())
    }

    /// Successful replies recorded for this (agent, thread) pair. The
    /// per-conversation cap counts only these; skipped/fallback/error rows
    /// never consume quota.
    pub async fn count_success_logs(
        &self,
        agent_id: &str,
        thread_id: &str,
    ) -> Result<u32, StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM agent_logs
             WHERE agent_id = ? AND thread_id = ? AND status = 'success'",
        )
        .bind(agent_id)
        .bind(thread_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_err("count_success_logs"))?;
        let n: i64 = row.try_get("n").map_err(map_err("count_success_logs"))?;
        Ok(n as u32)
    }

    pub async fn agent_logs_for_thread(
        &self,
        agent_id: &str,
        thread_id: &str,
    ) -> Result<Vec<AgentLogEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM agent_logs WHERE agent_id = ? AND thread_id = ?
             ORDER BY created_at ASC",
        )
        .bind(agent_id)
        .bind(thread_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_err("agent_logs_for_thread"))?;

        rows.iter()
            .map(|r| {
                let status: String = r.try_get("status")?;
                let tools: String = r.try_get("tools_executed")?;
                let tokens: i64 = r.try_get("tokens_used")?;
                let latency: i64 = r.try_get("latency_ms")?;
                let created_at: String = r.try_get("created_at")?;
                Ok(AgentLogEntry {
                    id: r.try_get("id")?,
                    tenant_id: r.try_get("tenant_id")?,
                    agent_id: r.try_get("agent_id")?,
                    thread_id: r.try_get("thread_id")?,
                    input: r.try_get("input")?,
                    output: r.try_get("output")?,
                    status: parse_status(&status),
                    tokens_used: tokens as u32,
                    latency_ms: latency as u64,
                    tools_executed: serde_json::from_str(&tools).unwrap_or_default(),
                    fallback_reason: r.try_get("fallback_reason")?,
                    created_at: DateTime::parse_from_rfc3339(&created_at)
                        .map(|d| d.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(map_err("agent_logs_for_thread"))
    }

    pub async fn insert_usage_log(&self, entry: &UsageLogEntry) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO usage_logs
                 (id, tenant_id, agent_id, model, prompt_tokens, completion_tokens,
                  latency_ms, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.tenant_id)
        .bind(&entry.agent_id)
        .bind(&entry.model)
        .bind(entry.prompt_tokens)
        .bind(entry.completion_tokens)
        .bind(entry.latency_ms as i64)
        .bind(entry.created_at.to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(map_err("insert_usage_log"))?;
        Ok(())
    }

    pub async fn count_usage_logs(&self, agent_id: &str) -> Result<u32, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM usage_logs WHERE agent_id = ?")
            .bind(agent_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_err("count_usage_logs"))?;
        let n: i64 = row.try_get("n").map_err(map_err("count_usage_logs"))?;
        Ok(n as u32)
    }
}
