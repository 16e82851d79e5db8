//! SQLite-backed relational store for Respondo.
//!
//! One [`Store`] owns the connection pool and exposes repository methods per
//! bounded context (contacts, threads, memories, knowledge, logs, agents).
//! A single pool gives read-your-writes consistency within an invocation: a
//! memory record created earlier in the invocation is visible to a later
//! update in the same invocation.
//!
//! Schema is created by inline migrations; pass `":memory:"` for an
//! in-process ephemeral database (used across the test suites).

mod agents;
mod crm;
mod knowledge;
mod logs;
mod memories;
mod threads;

use respondo_core::error::StoreError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;
use tracing::{debug, info};

/// The relational store. Cheap to clone (pool handle).
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the database at `path` and run migrations.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    /// An ephemeral in-memory store, used by tests.
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::open(":memory:").await
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run schema migrations. Idempotent.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        let statements: &[(&str, &str)] = &[
            (
                "agents",
                r#"
                CREATE TABLE IF NOT EXISTS agents (
                    id         TEXT PRIMARY KEY,
                    tenant_id  TEXT NOT NULL,
                    profile    TEXT NOT NULL
                )
                "#,
            ),
            (
                "contacts",
                r#"
                CREATE TABLE IF NOT EXISTS contacts (
                    id              TEXT PRIMARY KEY,
                    tenant_id       TEXT NOT NULL,
                    name            TEXT NOT NULL,
                    email           TEXT,
                    phone           TEXT,
                    company_id      TEXT,
                    lifecycle_stage TEXT NOT NULL DEFAULT 'lead'
                )
                "#,
            ),
            (
                "companies",
                r#"
                CREATE TABLE IF NOT EXISTS companies (
                    id        TEXT PRIMARY KEY,
                    tenant_id TEXT NOT NULL,
                    name      TEXT NOT NULL,
                    industry  TEXT,
                    website   TEXT
                )
                "#,
            ),
            (
                "pipeline_stages",
                r#"
                CREATE TABLE IF NOT EXISTS pipeline_stages (
                    id        TEXT PRIMARY KEY,
                    tenant_id TEXT NOT NULL,
                    name      TEXT NOT NULL,
                    position  INTEGER NOT NULL
                )
                "#,
            ),
            (
                "opportunities",
                r#"
                CREATE TABLE IF NOT EXISTS opportunities (
                    id           TEXT PRIMARY KEY,
                    tenant_id    TEXT NOT NULL,
                    contact_id   TEXT NOT NULL,
                    title        TEXT NOT NULL,
                    amount_cents INTEGER NOT NULL DEFAULT 0,
                    stage_id     TEXT NOT NULL,
                    status       TEXT NOT NULL DEFAULT 'open'
                )
                "#,
            ),
            (
                "tasks",
                r#"
                CREATE TABLE IF NOT EXISTS tasks (
                    id          TEXT PRIMARY KEY,
                    tenant_id   TEXT NOT NULL,
                    contact_id  TEXT NOT NULL,
                    title       TEXT NOT NULL,
                    description TEXT,
                    due_at      TEXT,
                    done        INTEGER NOT NULL DEFAULT 0
                )
                "#,
            ),
            (
                "threads",
                r#"
                CREATE TABLE IF NOT EXISTS threads (
                    id             TEXT PRIMARY KEY,
                    tenant_id      TEXT NOT NULL,
                    contact_id     TEXT NOT NULL,
                    channel        TEXT NOT NULL,
                    needs_human    INTEGER NOT NULL DEFAULT 0,
                    opportunity_id TEXT
                )
                "#,
            ),
            (
                "thread_messages",
                r#"
                CREATE TABLE IF NOT EXISTS thread_messages (
                    id         TEXT PRIMARY KEY,
                    thread_id  TEXT NOT NULL,
                    direction  TEXT NOT NULL,
                    sender     TEXT NOT NULL,
                    content    TEXT NOT NULL,
                    created_at TEXT NOT NULL
                )
                "#,
            ),
            (
                "contact_memories",
                r#"
                CREATE TABLE IF NOT EXISTS contact_memories (
                    id               TEXT PRIMARY KEY,
                    tenant_id        TEXT NOT NULL,
                    contact_id       TEXT NOT NULL UNIQUE,
                    facts            TEXT NOT NULL DEFAULT '[]',
                    objections       TEXT NOT NULL DEFAULT '[]',
                    next_action      TEXT,
                    next_action_date TEXT,
                    qualification    TEXT NOT NULL DEFAULT '{}',
                    updated_at       TEXT NOT NULL
                )
                "#,
            ),
            (
                "scheduled_messages",
                r#"
                CREATE TABLE IF NOT EXISTS scheduled_messages (
                    id        TEXT PRIMARY KEY,
                    tenant_id TEXT NOT NULL,
                    thread_id TEXT NOT NULL,
                    content   TEXT NOT NULL,
                    send_at   TEXT NOT NULL,
                    status    TEXT NOT NULL DEFAULT 'pending'
                )
                "#,
            ),
            (
                "knowledge_chunks",
                r#"
                CREATE TABLE IF NOT EXISTS knowledge_chunks (
                    id           TEXT PRIMARY KEY,
                    tenant_id    TEXT NOT NULL,
                    agent_id     TEXT,
                    title        TEXT NOT NULL,
                    content      TEXT NOT NULL,
                    content_type TEXT NOT NULL DEFAULT 'article',
                    published    INTEGER NOT NULL DEFAULT 0,
                    embedding    BLOB
                )
                "#,
            ),
            (
                "agent_logs",
                r#"
                CREATE TABLE IF NOT EXISTS agent_logs (
                    id              TEXT PRIMARY KEY,
                    tenant_id       TEXT NOT NULL,
                    agent_id        TEXT NOT NULL,
                    thread_id       TEXT NOT NULL,
                    input           TEXT NOT NULL,
                    output          TEXT NOT NULL,
                    status          TEXT NOT NULL,
                    tokens_used     INTEGER NOT NULL DEFAULT 0,
                    latency_ms      INTEGER NOT NULL DEFAULT 0,
                    tools_executed  TEXT NOT NULL DEFAULT '[]',
                    fallback_reason TEXT,
                    created_at      TEXT NOT NULL
                )
                "#,
            ),
            (
                "usage_logs",
                r#"
                CREATE TABLE IF NOT EXISTS usage_logs (
                    id                TEXT PRIMARY KEY,
                    tenant_id         TEXT NOT NULL,
                    agent_id          TEXT NOT NULL,
                    model             TEXT NOT NULL,
                    prompt_tokens     INTEGER NOT NULL DEFAULT 0,
                    completion_tokens INTEGER NOT NULL DEFAULT 0,
                    latency_ms        INTEGER NOT NULL DEFAULT 0,
                    created_at        TEXT NOT NULL
                )
                "#,
            ),
            (
                "idx_thread_messages",
                "CREATE INDEX IF NOT EXISTS idx_thread_messages_thread
                 ON thread_messages(thread_id, created_at DESC)",
            ),
            (
                "idx_agent_logs",
                "CREATE INDEX IF NOT EXISTS idx_agent_logs_agent_thread
                 ON agent_logs(agent_id, thread_id, status)",
            ),
            (
                "idx_knowledge_chunks",
                "CREATE INDEX IF NOT EXISTS idx_knowledge_chunks_tenant
                 ON knowledge_chunks(tenant_id, published)",
            ),
            (
                "idx_opportunities",
                "CREATE INDEX IF NOT EXISTS idx_opportunities_contact
                 ON opportunities(contact_id, status)",
            ),
        ];

        for (name, sql) in statements {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::MigrationFailed(format!("{name}: {e}")))?;
        }

        debug!("SQLite migrations complete");
        Ok(())
    }
}

/// Serialize an embedding vector to little-endian f32 bytes.
pub(crate) fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize an embedding vector from little-endian f32 bytes.
pub(crate) fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
