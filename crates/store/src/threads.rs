//! Threads, message history and scheduled messages.

use crate::Store;
use respondo_core::crm::{
    Direction, ScheduleStatus, ScheduledMessage, SenderKind, Thread, ThreadMessage,
};
use respondo_core::error::StoreError;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

fn map_err(query: &str) -> impl Fn(sqlx::Error) -> StoreError + '_ {
    move |e| StoreError::QueryFailed(format!("{query}: {e}"))
}

fn parse_utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn message_from_row(row: &SqliteRow) -> Result<ThreadMessage, sqlx::Error> {
    let direction: String = row.try_get("direction")?;
    let sender: String = row.try_get("sender")?;
    let created_at: String = row.try_get("created_at")?;
    Ok(ThreadMessage {
        id: row.try_get("id")?,
        thread_id: row.try_get("thread_id")?,
        direction: if direction == "outbound" {
            Direction::Outbound
        } else {
            Direction::Inbound
        },
        sender: match sender.as_str() {
            "agent" => SenderKind::Agent,
            "human" => SenderKind::Human,
            _ => SenderKind::Customer,
        },
        content: row.try_get("content")?,
        created_at: parse_utc(&created_at),
    })
}

impl Store {
    pub async fn insert_thread(&self, thread: &Thread) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO threads (id, tenant_id, contact_id, channel, needs_human, opportunity_id)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&thread.id)
        .bind(&thread.tenant_id)
        .bind(&thread.contact_id)
        .bind(&thread.channel)
        .bind(thread.needs_human)
        .bind(&thread.opportunity_id)
        .execute(self.pool())
        .await
        .map_err(map_err("insert_thread"))?;
        Ok(())
    }

    pub async fn get_thread(&self, thread_id: &str) -> Result<Thread, StoreError> {
        let row = sqlx::query("SELECT * FROM threads WHERE id = ?")
            .bind(thread_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_err("get_thread"))?
            .ok_or_else(|| StoreError::NotFound {
                entity: "thread",
                id: thread_id.to_string(),
            })?;
        Ok(Thread {
            id: row.try_get("id").map_err(map_err("get_thread"))?,
            tenant_id: row.try_get("tenant_id").map_err(map_err("get_thread"))?,
            contact_id: row.try_get("contact_id").map_err(map_err("get_thread"))?,
            channel: row.try_get("channel").map_err(map_err("get_thread"))?,
            needs_human: row.try_get("needs_human").map_err(map_err("get_thread"))?,
            opportunity_id: row
                .try_get("opportunity_id")
                .map_err(map_err("get_thread"))?,
        })
    }

    pub async fn mark_thread_needs_human(&self, thread_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE threads SET needs_human = 1 WHERE id = ?")
            .bind(thread_id)
            .execute(self.pool())
            .await
            .map_err(map_err("mark_thread_needs_human"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "thread",
                id: thread_id.to_string(),
            });
        }
        Ok(())
    }

    pub async fn insert_thread_message(&self, message: &ThreadMessage) -> Result<(), StoreError> {
        let direction = match message.direction {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        };
        let sender = match message.sender {
            SenderKind::Customer => "customer",
            SenderKind::Agent => "agent",
            SenderKind::Human => "human",
        };
        sqlx::query(
            "INSERT INTO thread_messages (id, thread_id, direction, sender, content, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.thread_id)
        .bind(direction)
        .bind(sender)
        .bind(&message.content)
        .bind(message.created_at.to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(map_err("insert_thread_message"))?;
        Ok(())
    }

    /// The last `limit` messages of a thread, returned in chronological
    /// order (oldest first).
    pub async fn recent_messages(
        &self,
        thread_id: &str,
        limit: u32,
    ) -> Result<Vec<ThreadMessage>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM thread_messages WHERE thread_id = ?
             ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(thread_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(map_err("recent_messages"))?;

        let mut messages = rows
            .iter()
            .map(message_from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(map_err("recent_messages"))?;
        messages.reverse();
        Ok(messages)
    }

    pub async fn insert_scheduled_message(
        &self,
        message: &ScheduledMessage,
    ) -> Result<(), StoreError> {
        let status = match message.status {
            ScheduleStatus::Pending => "pending",
            ScheduleStatus::Sent => "sent",
            ScheduleStatus::Cancelled => "cancelled",
        };
        sqlx::query(
            "INSERT INTO scheduled_messages (id, tenant_id, thread_id, content, send_at, status)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.tenant_id)
        .bind(&message.thread_id)
        .bind(&message.content)
        .bind(message.send_at.to_rfc3339())
        .bind(status)
        .execute(self.pool())
        .await
        .map_err(map_err("insert_scheduled_message"))?;
        Ok(())
    }

    pub async fn pending_scheduled_messages(
        &self,
        thread_id: &str,
    ) -> Result<Vec<ScheduledMessage>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM scheduled_messages WHERE thread_id = ? AND status = 'pending'",
        )
        .bind(thread_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_err("pending_scheduled_messages"))?;

        rows.iter()
            .map(|r| {
                let send_at: String = r.try_get("send_at")?;
                Ok(ScheduledMessage {
                    id: r.try_get("id")?,
                    tenant_id: r.try_get("tenant_id")?,
                    thread_id: r.try_get("thread_id")?,
                    content: r.try_get("content")?,
                    send_at: parse_utc(&send_at),
                    status: ScheduleStatus::Pending,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(map_err("pending_scheduled_messages"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn thread(id: &str) -> Thread {
        Thread {
            id: id.into(),
            tenant_id: "t-1".into(),
            contact_id: "c-1".into(),
            channel: "whatsapp".into(),
            needs_human: false,
            opportunity_id: None,
        }
    }

    fn message(id: &str, thread_id: &str, content: &str, minute: u32) -> ThreadMessage {
        ThreadMessage {
            id: id.into(),
            thread_id: thread_id.into(),
            direction: Direction::Inbound,
            sender: SenderKind::Customer,
            content: content.into(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 10, 14, minute, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn recent_messages_are_chronological_last_n() {
        let store = Store::in_memory().await.unwrap();
        store.insert_thread(&thread("th-1")).await.unwrap();
        for i in 0..5 {
            store
                .insert_thread_message(&message(&format!("m-{i}"), "th-1", &format!("msg {i}"), i))
                .await
                .unwrap();
        }
        let recent = store.recent_messages("th-1", 3).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["msg 2", "msg 3", "msg 4"]);
    }

    #[tokio::test]
    async fn needs_human_flag_persists() {
        let store = Store::in_memory().await.unwrap();
        store.insert_thread(&thread("th-1")).await.unwrap();
        store.mark_thread_needs_human("th-1").await.unwrap();
        assert!(store.get_thread("th-1").await.unwrap().needs_human);
    }

    #[tokio::test]
    async fn scheduled_message_roundtrip() {
        let store = Store::in_memory().await.unwrap();
        let scheduled = ScheduledMessage {
            id: "sm-1".into(),
            tenant_id: "t-1".into(),
            thread_id: "th-1".into(),
            content: "Oi! Podemos retomar nossa conversa?".into(),
            send_at: Utc.with_ymd_and_hms(2026, 3, 12, 9, 0, 0).unwrap(),
            status: ScheduleStatus::Pending,
        };
        store.insert_scheduled_message(&scheduled).await.unwrap();
        let pending = store.pending_scheduled_messages("th-1").await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].send_at, scheduled.send_at);
    }
}
