//! Outbound message delivery.
//!
//! Production deployments point `delivery.webhook_url` at the messaging
//! bridge; deployments without one fall back to [`LogDelivery`], which
//! only records the outbound text.

use async_trait::async_trait;
use respondo_core::{DeliveryError, MessageDelivery, SenderMeta};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookPayload<'a> {
    thread_id: &'a str,
    content: &'a str,
    agent_id: &'a str,
    agent_name: &'a str,
}

/// Posts each outbound message to a configured webhook.
pub struct WebhookDelivery {
    client: reqwest::Client,
    url: String,
}

impl WebhookDelivery {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl MessageDelivery for WebhookDelivery {
    async fn send(
        &self,
        thread_id: &str,
        content: &str,
        sender: &SenderMeta,
    ) -> Result<(), DeliveryError> {
        let payload = WebhookPayload {
            thread_id,
            content,
            agent_id: &sender.agent_id,
            agent_name: &sender.agent_name,
        };
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Failed {
                thread_id: thread_id.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(DeliveryError::Failed {
                thread_id: thread_id.to_string(),
                reason: format!("webhook returned {}", response.status()),
            });
        }
        Ok(())
    }
}

/// No transport configured: log the outbound text and succeed.
pub struct LogDelivery;

#[async_trait]
impl MessageDelivery for LogDelivery {
    async fn send(
        &self,
        thread_id: &str,
        content: &str,
        sender: &SenderMeta,
    ) -> Result<(), DeliveryError> {
        info!(
            thread_id = %thread_id,
            agent = %sender.agent_name,
            chars = content.len(),
            "outbound message (no delivery webhook configured)"
        );
        Ok(())
    }
}
