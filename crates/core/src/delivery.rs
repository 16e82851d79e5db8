//! Message delivery collaborator interface.
//!
//! The transport (WhatsApp, SMS, ...) is out of scope; the responder only
//! knows this trait. Used for both the out-of-hours auto-reply and the final
//! agent response.

use crate::error::DeliveryError;
use async_trait::async_trait;

/// Who a delivered message is attributed to.
#[derive(Debug, Clone)]
pub struct SenderMeta {
    pub agent_id: String,
    pub agent_name: String,
}

#[async_trait]
pub trait MessageDelivery: Send + Sync {
    /// Deliver `content` to the customer on `thread_id`.
    async fn send(
        &self,
        thread_id: &str,
        content: &str,
        sender: &SenderMeta,
    ) -> std::result::Result<(), DeliveryError>;
}
