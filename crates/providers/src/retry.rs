//! Rate-limit retry wrapper.
//!
//! The responder retries a 429 exactly once, after a fixed delay. Every other
//! provider failure is fatal for the invocation; there is no backoff ladder.

use respondo_core::Provider;
use respondo_core::error::ProviderError;
use respondo_core::provider::{ChatRequest, ChatResponse};
use std::time::Duration;
use tracing::warn;

/// Fixed pause before the single rate-limit retry.
pub const RATE_LIMIT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Call `complete`, retrying once after [`RATE_LIMIT_RETRY_DELAY`] if the
/// provider reports a rate limit. A second 429 propagates.
pub async fn complete_with_retry(
    provider: &dyn Provider,
    request: ChatRequest,
) -> std::result::Result<ChatResponse, ProviderError> {
    match provider.complete(request.clone()).await {
        Err(ProviderError::RateLimited { .. }) => {
            warn!(provider = provider.name(), "Rate limited, retrying once");
            tokio::time::sleep(RATE_LIMIT_RETRY_DELAY).await;
            provider.complete(request).await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use respondo_core::message::ChatMessage;
    use respondo_core::provider::Usage;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyProvider {
        calls: AtomicU32,
        rate_limited_times: u32,
    }

    #[async_trait]
    impl Provider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn complete(
            &self,
            _request: ChatRequest,
        ) -> std::result::Result<ChatResponse, ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.rate_limited_times {
                return Err(ProviderError::RateLimited { retry_after_secs: 2 });
            }
            Ok(ChatResponse {
                message: ChatMessage::assistant("Olá!"),
                usage: Some(Usage::default()),
                model: "test-model".into(),
            })
        }
    }

    fn request() -> ChatRequest {
        ChatRequest::new("test-model", vec![ChatMessage::user("oi")])
    }

    #[tokio::test(start_paused = true)]
    async fn retries_once_after_rate_limit() {
        let provider = FlakyProvider { calls: AtomicU32::new(0), rate_limited_times: 1 };
        let response = complete_with_retry(&provider, request()).await.unwrap();
        assert_eq!(response.message.content, "Olá!");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn second_rate_limit_propagates() {
        let provider = FlakyProvider { calls: AtomicU32::new(0), rate_limited_times: 2 };
        let err = complete_with_retry(&provider, request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { .. }));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_rate_limit_errors_are_not_retried() {
        struct FailingProvider(AtomicU32);

        #[async_trait]
        impl Provider for FailingProvider {
            fn name(&self) -> &str {
                "failing"
            }

            async fn complete(
                &self,
                _request: ChatRequest,
            ) -> std::result::Result<ChatResponse, ProviderError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::ApiError { status_code: 500, message: "boom".into() })
            }
        }

        let provider = FailingProvider(AtomicU32::new(0));
        let err = complete_with_retry(&provider, request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::ApiError { status_code: 500, .. }));
        assert_eq!(provider.0.load(Ordering::SeqCst), 1);
    }
}
