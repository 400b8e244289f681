use crate::error::InferenceError;
use crate::traits::InferenceBackend;
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 2_000;
pub const DEFAULT_MAX_JITTER_MS: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentPart {
    InlineData { mime_type: String, data: String },
    Text(String),
}

impl ContentPart {
    pub fn inline(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        ContentPart::InlineData {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text(text.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceRequest {
    pub parts: Vec<ContentPart>,
    pub schema: Value,
}

/// Bounded exponential backoff for rate-limited calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_jitter: Duration::from_millis(DEFAULT_MAX_JITTER_MS),
        }
    }
}

impl RetryPolicy {
    /// Non-jitter delay before the `retry`-th retry (1-based): `initial * 2^(retry-1)`.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.initial_delay.saturating_mul(1u32 << exponent)
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}

/// Retries rate-limited calls only.
pub struct InferenceClient<B> {
    backend: B,
    policy: RetryPolicy,
}

impl<B> InferenceClient<B>
where
    B: InferenceBackend + Send + Sync,
{
    pub fn new(backend: B, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_configured()
    }

    pub async fn generate(&self, request: &InferenceRequest) -> Result<String, InferenceError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut retry = 0u32;

        loop {
            let error = match self.backend.generate(request).await {
                Ok(text) => return Ok(text),
                Err(error) if error.is_retriable() => error,
                Err(error) => return Err(error),
            };

            retry += 1;
            if retry >= attempts {
                warn!(attempts, error = %error, "inference retries exhausted");
                return Err(InferenceError::RetriesExhausted {
                    attempts,
                    last: error.to_string(),
                });
            }

            let delay = self.policy.backoff_delay(retry) + self.policy.jitter();
            warn!(
                attempt = retry,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "rate limited, backing off"
            );
            tokio::time::sleep(delay).await;
            debug!(attempt = retry + 1, "retrying inference call");
        }
    }
}
