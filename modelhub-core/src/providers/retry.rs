use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 250,
            max_delay_ms: 3_000,
            jitter_ms: 100,
        }
    }
}

impl RetryPolicy {
    fn total_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    /// Exponential backoff capped at `max_delay_ms`, plus a deterministic
    /// jitter derived from the attempt number.
    fn delay(&self, attempt: usize) -> Duration {
        let shift = (attempt as u32).min(12);
        let base = self.base_delay_ms.saturating_mul(1u64 << shift);
        let capped = base.min(self.max_delay_ms.max(self.base_delay_ms));
        let jitter = match self.jitter_ms {
            0 => 0,
            jitter => (attempt as u64 * 37) % (jitter + 1),
        };
        Duration::from_millis(capped.saturating_add(jitter))
    }
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

pub fn is_retryable_transport_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// Sends `builder`, retrying 429/5xx responses and transient transport
/// failures. The final response is returned whatever its status.
pub async fn send_with_retry(
    builder: RequestBuilder,
    policy: &RetryPolicy,
    operation: &str,
) -> Result<Response> {
    let total_attempts = policy.total_attempts();
    let mut attempt = 0;

    loop {
        let request = builder.try_clone().ok_or_else(|| {
            Error::Provider(format!(
                "{operation} could not be retried because the request body is not clonable"
            ))
        })?;
        let has_budget = attempt + 1 < total_attempts;

        match request.send().await {
            Ok(response) if has_budget && is_retryable_status(response.status()) => {
                let delay = policy.delay(attempt);
                tracing::warn!(
                    operation,
                    status = %response.status(),
                    attempt,
                    total_attempts,
                    delay_ms = delay.as_millis(),
                    "retrying provider request after retryable HTTP status"
                );
                sleep(delay).await;
            }
            Ok(response) => return Ok(response),
            Err(err) if has_budget && is_retryable_transport_error(&err) => {
                let delay = policy.delay(attempt);
                tracing::warn!(
                    operation,
                    error = %err,
                    attempt,
                    total_attempts,
                    delay_ms = delay.as_millis(),
                    "retrying provider request after transport error"
                );
                sleep(delay).await;
            }
            Err(err) => {
                return Err(Error::Provider(format!(
                    "{operation} failed after {} attempt(s): {err}",
                    attempt + 1
                )));
            }
        }

        attempt += 1;
    }
}
