//! Single logical call to the reasoning backend with bounded exponential
//! backoff.
//!
//! Attempt `i` (0-based) that fails with a retryable status is followed by a
//! sleep of `initial_delay * 2^i`. A non-retryable failure, or the last
//! allowed attempt failing, ends the call with a [`RemoteError`] that carries
//! the final classified [`BackendError`].

use std::time::Duration;

use agent_provider::{BackendError, BackendRequest, BackendResponse, ReasoningBackend};
use thiserror::Error;

pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Cap on attempts per logical call. Values below 1 behave as 1.
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Backoff after the failed attempt `attempt` (0-based). Saturates.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor)
    }
}

/// Fatal outcome of a logical call.
#[derive(Debug, Error)]
#[error("remote call failed after {attempts} attempt(s): {source}")]
pub struct RemoteError {
    pub attempts: u32,
    #[source]
    pub source: BackendError,
}

impl RemoteError {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.source.status
    }

    /// Short explanation suitable for the terminal.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self.source.status {
            Some(429) => "Rate limit exceeded. Please wait a moment before trying again.".to_string(),
            Some(529) => {
                "The server is currently overloaded. Please try again in a few moments.".to_string()
            }
            Some(500 | 502 | 503 | 504) => "Server error. Please try again later.".to_string(),
            Some(status) => format!("API Error ({status}): {}", self.source.message),
            None => format!("Unexpected error: {}", self.source.message),
        }
    }
}

/// Per-call bookkeeping; created fresh for every logical call.
#[derive(Debug)]
struct RetryState {
    attempt: u32,
    max_attempts: u32,
}

/// Run one logical call against `backend` under `policy`.
pub async fn invoke_with_retry<B>(
    backend: &B,
    request: &BackendRequest,
    policy: &RetryPolicy,
) -> Result<BackendResponse, RemoteError>
where
    B: ReasoningBackend + ?Sized,
{
    let mut state = RetryState {
        attempt: 0,
        max_attempts: policy.max_attempts(),
    };

    loop {
        let error = match backend.complete(request).await {
            Ok(response) => return Ok(response),
            Err(error) => error,
        };
        let attempts = state.attempt + 1;

        if !error.is_retryable() || attempts >= state.max_attempts {
            tracing::error!(
                attempts,
                status = ?error.status,
                error = %error.message,
                "remote call failed"
            );
            return Err(RemoteError {
                attempts,
                source: error,
            });
        }

        let delay = policy.delay_for(state.attempt);
        tracing::warn!(
            attempt = attempts,
            max_attempts = state.max_attempts,
            status = ?error.status,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "retryable remote failure, backing off"
        );
        tokio::time::sleep(delay).await;
        state.attempt += 1;
    }
}
