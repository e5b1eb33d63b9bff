//! Minimal provider-agnostic contract for one logical call to a remote backend.
//!
//! This crate defines only the shared request/response shapes, the classified
//! failure type, and the backend traits. It excludes transport details, retry
//! scheduling, and session orchestration.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status codes that mark a remote failure as transient.
///
/// Rate limiting, gateway/server errors and the "overloaded" status.
pub const RETRYABLE_STATUS_CODES: [u16; 6] = [429, 500, 502, 503, 504, 529];

/// Error returned while constructing/configuring a backend before any call starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInitError {
    message: String,
}

impl ProviderInitError {
    /// Creates a new provider initialization error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderInitError {}

impl From<String> for ProviderInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProviderInitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Speaker of one history turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One role-tagged message in the session history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Input for one logical call: system instructions plus the ordered turns,
/// ending with the current user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendRequest {
    pub system: String,
    pub messages: Vec<Turn>,
}

/// Token counters reported by the backend for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Successful backend reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub text: String,
    pub model: String,
    pub usage: TokenCounts,
}

/// Classified remote failure.
///
/// `status` is present when the backend surfaced an HTTP-style status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub status: Option<u16>,
    pub message: String,
}

impl BackendError {
    #[must_use]
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn without_status(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// True only for statuses in [`RETRYABLE_STATUS_CODES`]. Failures without a
    /// status are never retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.status
            .is_some_and(|status| RETRYABLE_STATUS_CODES.contains(&status))
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {status}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for BackendError {}

/// Immutable metadata describing a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider_id: String,
    pub model_id: String,
}

/// Remote reasoning backend: one attempt per `complete` call.
///
/// Implementations must not retry internally; retry scheduling belongs to the
/// caller.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Returns provider/model identity metadata.
    fn profile(&self) -> ProviderProfile;

    /// Dispatches one attempt of a logical call.
    async fn complete(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError>;
}

/// Remote search backend used to augment user messages.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Runs one search and returns the backend's JSON result document.
    async fn search(&self, query: &str) -> Result<Value, BackendError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{BackendError, Role, Turn, RETRYABLE_STATUS_CODES};

    #[test]
    fn retryable_statuses_are_classified_as_transient() {
        for status in RETRYABLE_STATUS_CODES {
            assert!(BackendError::with_status(status, "x").is_retryable());
        }
    }

    #[test]
    fn client_errors_and_statusless_failures_are_fatal() {
        assert!(!BackendError::with_status(400, "bad request").is_retryable());
        assert!(!BackendError::with_status(401, "bad key").is_retryable());
        assert!(!BackendError::without_status("connection reset").is_retryable());
    }

    #[test]
    fn backend_error_display_includes_status_when_present() {
        assert_eq!(
            BackendError::with_status(529, "overloaded").to_string(),
            "HTTP 529: overloaded"
        );
        assert_eq!(
            BackendError::without_status("dns failure").to_string(),
            "dns failure"
        );
    }

    #[test]
    fn turn_serializes_with_lowercase_role() {
        let value = serde_json::to_value(Turn::user("hi")).expect("turn should serialize");
        assert_eq!(value, json!({"role": "user", "content": "hi"}));

        let parsed: Turn = serde_json::from_value(json!({"role": "assistant", "content": "ok"}))
            .expect("turn should deserialize");
        assert_eq!(parsed.role, Role::Assistant);
    }
}
