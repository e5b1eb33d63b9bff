//! Deterministic mock implementations of the shared `agent_provider` contract.
//!
//! This crate contains no transport logic and is intended for local
//! development and contract-level testing. Outcomes are scripted up front and
//! consumed one per attempt; every request is recorded for later inspection.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use agent_provider::{
    BackendError, BackendRequest, BackendResponse, ProviderProfile, ReasoningBackend, Role,
    SearchBackend, TokenCounts,
};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";
pub const MOCK_MODEL_ID: &str = "mock-model";

/// Scripted reasoning backend used by session tests and offline runs.
///
/// Once the script is exhausted every call answers with an echo of the last
/// user message.
#[derive(Debug)]
pub struct ScriptedBackend {
    model_id: String,
    script: Mutex<VecDeque<Result<String, BackendError>>>,
    requests: Mutex<Vec<BackendRequest>>,
    attempts: AtomicUsize,
}

impl ScriptedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::with_model(MOCK_MODEL_ID)
    }

    #[must_use]
    pub fn with_model(model_id: impl Into<String>) -> Self {
        let model_id = model_id.into();
        let model_id = if model_id.trim().is_empty() {
            MOCK_MODEL_ID.to_string()
        } else {
            model_id.trim().to_string()
        };
        Self {
            model_id,
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Backend that answers the given replies in order.
    #[must_use]
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::new();
        for reply in replies {
            backend.push_reply(reply);
        }
        backend
    }

    pub fn push_reply(&self, text: impl Into<String>) {
        lock_unpoisoned(&self.script).push_back(Ok(text.into()));
    }

    pub fn push_failure(&self, error: BackendError) {
        lock_unpoisoned(&self.script).push_back(Err(error));
    }

    /// Number of `complete` calls observed, successful or not.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn requests(&self) -> Vec<BackendRequest> {
        lock_unpoisoned(&self.requests).clone()
    }

    #[must_use]
    pub fn last_request(&self) -> Option<BackendRequest> {
        lock_unpoisoned(&self.requests).last().cloned()
    }

    fn echo(request: &BackendRequest) -> String {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|turn| turn.role == Role::User)
            .map(|turn| turn.content.as_str())
            .unwrap_or("");
        format!("Mock response to: {last_user}")
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReasoningBackend for ScriptedBackend {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            model_id: self.model_id.clone(),
        }
    }

    async fn complete(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        self.attempts.fetch_add(1, Ordering::AcqRel);
        lock_unpoisoned(&self.requests).push(request.clone());

        let next = lock_unpoisoned(&self.script).pop_front();
        let text = match next {
            Some(outcome) => outcome?,
            None => Self::echo(request),
        };

        let input_chars: usize = request.system.len()
            + request
                .messages
                .iter()
                .map(|turn| turn.content.len())
                .sum::<usize>();

        Ok(BackendResponse {
            usage: TokenCounts {
                input_tokens: estimate_tokens(input_chars),
                output_tokens: estimate_tokens(text.len()),
            },
            text,
            model: self.model_id.clone(),
        })
    }
}

/// Scripted search backend; unscripted queries return an empty result set.
#[derive(Debug, Default)]
pub struct ScriptedSearch {
    script: Mutex<VecDeque<Result<Value, BackendError>>>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedSearch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_result(&self, value: Value) {
        lock_unpoisoned(&self.script).push_back(Ok(value));
    }

    pub fn push_failure(&self, error: BackendError) {
        lock_unpoisoned(&self.script).push_back(Err(error));
    }

    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        lock_unpoisoned(&self.queries).clone()
    }
}

#[async_trait]
impl SearchBackend for ScriptedSearch {
    async fn search(&self, query: &str) -> Result<Value, BackendError> {
        lock_unpoisoned(&self.queries).push(query.to_string());
        lock_unpoisoned(&self.script)
            .pop_front()
            .unwrap_or_else(|| Ok(json!({ "query": query, "results": [] })))
    }
}

fn estimate_tokens(chars: usize) -> u64 {
    (chars as u64).div_ceil(4)
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
