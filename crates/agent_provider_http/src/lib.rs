//! HTTP-backed implementations of the shared `agent_provider` contract.
//!
//! [`MessagesBackend`] translates `messages_api` exchanges into
//! [`BackendResponse`]/[`BackendError`] values; [`WebSearchBackend`] does the
//! same for `search_api`. Neither retries: one call, one attempt.

use std::sync::Arc;
use std::time::Duration;

use agent_provider::{
    BackendError, BackendRequest, BackendResponse, ProviderInitError, ProviderProfile,
    ReasoningBackend, SearchBackend, TokenCounts,
};
use async_trait::async_trait;
use messages_api::{
    MessagesApiClient, MessagesApiConfig, MessagesApiError, MessagesRequest, MessagesResponse,
    RequestMessage,
};
use search_api::{SearchApiClient, SearchApiConfig, SearchApiError, SearchResponse};
use serde_json::Value;

/// Stable provider identifier used by startup selection.
pub const MESSAGES_PROVIDER_ID: &str = "anthropic";

/// Runtime configuration for the Messages provider.
#[derive(Debug, Clone, PartialEq)]
pub struct MessagesProviderConfig {
    pub api_key: String,
    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
}

impl MessagesProviderConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_id: model_id.into(),
            max_tokens: messages_api::config::DEFAULT_MAX_TOKENS,
            temperature: Some(messages_api::config::DEFAULT_TEMPERATURE),
            base_url: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_messages_api_config(self) -> MessagesApiConfig {
        let mut config = MessagesApiConfig::new(self.api_key)
            .with_model(sanitize_model_id(&self.model_id))
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

#[async_trait]
trait MessagesTransport: Send + Sync {
    fn model(&self) -> String;
    fn request_for(&self, system: &str, messages: Vec<RequestMessage>) -> MessagesRequest;
    async fn send(&self, request: &MessagesRequest) -> Result<MessagesResponse, MessagesApiError>;
}

#[async_trait]
impl MessagesTransport for MessagesApiClient {
    fn model(&self) -> String {
        self.config().model.clone()
    }

    fn request_for(&self, system: &str, messages: Vec<RequestMessage>) -> MessagesRequest {
        MessagesApiClient::request_for(self, system, messages)
    }

    async fn send(&self, request: &MessagesRequest) -> Result<MessagesResponse, MessagesApiError> {
        MessagesApiClient::send(self, request).await
    }
}

/// `ReasoningBackend` adapter backed by `messages_api` transport primitives.
pub struct MessagesBackend {
    transport: Arc<dyn MessagesTransport>,
}

impl MessagesBackend {
    /// Creates a backend using real Messages API transport.
    pub fn new(config: MessagesProviderConfig) -> Result<Self, ProviderInitError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderInitError::new(
                "Failed to initialize anthropic provider: API key is required",
            ));
        }
        let client =
            MessagesApiClient::new(config.into_messages_api_config()).map_err(map_init_error)?;
        Ok(Self {
            transport: Arc::new(client),
        })
    }

    #[cfg(test)]
    fn with_transport_for_tests(transport: Arc<dyn MessagesTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ReasoningBackend for MessagesBackend {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MESSAGES_PROVIDER_ID.to_string(),
            model_id: self.transport.model(),
        }
    }

    async fn complete(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        let messages = request
            .messages
            .iter()
            .map(|turn| RequestMessage::new(turn.role.as_str(), turn.content.as_str()))
            .collect();
        let payload = self.transport.request_for(&request.system, messages);
        tracing::debug!(
            model = %payload.model,
            messages = payload.messages.len(),
            "sending messages request"
        );

        let response = self
            .transport
            .send(&payload)
            .await
            .map_err(map_messages_error)?;

        let model = if response.model.trim().is_empty() {
            payload.model
        } else {
            response.model.clone()
        };

        Ok(BackendResponse {
            text: response.text(),
            model,
            usage: TokenCounts {
                input_tokens: response.usage.input_tokens,
                output_tokens: response.usage.output_tokens,
            },
        })
    }
}

#[async_trait]
trait SearchTransport: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchResponse, SearchApiError>;
}

#[async_trait]
impl SearchTransport for SearchApiClient {
    async fn search(&self, query: &str) -> Result<SearchResponse, SearchApiError> {
        SearchApiClient::search(self, query).await
    }
}

/// `SearchBackend` adapter backed by `search_api`.
pub struct WebSearchBackend {
    transport: Arc<dyn SearchTransport>,
}

impl WebSearchBackend {
    pub fn new(config: SearchApiConfig) -> Result<Self, ProviderInitError> {
        let client = SearchApiClient::new(config).map_err(|error| {
            ProviderInitError::new(format!("Failed to initialize search provider: {error}"))
        })?;
        Ok(Self {
            transport: Arc::new(client),
        })
    }

    #[cfg(test)]
    fn with_transport_for_tests(transport: Arc<dyn SearchTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl SearchBackend for WebSearchBackend {
    async fn search(&self, query: &str) -> Result<Value, BackendError> {
        let response = self.transport.search(query).await.map_err(|error| {
            let message = error.to_string();
            match error.status() {
                Some(status) => BackendError::with_status(status, message),
                None => BackendError::without_status(message),
            }
        })?;
        serde_json::to_value(response)
            .map_err(|error| BackendError::without_status(format!("search result: {error}")))
    }
}

fn map_messages_error(error: MessagesApiError) -> BackendError {
    match error.status() {
        Some(status) => BackendError::with_status(status, error.message()),
        None => BackendError::without_status(error.to_string()),
    }
}

fn sanitize_model_id(model_id: &str) -> String {
    let trimmed = model_id.trim();
    if trimmed.is_empty() {
        messages_api::config::DEFAULT_MODEL.to_string()
    } else {
        trimmed.to_string()
    }
}

fn map_init_error(error: MessagesApiError) -> ProviderInitError {
    ProviderInitError::new(format!("Failed to initialize anthropic provider: {error}"))
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, MutexGuard};

    use agent_provider::Turn;
    use messages_api::{ContentBlock, Usage};

    use super::*;

    fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        match mutex.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    struct FakeTransport {
        observed: Mutex<Option<MessagesRequest>>,
        outcome: Mutex<Option<Result<MessagesResponse, MessagesApiError>>>,
    }

    impl FakeTransport {
        fn new(outcome: Result<MessagesResponse, MessagesApiError>) -> Arc<Self> {
            Arc::new(Self {
                observed: Mutex::new(None),
                outcome: Mutex::new(Some(outcome)),
            })
        }

        fn observed(&self) -> Option<MessagesRequest> {
            lock_unpoisoned(&self.observed).clone()
        }
    }

    #[async_trait]
    impl MessagesTransport for FakeTransport {
        fn model(&self) -> String {
            "claude-test".to_string()
        }

        fn request_for(&self, system: &str, messages: Vec<RequestMessage>) -> MessagesRequest {
            MessagesRequest::new("claude-test", 100, messages).with_system(system)
        }

        async fn send(
            &self,
            request: &MessagesRequest,
        ) -> Result<MessagesResponse, MessagesApiError> {
            *lock_unpoisoned(&self.observed) = Some(request.clone());
            lock_unpoisoned(&self.outcome)
                .take()
                .expect("fake outcome should be consumed exactly once")
        }
    }

    fn reply(text: &str) -> MessagesResponse {
        MessagesResponse {
            id: "msg".to_string(),
            model: String::new(),
            content: vec![ContentBlock::Text {
                text: text.to_string(),
            }],
            stop_reason: Some("end_turn".to_string()),
            usage: Usage {
                input_tokens: 11,
                output_tokens: 4,
            },
        }
    }

    fn request() -> BackendRequest {
        BackendRequest {
            system: "system prompt".to_string(),
            messages: vec![
                Turn::user("first"),
                Turn::assistant("answer"),
                Turn::user("second"),
            ],
        }
    }

    #[tokio::test]
    async fn complete_maps_turns_and_usage() {
        let transport = FakeTransport::new(Ok(reply("done")));
        let backend = MessagesBackend::with_transport_for_tests(
            Arc::clone(&transport) as Arc<dyn MessagesTransport>
        );

        let response = backend.complete(&request()).await.expect("response");

        assert_eq!(response.text, "done");
        assert_eq!(response.model, "claude-test");
        assert_eq!(response.usage.input_tokens, 11);
        assert_eq!(response.usage.output_tokens, 4);

        let observed = transport.observed().expect("request observed");
        assert_eq!(observed.system.as_deref(), Some("system prompt"));
        let roles: Vec<&str> = observed.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
    }

    #[tokio::test]
    async fn status_errors_keep_their_code() {
        let transport = FakeTransport::new(Err(MessagesApiError::Status(
            messages_api::StatusCode::from_u16(529).expect("status"),
            "Overloaded".to_string(),
        )));
        let backend = MessagesBackend::with_transport_for_tests(transport);

        let error = backend.complete(&request()).await.expect_err("failure");
        assert_eq!(error.status, Some(529));
        assert_eq!(error.message, "Overloaded");
        assert!(error.is_retryable());
    }

    #[tokio::test]
    async fn transport_errors_without_status_are_fatal() {
        let transport = FakeTransport::new(Err(MessagesApiError::EmptyResponse));
        let backend = MessagesBackend::with_transport_for_tests(transport);

        let error = backend.complete(&request()).await.expect_err("failure");
        assert_eq!(error.status, None);
        assert!(!error.is_retryable());
    }

    #[test]
    fn profile_reports_provider_and_model() {
        let backend = MessagesBackend::with_transport_for_tests(FakeTransport::new(Ok(reply(""))));
        let profile = backend.profile();
        assert_eq!(profile.provider_id, MESSAGES_PROVIDER_ID);
        assert_eq!(profile.model_id, "claude-test");
    }

    #[test]
    fn blank_api_key_fails_initialization() {
        let error = MessagesBackend::new(MessagesProviderConfig::new(" ", "m"))
            .err()
            .expect("init should fail");
        assert!(error.message().contains("API key is required"));
    }

    #[test]
    fn blank_model_falls_back_to_default() {
        let config = MessagesProviderConfig::new("sk", "  ").into_messages_api_config();
        assert_eq!(config.model, messages_api::config::DEFAULT_MODEL);
    }

    struct FakeSearch(Mutex<Option<Result<SearchResponse, SearchApiError>>>);

    #[async_trait]
    impl SearchTransport for FakeSearch {
        async fn search(&self, _query: &str) -> Result<SearchResponse, SearchApiError> {
            lock_unpoisoned(&self.0)
                .take()
                .expect("fake outcome should be consumed exactly once")
        }
    }

    #[tokio::test]
    async fn search_results_become_json() {
        let backend = WebSearchBackend::with_transport_for_tests(Arc::new(FakeSearch(
            Mutex::new(Some(Ok(SearchResponse {
                query: "q".to_string(),
                answer: Some("forty-two".to_string()),
                results: Vec::new(),
            }))),
        )));

        let value = backend.search("q").await.expect("json");
        assert_eq!(value["answer"], "forty-two");
    }

    #[tokio::test]
    async fn search_status_errors_are_mapped() {
        let backend = WebSearchBackend::with_transport_for_tests(Arc::new(FakeSearch(
            Mutex::new(Some(Err(SearchApiError::Status {
                status: 401,
                message: "Invalid API key".to_string(),
            }))),
        )));

        let error = backend.search("q").await.expect_err("failure");
        assert_eq!(error.status, Some(401));
        assert!(error.message.contains("Invalid API key"));
    }
}
