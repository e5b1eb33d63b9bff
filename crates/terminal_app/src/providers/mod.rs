use std::sync::Arc;

use agent_provider::{ProviderInitError, ReasoningBackend, SearchBackend};
use agent_provider_http::{
    MessagesBackend, MessagesProviderConfig, WebSearchBackend, MESSAGES_PROVIDER_ID,
};
use agent_provider_mock::{ScriptedBackend, MOCK_PROVIDER_ID};
use project_terminal::AgentConfig;
use search_api::SearchApiConfig;

pub const DEFAULT_PROVIDER_ID: &str = MESSAGES_PROVIDER_ID;

pub fn provider_for_id(
    provider_id: &str,
    config: &AgentConfig,
) -> Result<Arc<dyn ReasoningBackend>, ProviderInitError> {
    match provider_id.trim() {
        MESSAGES_PROVIDER_ID => {
            let backend = &config.backend;
            let api_key = backend.api_key.clone().ok_or_else(|| {
                ProviderInitError::new(
                    "Failed to initialize anthropic provider: set ANTHROPIC_API_KEY or backend.api_key",
                )
            })?;
            let mut provider = MessagesProviderConfig::new(api_key, &backend.model)
                .with_max_tokens(backend.max_tokens)
                .with_temperature(Some(backend.temperature));
            if let Some(base_url) = &backend.base_url {
                provider = provider.with_base_url(base_url);
            }
            if let Some(timeout) = backend.timeout() {
                provider = provider.with_timeout(timeout);
            }
            Ok(Arc::new(MessagesBackend::new(provider)?))
        }
        MOCK_PROVIDER_ID => Ok(Arc::new(ScriptedBackend::with_model(&config.backend.model))),
        unknown => Err(ProviderInitError::new(format!(
            "Unsupported provider '{unknown}'. Available providers: {MESSAGES_PROVIDER_ID}, {MOCK_PROVIDER_ID}"
        ))),
    }
}

/// Search backend when a key is configured; searching is optional.
pub fn search_backend(
    config: &AgentConfig,
) -> Result<Option<Arc<dyn SearchBackend>>, ProviderInitError> {
    let Some(api_key) = config.search.api_key.clone() else {
        return Ok(None);
    };
    let mut search = SearchApiConfig::new(api_key);
    if let Some(base_url) = &config.search.base_url {
        search = search.with_base_url(base_url);
    }
    if let Some(timeout) = config.backend.timeout() {
        search = search.with_timeout(timeout);
    }
    Ok(Some(Arc::new(WebSearchBackend::new(search)?)))
}
