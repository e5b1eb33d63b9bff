use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use crate::config::MessagesApiConfig;
use crate::error::{parse_error_message, MessagesApiError};
use crate::headers::build_headers;
use crate::payload::{MessagesRequest, MessagesResponse, RequestMessage};
use crate::url::normalize_messages_url;

#[derive(Debug)]
pub struct MessagesApiClient {
    http: Client,
    config: MessagesApiConfig,
}

impl MessagesApiClient {
    pub fn new(config: MessagesApiConfig) -> Result<Self, MessagesApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(MessagesApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &MessagesApiConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_messages_url(&self.config.base_url)
    }

    pub fn build_headers(&self, user_agent: Option<&str>) -> Result<HeaderMap, MessagesApiError> {
        let headers = build_headers(&self.config, user_agent)?;
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| MessagesApiError::InvalidHeader(format!("invalid key: {key}")))?,
                HeaderValue::from_str(&value).map_err(|_| {
                    MessagesApiError::InvalidHeader(format!("invalid value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    /// Request with configured model, budget and temperature filled in.
    pub fn request_for(
        &self,
        system: impl Into<String>,
        messages: Vec<RequestMessage>,
    ) -> MessagesRequest {
        MessagesRequest::new(&self.config.model, self.config.max_tokens, messages)
            .with_system(system)
            .with_temperature(self.config.temperature)
    }

    pub fn build_request(
        &self,
        request: &MessagesRequest,
    ) -> Result<reqwest::RequestBuilder, MessagesApiError> {
        let headers = self.build_headers(self.config.user_agent.as_deref())?;
        Ok(self
            .http
            .post(self.normalized_endpoint())
            .headers(headers)
            .json(request))
    }

    /// Perform a single attempt. Non-2xx answers surface as
    /// [`MessagesApiError::Status`] with the parsed error message.
    pub async fn send(
        &self,
        request: &MessagesRequest,
    ) -> Result<MessagesResponse, MessagesApiError> {
        let response = self.build_request(request)?.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(MessagesApiError::Status(
                status,
                parse_error_message(status, &body),
            ));
        }

        let parsed: MessagesResponse = serde_json::from_str(&body)?;
        if parsed.text().is_empty() {
            return Err(MessagesApiError::EmptyResponse);
        }
        Ok(parsed)
    }
}
