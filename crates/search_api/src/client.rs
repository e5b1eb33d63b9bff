use reqwest::Client;

use crate::config::SearchApiConfig;
use crate::error::{parse_error_message, SearchApiError};
use crate::payload::{SearchRequest, SearchResponse};

#[derive(Debug)]
pub struct SearchApiClient {
    http: Client,
    config: SearchApiConfig,
}

impl SearchApiClient {
    pub fn new(config: SearchApiConfig) -> Result<Self, SearchApiError> {
        if config.api_key.trim().is_empty() {
            return Err(SearchApiError::MissingApiKey);
        }
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    pub fn config(&self) -> &SearchApiConfig {
        &self.config
    }

    pub fn request_for(&self, query: &str) -> Result<SearchRequest, SearchApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchApiError::EmptyQuery);
        }
        Ok(SearchRequest {
            api_key: self.config.api_key.trim().to_owned(),
            query: query.to_owned(),
            search_depth: self.config.search_depth.clone(),
            include_answer: true,
            max_results: self.config.max_results,
        })
    }

    pub async fn search(&self, query: &str) -> Result<SearchResponse, SearchApiError> {
        let request = self.request_for(query)?;
        let response = self
            .http
            .post(self.config.endpoint())
            .json(&request)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        if !(200..300).contains(&status) {
            return Err(SearchApiError::Status {
                status,
                message: parse_error_message(status, &body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
