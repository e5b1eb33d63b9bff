use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchApiError {
    #[error("search API key is required")]
    MissingApiKey,
    #[error("search query is empty")]
    EmptyQuery,
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("search HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("search response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SearchApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Request(error) => error.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

/// Pull `detail.error`, `detail`, or `error` out of an error body.
pub(crate) fn parse_error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let candidates = [
            value.pointer("/detail/error"),
            value.get("detail"),
            value.get("error"),
        ];
        for candidate in candidates.into_iter().flatten() {
            if let Some(text) = candidate.as_str().filter(|text| !text.trim().is_empty()) {
                return text.to_owned();
            }
        }
    }

    if body.trim().is_empty() {
        format!("request failed with status {status}")
    } else {
        body.to_owned()
    }
}
