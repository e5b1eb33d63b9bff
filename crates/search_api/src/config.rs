use std::time::Duration;

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://api.tavily.com";
pub const DEFAULT_SEARCH_DEPTH: &str = "advanced";
pub const DEFAULT_MAX_RESULTS: u32 = 5;

#[derive(Debug, Clone)]
pub struct SearchApiConfig {
    pub api_key: String,
    pub base_url: String,
    /// `basic` or `advanced`.
    pub search_depth: String,
    pub max_results: u32,
    pub timeout: Option<Duration>,
}

impl Default for SearchApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_SEARCH_BASE_URL.to_owned(),
            search_depth: DEFAULT_SEARCH_DEPTH.to_owned(),
            max_results: DEFAULT_MAX_RESULTS,
            timeout: None,
        }
    }
}

impl SearchApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_search_depth(mut self, depth: impl Into<String>) -> Self {
        self.search_depth = depth.into();
        self
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Endpoint URL with a single `/search` suffix.
    pub fn endpoint(&self) -> String {
        let base = match self.base_url.trim() {
            "" => DEFAULT_SEARCH_BASE_URL,
            other => other,
        };
        let trimmed = base.trim_end_matches('/');
        if trimmed.ends_with("/search") {
            trimmed.to_owned()
        } else {
            format!("{trimmed}/search")
        }
    }
}
