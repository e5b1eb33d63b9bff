//! Session configuration: an optional JSON file overlaid by environment
//! variables.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::invoker::{RetryPolicy, DEFAULT_MAX_RETRIES};
use crate::usage::DEFAULT_MAX_CONTEXT_TOKENS;

pub const ENV_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_BASE_URL: &str = "ANTHROPIC_BASE_URL";
pub const ENV_SEARCH_API_KEY: &str = "TAVILY_API_KEY";
pub const ENV_MODEL: &str = "PROJECT_TERMINAL_MODEL";
pub const ENV_MAX_RETRIES: &str = "PROJECT_TERMINAL_MAX_RETRIES";
pub const ENV_INITIAL_DELAY: &str = "PROJECT_TERMINAL_INITIAL_DELAY";
pub const ENV_CONFIG_PATH: &str = "PROJECT_TERMINAL_CONFIG";

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_MAX_TOKENS: u32 = 8000;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_INITIAL_DELAY_SECS: f64 = 1.0;
pub const HISTORY_DIR_NAME: &str = "chat_history";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout_sec: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout_sec: None,
        }
    }
}

impl BackendConfig {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_sec.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay_secs: DEFAULT_INITIAL_DELAY_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub backend: BackendConfig,
    pub search: SearchConfig,
    pub retry: RetryConfig,
    pub max_context_tokens: u64,
    pub workspace_dir: Option<PathBuf>,
    pub history_dir: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            search: SearchConfig::default(),
            retry: RetryConfig::default(),
            max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
            workspace_dir: None,
            history_dir: None,
        }
    }
}

impl AgentConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// File (explicit path, else `PROJECT_TERMINAL_CONFIG`, else defaults),
    /// then environment overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = env_string_opt(ENV_CONFIG_PATH).map(PathBuf::from);
        let mut config = match path.or(from_env.as_deref()) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(env_string_opt)
    }

    /// Overlay values from `lookup`; empty values count as unset.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = lookup(ENV_API_KEY) {
            self.backend.api_key = Some(value);
        }
        if let Some(value) = lookup(ENV_BASE_URL) {
            self.backend.base_url = Some(value);
        }
        if let Some(value) = lookup(ENV_SEARCH_API_KEY) {
            self.search.api_key = Some(value);
        }
        if let Some(value) = lookup(ENV_MODEL) {
            self.backend.model = value;
        }
        if let Some(value) = lookup(ENV_MAX_RETRIES) {
            self.retry.max_retries = value.trim().parse().map_err(|_| {
                ConfigError::invalid("retry.max_retries", format!("not an integer: {value}"))
            })?;
        }
        if let Some(value) = lookup(ENV_INITIAL_DELAY) {
            self.retry.initial_delay_secs = value.trim().parse().map_err(|_| {
                ConfigError::invalid("retry.initial_delay_secs", format!("not a number: {value}"))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.model.trim().is_empty() {
            return Err(ConfigError::invalid("backend.model", "must not be empty"));
        }
        if self.backend.max_tokens == 0 {
            return Err(ConfigError::invalid("backend.max_tokens", "must be > 0"));
        }
        if !self.backend.temperature.is_finite() || self.backend.temperature < 0.0 {
            return Err(ConfigError::invalid(
                "backend.temperature",
                "must be a finite number >= 0",
            ));
        }
        if self.backend.timeout_sec == Some(0) {
            return Err(ConfigError::invalid("backend.timeout_sec", "must be > 0"));
        }
        if self.retry.max_retries == 0 {
            return Err(ConfigError::invalid("retry.max_retries", "must be >= 1"));
        }
        let delay = self.retry.initial_delay_secs;
        if !delay.is_finite() || delay < 0.0 {
            return Err(ConfigError::invalid(
                "retry.initial_delay_secs",
                "must be a finite number >= 0",
            ));
        }
        if self.max_context_tokens == 0 {
            return Err(ConfigError::invalid("max_context_tokens", "must be > 0"));
        }
        Ok(())
    }

    /// Only meaningful after [`AgentConfig::validate`] succeeded.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        let delay = Duration::try_from_secs_f64(self.retry.initial_delay_secs)
            .unwrap_or(Duration::ZERO);
        RetryPolicy::new(self.retry.max_retries, delay)
    }

    #[must_use]
    pub fn workspace_dir(&self) -> PathBuf {
        self.workspace_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    #[must_use]
    pub fn history_dir(&self) -> PathBuf {
        self.history_dir
            .clone()
            .unwrap_or_else(|| self.workspace_dir().join(HISTORY_DIR_NAME))
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}
