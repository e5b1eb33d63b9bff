use std::collections::BTreeMap;

use crate::config::MessagesApiConfig;
use crate::error::MessagesApiError;

pub const HEADER_API_KEY: &str = "x-api-key";
pub const HEADER_API_VERSION: &str = "anthropic-version";
pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_USER_AGENT: &str = "User-Agent";

/// Build a deterministic header map for Messages transport requests.
pub fn build_headers(
    config: &MessagesApiConfig,
    user_agent: Option<&str>,
) -> Result<BTreeMap<String, String>, MessagesApiError> {
    let mut headers = BTreeMap::new();

    let api_key = config.api_key.trim();
    if api_key.is_empty() {
        return Err(MessagesApiError::MissingApiKey);
    }

    headers.insert(HEADER_API_KEY.to_owned(), api_key.to_owned());
    headers.insert(
        HEADER_API_VERSION.to_owned(),
        config.api_version.trim().to_owned(),
    );
    headers.insert(HEADER_ACCEPT.to_owned(), "application/json".to_owned());
    headers.insert(
        HEADER_CONTENT_TYPE.to_owned(),
        "application/json".to_owned(),
    );

    let ua = match (user_agent, config.user_agent.as_deref()) {
        (Some(explicit), _) if !explicit.trim().is_empty() => explicit.trim().to_owned(),
        (None, Some(explicit)) if !explicit.trim().is_empty() => explicit.trim().to_owned(),
        _ => default_user_agent(),
    };
    headers.insert(HEADER_USER_AGENT.to_owned(), ua);

    for (key, value) in &config.extra_headers {
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    Ok(headers)
}

fn default_user_agent() -> String {
    format!(
        "project-terminal/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        normalize_arch(std::env::consts::ARCH)
    )
}

fn normalize_arch(arch: &str) -> String {
    match arch.to_ascii_lowercase().as_str() {
        "x86_64" | "amd64" => "x64".to_owned(),
        "x86" | "i386" | "i686" => "ia32".to_owned(),
        "aarch64" => "arm64".to_owned(),
        normalized => normalized.to_owned(),
    }
}
