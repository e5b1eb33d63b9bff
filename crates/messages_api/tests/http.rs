use std::time::Duration;

use messages_api::{normalize_messages_url, MessagesApiClient, MessagesApiConfig, RequestMessage};

#[test]
fn client_constructs_from_config() {
    let config = MessagesApiConfig::new("sk-test")
        .with_model("claude-test")
        .with_max_tokens(256)
        .with_timeout(Duration::from_secs(30));
    let client = MessagesApiClient::new(config).expect("client");

    assert_eq!(client.config().model, "claude-test");
    assert_eq!(
        client.normalized_endpoint(),
        normalize_messages_url("https://api.anthropic.com")
    );
}

#[test]
fn built_request_posts_json_to_messages_endpoint() {
    let config = MessagesApiConfig::new("sk-test").with_base_url("https://proxy.test/v1");
    let client = MessagesApiClient::new(config).expect("client");
    let request = client.request_for("system text", vec![RequestMessage::new("user", "hi")]);

    assert_eq!(request.system.as_deref(), Some("system text"));
    assert_eq!(request.max_tokens, 8000);
    assert_eq!(request.temperature, Some(0.7));

    let http_request = client
        .build_request(&request)
        .expect("build request")
        .build()
        .expect("request");

    assert_eq!(http_request.method(), "POST");
    assert_eq!(http_request.url().as_str(), "https://proxy.test/v1/messages");
    assert_eq!(
        http_request
            .headers()
            .get("x-api-key")
            .and_then(|value| value.to_str().ok()),
        Some("sk-test")
    );
    let body = http_request
        .body()
        .and_then(|body| body.as_bytes())
        .expect("json body");
    let value: serde_json::Value = serde_json::from_slice(body).expect("json");
    assert_eq!(value["messages"][0]["content"], "hi");
}

#[test]
fn missing_key_fails_before_sending() {
    let client = MessagesApiClient::new(MessagesApiConfig::default()).expect("client");
    let request = client.request_for("", Vec::new());
    assert!(client.build_request(&request).is_err());
}
