use messages_api::normalize_messages_url;

#[test]
fn normalize_keeps_full_messages_path() {
    assert_eq!(
        normalize_messages_url("https://api.anthropic.com/v1/messages"),
        "https://api.anthropic.com/v1/messages"
    );
}

#[test]
fn normalize_appends_messages_to_version_root() {
    assert_eq!(
        normalize_messages_url("https://proxy.internal/v1/"),
        "https://proxy.internal/v1/messages"
    );
}

#[test]
fn normalize_appends_full_path_to_bare_host() {
    assert_eq!(
        normalize_messages_url("http://127.0.0.1:8080"),
        "http://127.0.0.1:8080/v1/messages"
    );
}

#[test]
fn normalize_uses_default_for_blank_input() {
    assert_eq!(
        normalize_messages_url("   "),
        "https://api.anthropic.com/v1/messages"
    );
}
