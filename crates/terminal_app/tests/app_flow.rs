use std::sync::Arc;
use std::time::Duration;

use agent_provider::{
    BackendError, BackendRequest, BackendResponse, ProviderProfile, ReasoningBackend,
};
use agent_provider_mock::ScriptedBackend;
use async_trait::async_trait;
use project_terminal::{RetryPolicy, Session};
use terminal_app::app::{App, Flow};
use terminal_app::commands::Command;

fn app_with(
    workspace: &std::path::Path,
    backend: Arc<dyn ReasoningBackend>,
) -> App<Vec<u8>> {
    let session =
        Session::new(backend, workspace).with_retry_policy(RetryPolicy::new(1, Duration::ZERO));
    App::new(session, Vec::new())
}

fn output(app: App<Vec<u8>>) -> String {
    String::from_utf8(app.into_output()).expect("utf-8 output")
}

#[tokio::test]
async fn scripted_session_creates_project_file_and_backs_up_on_exit() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let backend = Arc::new(ScriptedBackend::with_replies([
        "```file:create\npath: index.html\ncontent:\n<h1>Hi</h1>\n```",
    ]));
    let mut app = app_with(workspace.path(), backend);

    let input = b"project new site\nbuild a landing page\nfile list\nexit\n".as_slice();
    app.run(input).await.expect("run");

    assert_eq!(
        std::fs::read_to_string(workspace.path().join("site/index.html")).expect("file"),
        "<h1>Hi</h1>"
    );
    let text = output(app);
    assert!(text.contains("Project 'site' is now active"));
    assert!(text.contains("✓ File created successfully: index.html"));
    assert!(text.contains("index.html"));
    assert!(text.contains("Token Usage Statistics"));
    assert!(text.contains("Chat saved to:"));
    assert!(text.contains("Project backup created:"));
    assert!(text.trim_end().ends_with("Goodbye!"));

    let backups: Vec<_> = std::fs::read_dir(workspace.path())
        .expect("read workspace")
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("site_backup_"))
        .collect();
    assert_eq!(backups.len(), 1);
}

#[tokio::test]
async fn end_of_input_finalizes_like_exit() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let mut app = app_with(workspace.path(), Arc::new(ScriptedBackend::new()));

    app.run(b"hello there\n".as_slice()).await.expect("run");

    let text = output(app);
    assert!(text.contains("Mock response to: hello there"));
    assert!(text.contains("Received EOF"));
    assert!(text.contains("Chat saved to:"));
    assert!(!text.contains("Project backup created"));
}

#[tokio::test]
async fn remote_failure_is_reported_and_loop_continues() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let backend = Arc::new(ScriptedBackend::new());
    backend.push_failure(BackendError::with_status(429, "rate_limit_error"));
    let mut app = app_with(workspace.path(), backend);

    app.run(b"first\ntokens\nexit\n".as_slice())
        .await
        .expect("run");

    let text = output(app);
    assert!(text.contains(
        "Error in chat: Rate limit exceeded. Please wait a moment before trying again."
    ));
    assert!(text.contains("Token Usage Statistics"));
    assert!(!text.contains("Chat saved to:"));
}

#[tokio::test]
async fn commands_without_project_explain_themselves() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let mut app = app_with(workspace.path(), Arc::new(ScriptedBackend::new()));

    for command in [
        Command::FileList,
        Command::ProjectStructure,
        Command::ProjectBackup,
        Command::ProjectSwitch("ghost".to_string()),
        Command::Search("latest rust".to_string()),
    ] {
        assert_eq!(app.handle(command).await.expect("handle"), Flow::Continue);
    }
    assert_eq!(app.handle(Command::Exit).await.expect("handle"), Flow::Exit);

    let text = output(app);
    assert!(text.contains("No active project\n"));
    assert!(text.contains("No active project to backup"));
    assert!(text.contains("Project 'ghost' not found"));
    assert!(text.contains("no search backend configured"));
}

#[tokio::test]
async fn project_structure_renders_nested_tree() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let backend = Arc::new(ScriptedBackend::with_replies([
        "```file:create\npath: src/main.rs\ncontent:\nfn main() {}\n```\n```file:create\npath: Cargo.toml\ncontent:\n[package]\n```",
    ]));
    let mut app = app_with(workspace.path(), backend);

    app.handle(Command::ProjectNew("demo".to_string()))
        .await
        .expect("new");
    app.handle(Command::Chat("scaffold".to_string()))
        .await
        .expect("chat");
    app.handle(Command::ProjectStructure)
        .await
        .expect("structure");

    let text = output(app);
    assert!(text.contains("demo/\n  src/\n    main.rs\n  Cargo.toml\n"));
}

struct PendingBackend;

#[async_trait]
impl ReasoningBackend for PendingBackend {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: "pending".to_string(),
            model_id: "pending".to_string(),
        }
    }

    async fn complete(&self, _request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn interrupt_cancels_in_flight_turn_without_touching_history() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let mut app = app_with(workspace.path(), Arc::new(PendingBackend));
    let cancel = app.cancel_handle();

    let (flow, ()) = tokio::join!(app.handle(Command::Chat("slow".to_string())), async {
        tokio::task::yield_now().await;
        cancel.notify_waiters();
    });

    assert_eq!(flow.expect("handle"), Flow::Continue);
    assert!(app.session().history().is_empty());
    assert!(output(app).contains("Operation cancelled by user"));
}
