//! The explicit session context: active project, turn history, usage
//! counters and the collaborators a turn needs.
//!
//! Everything a command touches is reached through a [`Session`]; there is no
//! process-wide state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use agent_provider::{BackendError, ReasoningBackend, SearchBackend, TokenCounts, Turn};
use serde_json::Value;
use session_store::{ChatLogError, ChatLogStore, ChatLogSummary};
use thiserror::Error;

use crate::backup::{self, BackupError};
use crate::config::AgentConfig;
use crate::context::{augment_with_results, should_search, ContextAssembler};
use crate::error::OperationError;
use crate::executor::{execute_operations, OperationOutcome};
use crate::invoker::{invoke_with_retry, RemoteError, RetryPolicy};
use crate::project::ProjectStore;
use crate::usage::{TokenUsage, UsageReport, DEFAULT_MAX_CONTEXT_TOKENS};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid project name: {name:?}")]
    InvalidProjectName { name: String },

    #[error("project not found: {name}")]
    ProjectNotFound { name: String },

    #[error("No active project selected")]
    NoActiveProject,

    #[error("no search backend configured")]
    SearchUnavailable,

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("search failed: {0}")]
    Search(#[source] BackendError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    ChatLog(#[from] ChatLogError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error("failed to list {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("background task failed: {0}")]
    Join(String),
}

impl SessionError {
    /// Terminal-facing text; remote failures use their friendly form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote(error) => error.user_message(),
            other => other.to_string(),
        }
    }
}

/// Result of one completed chat turn.
#[derive(Debug)]
pub struct TurnOutcome {
    /// Response text with every operation block replaced by its annotation.
    pub response: String,
    pub model: String,
    pub outcomes: Vec<OperationOutcome>,
    pub usage: TokenCounts,
}

/// One directory in the workspace that can be opened as a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectListing {
    pub name: String,
    pub active: bool,
}

/// What the shutdown step did. `None` means the step had nothing to do.
#[derive(Debug, Default)]
pub struct FinalizeReport {
    pub chat_log: Option<Result<PathBuf, SessionError>>,
    pub backup: Option<Result<PathBuf, SessionError>>,
}

pub struct Session {
    project: Option<ProjectStore>,
    history: Vec<Turn>,
    usage: TokenUsage,
    chat_logs: ChatLogStore,
    backend: Arc<dyn ReasoningBackend>,
    search: Option<Arc<dyn SearchBackend>>,
    assembler: ContextAssembler,
    retry: RetryPolicy,
    workspace: PathBuf,
    max_context_tokens: u64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("project", &self.project.as_ref().map(ProjectStore::name))
            .field("history_len", &self.history.len())
            .field("usage", &self.usage)
            .field("backend", &self.backend.profile())
            .field("search", &self.search.is_some())
            .field("workspace", &self.workspace)
            .finish()
    }
}

impl Session {
    /// Session over `workspace` with chat logs under `<workspace>/chat_history`.
    pub fn new(backend: Arc<dyn ReasoningBackend>, workspace: impl Into<PathBuf>) -> Self {
        let workspace = workspace.into();
        let chat_logs = ChatLogStore::new(workspace.join(crate::config::HISTORY_DIR_NAME));
        Self {
            project: None,
            history: Vec::new(),
            usage: TokenUsage::default(),
            chat_logs,
            backend,
            search: None,
            assembler: ContextAssembler::default(),
            retry: RetryPolicy::default(),
            workspace,
            max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
        }
    }

    /// Session wired from a validated [`AgentConfig`].
    pub fn from_config(
        config: &AgentConfig,
        backend: Arc<dyn ReasoningBackend>,
        search: Option<Arc<dyn SearchBackend>>,
    ) -> Self {
        let mut session = Self::new(backend, config.workspace_dir())
            .with_chat_logs(ChatLogStore::new(config.history_dir()))
            .with_retry_policy(config.retry_policy())
            .with_max_context_tokens(config.max_context_tokens);
        session.search = search;
        session
    }

    #[must_use]
    pub fn with_search(mut self, search: Arc<dyn SearchBackend>) -> Self {
        self.search = Some(search);
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_assembler(mut self, assembler: ContextAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    #[must_use]
    pub fn with_chat_logs(mut self, chat_logs: ChatLogStore) -> Self {
        self.chat_logs = chat_logs;
        self
    }

    #[must_use]
    pub fn with_max_context_tokens(mut self, max_context_tokens: u64) -> Self {
        self.max_context_tokens = max_context_tokens;
        self
    }

    pub fn project(&self) -> Option<&ProjectStore> {
        self.project.as_ref()
    }

    pub fn project_mut(&mut self) -> Option<&mut ProjectStore> {
        self.project.as_mut()
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn backend(&self) -> &dyn ReasoningBackend {
        self.backend.as_ref()
    }

    /// Create (if needed) and activate `<workspace>/<name>`. Replaces the
    /// history with the newest saved chat for the project, if any, and
    /// returns whether that happened.
    pub async fn init_project(&mut self, name: &str) -> Result<bool, SessionError> {
        let name = validate_project_name(name)?;
        let root = self.workspace.join(&name);
        self.activate(name, root).await
    }

    /// Activate an existing project; fails when its directory is missing.
    pub async fn switch_project(&mut self, name: &str) -> Result<bool, SessionError> {
        let name = validate_project_name(name)?;
        let root = self.workspace.join(&name);
        let is_dir = tokio::fs::metadata(&root)
            .await
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(SessionError::ProjectNotFound { name });
        }
        self.activate(name, root).await
    }

    async fn activate(&mut self, name: String, root: PathBuf) -> Result<bool, SessionError> {
        let store = ProjectStore::open(name.clone(), root).await?;

        let chat_logs = self.chat_logs.clone();
        let project = name.clone();
        let restored = run_blocking(move || chat_logs.load_recent(Some(&project))).await??;

        tracing::info!(project = %name, restored = restored.len(), "project activated");
        self.project = Some(store);
        if restored.is_empty() {
            return Ok(false);
        }
        self.history = restored;
        Ok(true)
    }

    /// Sorted project directories in the workspace. Hidden directories and
    /// the chat history directory are skipped.
    pub async fn list_projects(&self) -> Result<Vec<ProjectListing>, SessionError> {
        let workspace_error = |source: std::io::Error| SessionError::Workspace {
            path: self.workspace.clone(),
            source,
        };
        let mut entries = match tokio::fs::read_dir(&self.workspace).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(workspace_error(error)),
        };

        let history_dir = self.chat_logs.root();
        let active = self.project.as_ref().map(ProjectStore::name);
        let mut projects = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(workspace_error)? {
            let is_dir = entry
                .file_type()
                .await
                .map(|kind| kind.is_dir())
                .unwrap_or(false);
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_dir || name.starts_with('.') || same_dir(&entry.path(), history_dir) {
                continue;
            }
            projects.push(ProjectListing {
                active: active == Some(name.as_str()),
                name,
            });
        }
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    /// One full turn: assemble, call with retry, apply operation blocks,
    /// record usage and append both turns. A fatal remote failure leaves the
    /// history untouched.
    pub async fn chat(&mut self, user_text: &str) -> Result<TurnOutcome, SessionError> {
        let message = self.maybe_augment(user_text).await;
        let request = self
            .assembler
            .assemble(self.project.as_ref(), &self.history, &message);

        let response = invoke_with_retry(self.backend.as_ref(), &request, &self.retry).await?;

        let report = execute_operations(self.project.as_mut(), &response.text).await;
        self.usage.record(response.usage);
        self.history.push(Turn::user(message));
        self.history.push(Turn::assistant(report.rewritten.clone()));

        Ok(TurnOutcome {
            response: report.rewritten,
            model: response.model,
            outcomes: report.outcomes,
            usage: response.usage,
        })
    }

    async fn maybe_augment(&self, user_text: &str) -> String {
        let Some(search) = self.search.as_ref() else {
            return user_text.to_string();
        };
        if !should_search(user_text) {
            return user_text.to_string();
        }
        match search.search(user_text).await {
            Ok(results) => augment_with_results(user_text, &results),
            Err(error) => {
                tracing::warn!(%error, "search augmentation failed, continuing without it");
                user_text.to_string()
            }
        }
    }

    /// Direct search call for the `search` command.
    pub async fn search(&self, query: &str) -> Result<Value, SessionError> {
        let search = self.search.as_ref().ok_or(SessionError::SearchUnavailable)?;
        search.search(query).await.map_err(SessionError::Search)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn reset_usage(&mut self) {
        self.usage.reset();
    }

    pub fn usage_report(&self) -> UsageReport {
        self.usage.report(self.max_context_tokens)
    }

    pub async fn save_chat(&self) -> Result<PathBuf, SessionError> {
        let chat_logs = self.chat_logs.clone();
        let project = self.project.as_ref().map(|p| p.name().to_string());
        let history = self.history.clone();
        let path = run_blocking(move || chat_logs.save(project.as_deref(), &history)).await??;
        tracing::info!(path = %path.display(), "chat history saved");
        Ok(path)
    }

    pub async fn list_chats(&self) -> Result<Vec<ChatLogSummary>, SessionError> {
        let chat_logs = self.chat_logs.clone();
        let project = self.project.as_ref().map(|p| p.name().to_string());
        Ok(run_blocking(move || chat_logs.list(project.as_deref())).await??)
    }

    pub async fn backup_project(&self) -> Result<PathBuf, SessionError> {
        let project = self.project.as_ref().ok_or(SessionError::NoActiveProject)?;
        Ok(backup::backup_project(project.root(), project.name(), &self.workspace).await?)
    }

    /// Shutdown step: save a non-empty history, then back up the active
    /// project. Each step runs even if the other failed.
    pub async fn finalize(&self) -> FinalizeReport {
        let mut report = FinalizeReport::default();
        if !self.history.is_empty() {
            report.chat_log = Some(self.save_chat().await);
        }
        if self.project.is_some() {
            report.backup = Some(self.backup_project().await);
        }
        report
    }
}

fn validate_project_name(name: &str) -> Result<String, SessionError> {
    let trimmed = name.trim();
    let invalid = trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.starts_with('.')
        || trimmed.contains(['/', '\\', '\0', ':']);
    if invalid {
        return Err(SessionError::InvalidProjectName {
            name: name.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

async fn run_blocking<T, F>(job: F) -> Result<T, SessionError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|error| SessionError::Join(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_names_are_single_segments() {
        assert_eq!(validate_project_name(" demo ").expect("valid"), "demo");
        for bad in ["", "  ", ".", "..", "a/b", "a\\b", ".hidden", "c:x"] {
            assert!(
                matches!(
                    validate_project_name(bad),
                    Err(SessionError::InvalidProjectName { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn remote_errors_use_friendly_text() {
        let error = SessionError::Remote(RemoteError {
            attempts: 5,
            source: BackendError::with_status(529, "overloaded_error"),
        });
        assert!(error.user_message().contains("overloaded"));
        assert_eq!(
            SessionError::NoActiveProject.user_message(),
            "No active project selected"
        );
    }
}
