//! Agent-control core for a terminal design assistant.
//!
//! Invariant: generated text only reaches the filesystem through
//! [`execute_operations`], and every path it names passes [`sandbox::normalize`]
//! first.
//!
//! # Public API Overview
//! - Extract fenced file operations from response text with [`parse_operations`].
//! - Apply them to a [`ProjectStore`] and get the annotated text back via
//!   [`execute_operations`].
//! - Call a [`agent_provider::ReasoningBackend`] under a [`RetryPolicy`] with
//!   [`invoke_with_retry`].
//! - Drive complete turns, project switching and persistence through a
//!   [`Session`].

pub mod backup;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod invoker;
pub mod logging;
pub mod operations;
pub mod project;
pub mod sandbox;
pub mod session;
pub mod usage;

/// Error types shared by file operations and configuration.
pub use crate::error::{ConfigError, OperationError};

/// Path confinement.
pub use crate::sandbox::{normalize, SandboxedPath};

/// Project tree and its snapshot.
pub use crate::project::{DirectoryEntry, FileEntry, ProjectStore};

/// Operation block grammar.
pub use crate::operations::{parse_operations, FileOperation, OperationBlock, OperationKind};

/// Batch application and annotation.
pub use crate::executor::{
    execute_operations, failure_annotation, success_annotation, ExecutionReport, OperationOutcome,
};

/// Retry policy and fatal remote failures.
pub use crate::invoker::{invoke_with_retry, RemoteError, RetryPolicy};

/// Request assembly and search gating.
pub use crate::context::{should_search, ContextAssembler, SEARCH_TRIGGERS};

/// Token accounting.
pub use crate::usage::{TokenUsage, UsageReport, UsageRow};

/// Configuration.
pub use crate::config::AgentConfig;

/// Project backups.
pub use crate::backup::{backup_project, BackupError};

/// Session context.
pub use crate::session::{FinalizeReport, ProjectListing, Session, SessionError, TurnOutcome};
