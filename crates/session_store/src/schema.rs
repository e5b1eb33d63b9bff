use std::path::PathBuf;

use agent_provider::Turn;
use serde::{Deserialize, Serialize};

/// On-disk chat log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLogRecord {
    pub project: Option<String>,
    pub timestamp: String,
    pub history: Vec<Turn>,
}

/// One row of `ChatLogStore::list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLogSummary {
    pub file: PathBuf,
    pub project: Option<String>,
    pub timestamp: String,
    pub messages: usize,
}
