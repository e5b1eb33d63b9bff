use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use agent_provider::Turn;
use time::OffsetDateTime;

use crate::error::ChatLogError;
use crate::paths::{chat_file_name, chat_stamp, parse_chat_file_name, MARKDOWN_EXTENSION};
use crate::render::render_markdown;
use crate::schema::{ChatLogRecord, ChatLogSummary};

/// Filesystem chat log store rooted at a history directory.
///
/// Project-less logs live directly under the root; project logs live under
/// `<root>/<project>/`.
#[derive(Debug, Clone)]
pub struct ChatLogStore {
    root: PathBuf,
}

impl ChatLogStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save `history` stamped with the current local time.
    pub fn save(&self, project: Option<&str>, history: &[Turn]) -> Result<PathBuf, ChatLogError> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        self.save_at(project, history, now)
    }

    /// Save `history` with an explicit timestamp. Returns the JSON file path.
    pub fn save_at(
        &self,
        project: Option<&str>,
        history: &[Turn],
        at: OffsetDateTime,
    ) -> Result<PathBuf, ChatLogError> {
        let dir = self.dir_for(project)?;
        fs::create_dir_all(&dir)
            .map_err(|source| ChatLogError::io("creating chat history directory", &dir, source))?;

        let stamp = chat_stamp(at)?;
        let record = ChatLogRecord {
            project: project.map(str::to_string),
            timestamp: stamp.clone(),
            history: history.to_vec(),
        };

        let mut collision = 0;
        let path = loop {
            let candidate = dir.join(chat_file_name(&stamp, collision));
            if !candidate.exists() {
                break candidate;
            }
            collision += 1;
        };

        let json = serde_json::to_string_pretty(&record)
            .map_err(|source| ChatLogError::json_serialize(&path, source))?;
        fs::write(&path, json)
            .map_err(|source| ChatLogError::io("writing chat log", &path, source))?;

        let markdown_path = path.with_extension(MARKDOWN_EXTENSION);
        fs::write(&markdown_path, render_markdown(&record)).map_err(|source| {
            ChatLogError::io("writing chat log markdown", &markdown_path, source)
        })?;

        tracing::debug!(path = %path.display(), turns = history.len(), "chat log saved");
        Ok(path)
    }

    pub fn load(&self, path: &Path) -> Result<ChatLogRecord, ChatLogError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ChatLogError::io("reading chat log", path, source))?;
        serde_json::from_str(&text).map_err(|source| ChatLogError::json_parse(path, source))
    }

    /// History of the newest log for `project`; empty when there is none or
    /// the newest file cannot be parsed.
    pub fn load_recent(&self, project: Option<&str>) -> Result<Vec<Turn>, ChatLogError> {
        let Some(latest) = self.chat_files(project)?.pop() else {
            return Ok(Vec::new());
        };

        match self.load(&latest) {
            Ok(record) => Ok(record.history),
            Err(error) => {
                tracing::warn!(%error, "ignoring unreadable chat log");
                Ok(Vec::new())
            }
        }
    }

    /// Summaries of every readable log for `project`, newest first.
    pub fn list(&self, project: Option<&str>) -> Result<Vec<ChatLogSummary>, ChatLogError> {
        let mut summaries = Vec::new();
        for file in self.chat_files(project)?.into_iter().rev() {
            match self.load(&file) {
                Ok(record) => summaries.push(ChatLogSummary {
                    file,
                    project: record.project,
                    timestamp: record.timestamp,
                    messages: record.history.len(),
                }),
                Err(error) => tracing::warn!(%error, "skipping unreadable chat log"),
            }
        }
        summaries.sort_by(|left, right| right.timestamp.cmp(&left.timestamp));
        Ok(summaries)
    }

    fn dir_for(&self, project: Option<&str>) -> Result<PathBuf, ChatLogError> {
        match project {
            None => Ok(self.root.clone()),
            Some(name) if is_plain_segment(name) => Ok(self.root.join(name)),
            Some(name) => Err(ChatLogError::InvalidProjectName {
                name: name.to_string(),
            }),
        }
    }

    /// Chat log files for `project`, oldest first.
    fn chat_files(&self, project: Option<&str>) -> Result<Vec<PathBuf>, ChatLogError> {
        let dir = self.dir_for(project)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ChatLogError::io("listing chat history", &dir, source));
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|source| ChatLogError::io("listing chat history", &dir, source))?;
            let name = entry.file_name();
            let Some(key) = name.to_str().and_then(parse_chat_file_name) else {
                continue;
            };
            if entry.path().is_file() {
                files.push((key, entry.path()));
            }
        }
        files.sort_by(|left, right| left.0.cmp(&right.0));
        Ok(files.into_iter().map(|(_, path)| path).collect())
    }
}

fn is_plain_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains(':')
}
