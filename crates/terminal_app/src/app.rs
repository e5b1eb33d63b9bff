//! Line-oriented REPL over one [`Session`].
//!
//! Input and output are injected so the loop can run against in-memory
//! buffers. Ctrl-C is delivered through the [`Notify`] returned by
//! [`App::cancel_handle`]; it cancels an in-flight chat turn and is ignored at
//! the prompt.

use std::io::{self, Write};
use std::sync::Arc;

use project_terminal::project::ROOT_KEY;
use project_terminal::{FinalizeReport, ProjectStore, Session, SessionError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Notify;

use crate::commands::{parse_command, Command, HELP_TEXT};

pub const WELCOME_BANNER: &str = "Welcome to Project Terminal!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct App<W: Write> {
    session: Session,
    out: W,
    cancel: Arc<Notify>,
}

impl<W: Write> App<W> {
    pub fn new(session: Session, out: W) -> Self {
        Self {
            session,
            out,
            cancel: Arc::new(Notify::new()),
        }
    }

    pub fn cancel_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.cancel)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Read commands until `exit` or end of input, then finalize the session.
    pub async fn run<R>(&mut self, input: R) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        writeln!(self.out, "{WELCOME_BANNER}\n\n{HELP_TEXT}\n")?;
        let mut lines = input.lines();

        loop {
            self.prompt()?;
            let Some(line) = lines.next_line().await? else {
                writeln!(self.out, "\nReceived EOF. Performing cleanup...")?;
                break;
            };
            let Some(command) = parse_command(&line) else {
                continue;
            };
            if self.handle(command).await? == Flow::Exit {
                break;
            }
        }

        let report = self.session.finalize().await;
        self.print_finalize(&report)?;
        writeln!(self.out, "Goodbye!")?;
        self.out.flush()
    }

    fn prompt(&mut self) -> io::Result<()> {
        match self.session.project() {
            Some(project) => write!(self.out, "{} > You: ", project.name())?,
            None => write!(self.out, "You: ")?,
        }
        self.out.flush()
    }

    pub async fn handle(&mut self, command: Command) -> io::Result<Flow> {
        match command {
            Command::Exit => return Ok(Flow::Exit),
            Command::Help => writeln!(self.out, "{HELP_TEXT}")?,
            Command::Save => match self.session.save_chat().await {
                Ok(path) => writeln!(self.out, "Chat saved to: {}", path.display())?,
                Err(error) => writeln!(self.out, "Error saving chat: {error}")?,
            },
            Command::Clear => {
                self.session.clear_history();
                writeln!(self.out, "Conversation history cleared")?;
            }
            Command::Tokens => self.print_usage()?,
            Command::Search(query) => self.search(&query).await?,
            Command::ChatList => self.chat_list().await?,
            Command::ProjectNew(name) => {
                let result = self.session.init_project(&name).await;
                self.print_activation(&name, result)?;
            }
            Command::ProjectSwitch(name) => {
                let result = self.session.switch_project(&name).await;
                self.print_activation(&name, result)?;
            }
            Command::ProjectList => self.project_list().await?,
            Command::ProjectStructure => match self.session.project() {
                Some(project) => write_structure(&mut self.out, project)?,
                None => writeln!(self.out, "No active project")?,
            },
            Command::ProjectBackup => match self.session.backup_project().await {
                Ok(path) => writeln!(self.out, "Project backup created: {}", path.display())?,
                Err(SessionError::NoActiveProject) => {
                    writeln!(self.out, "No active project to backup")?
                }
                Err(error) => writeln!(self.out, "Error creating backup: {error}")?,
            },
            Command::FileView(path) => self.file_view(&path).await?,
            Command::FileList => self.file_list().await?,
            Command::Invalid(message) => writeln!(self.out, "{message}")?,
            Command::Chat(text) => self.chat_turn(&text).await?,
        }
        Ok(Flow::Continue)
    }

    async fn chat_turn(&mut self, text: &str) -> io::Result<()> {
        let cancel = Arc::clone(&self.cancel);
        let result = tokio::select! {
            result = self.session.chat(text) => Some(result),
            () = cancel.notified() => None,
        };

        match result {
            None => {
                tracing::info!("chat turn cancelled");
                writeln!(self.out, "\nOperation cancelled by user")?;
            }
            Some(Ok(outcome)) => {
                writeln!(
                    self.out,
                    "\nAssistant (model: {}):\n{}\n",
                    outcome.model, outcome.response
                )?;
                self.print_usage()?;
            }
            Some(Err(error)) => {
                writeln!(self.out, "Error in chat: {}", error.user_message())?;
            }
        }
        Ok(())
    }

    async fn search(&mut self, query: &str) -> io::Result<()> {
        match self.session.search(query).await {
            Ok(results) => {
                let rendered = serde_json::to_string_pretty(&results)
                    .unwrap_or_else(|_| results.to_string());
                writeln!(self.out, "Search Results:\n{rendered}")
            }
            Err(error) => writeln!(self.out, "Error: {error}"),
        }
    }

    async fn chat_list(&mut self) -> io::Result<()> {
        let summaries = match self.session.list_chats().await {
            Ok(summaries) => summaries,
            Err(error) => return writeln!(self.out, "Error listing chats: {error}"),
        };
        if summaries.is_empty() {
            return writeln!(self.out, "No chat history found");
        }
        writeln!(self.out, "Chat History")?;
        for summary in summaries {
            writeln!(
                self.out,
                "{}  {}  {} messages  {}",
                summary.timestamp,
                summary.project.as_deref().unwrap_or("None"),
                summary.messages,
                summary.file.display()
            )?;
        }
        Ok(())
    }

    async fn project_list(&mut self) -> io::Result<()> {
        let projects = match self.session.list_projects().await {
            Ok(projects) => projects,
            Err(error) => return writeln!(self.out, "Error listing projects: {error}"),
        };
        if projects.is_empty() {
            return writeln!(self.out, "No projects found");
        }
        writeln!(self.out, "Available Projects")?;
        for project in projects {
            let status = if project.active { "Active" } else { "-" };
            writeln!(self.out, "{:<30} {status}", project.name)?;
        }
        Ok(())
    }

    async fn file_view(&mut self, path: &str) -> io::Result<()> {
        let Some(project) = self.session.project_mut() else {
            return writeln!(self.out, "No active project");
        };
        match project.read(path).await {
            Ok(content) => writeln!(self.out, "--- {path} ---\n{content}"),
            Err(error) => writeln!(self.out, "Error: {error}"),
        }
    }

    async fn file_list(&mut self) -> io::Result<()> {
        let Some(project) = self.session.project() else {
            return writeln!(self.out, "No active project");
        };
        let entries = match project.list_entries().await {
            Ok(entries) => entries,
            Err(error) => return writeln!(self.out, "Error: {error}"),
        };
        if entries.is_empty() {
            return writeln!(self.out, "No files in project");
        }
        writeln!(self.out, "Project Files")?;
        for entry in entries {
            writeln!(self.out, "{:<40} {} bytes", entry.path, entry.size)?;
        }
        Ok(())
    }

    fn print_activation(&mut self, name: &str, result: Result<bool, SessionError>) -> io::Result<()> {
        match result {
            Ok(restored) => {
                writeln!(self.out, "Project '{name}' is now active")?;
                if restored {
                    writeln!(
                        self.out,
                        "Restored {} messages from the last saved chat",
                        self.session.history().len()
                    )?;
                }
                Ok(())
            }
            Err(SessionError::ProjectNotFound { name }) => {
                writeln!(self.out, "Project '{name}' not found")
            }
            Err(error) => writeln!(self.out, "Error: {error}"),
        }
    }

    fn print_usage(&mut self) -> io::Result<()> {
        let report = self.session.usage_report();
        writeln!(self.out, "Token Usage Statistics\n{report}")
    }

    fn print_finalize(&mut self, report: &FinalizeReport) -> io::Result<()> {
        match &report.chat_log {
            Some(Ok(path)) => writeln!(self.out, "Chat saved to: {}", path.display())?,
            Some(Err(error)) => writeln!(self.out, "Error saving chat: {error}")?,
            None => {}
        }
        match &report.backup {
            Some(Ok(path)) => writeln!(self.out, "Project backup created: {}", path.display())?,
            Some(Err(error)) => writeln!(self.out, "Error creating backup: {error}")?,
            None => {}
        }
        Ok(())
    }
}

/// Indented tree of the project snapshot, directories first.
fn write_structure<W: Write>(out: &mut W, project: &ProjectStore) -> io::Result<()> {
    writeln!(out, "{}/", project.name())?;
    write_directory(out, project, ROOT_KEY, 1)
}

fn write_directory<W: Write>(
    out: &mut W,
    project: &ProjectStore,
    key: &str,
    depth: usize,
) -> io::Result<()> {
    let Some(entry) = project.structure().get(key) else {
        return Ok(());
    };
    let indent = "  ".repeat(depth);
    for directory in &entry.subdirectories {
        writeln!(out, "{indent}{directory}/")?;
        let child = if key == ROOT_KEY {
            directory.clone()
        } else {
            format!("{key}/{directory}")
        };
        write_directory(out, project, &child, depth + 1)?;
    }
    for file in &entry.files {
        writeln!(out, "{indent}{file}")?;
    }
    Ok(())
}
