/// One parsed REPL line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    Save,
    Clear,
    Tokens,
    Search(String),
    ChatList,
    ProjectNew(String),
    ProjectSwitch(String),
    ProjectList,
    ProjectStructure,
    ProjectBackup,
    FileView(String),
    FileList,
    /// A recognized keyword used incorrectly; carries the usage hint.
    Invalid(String),
    /// Anything else: sent to the backend as a chat turn.
    Chat(String),
}

pub const HELP_TEXT: &str = "Commands:
- 'exit': End the conversation
- 'save': Save chat history
- 'clear': Clear conversation history
- 'tokens': Display token usage
- 'search <query>': Perform a direct web search
- 'chat list': List saved chat histories
- 'project new <name>': Create a new project
- 'project switch <name>': Switch to an existing project
- 'project list': List all projects
- 'project structure': Show current project structure
- 'project backup': Create a backup of the current project
- 'file view <path>': View file contents
- 'file list': List all files in current project
- 'help': Show this message";

/// Parse one input line. Keywords are case-insensitive; arguments are kept
/// as typed. Blank input yields `None`.
pub fn parse_command(input: &str) -> Option<Command> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (keyword, rest) = split_word(trimmed);
    let parsed = match keyword.to_lowercase().as_str() {
        "help" if rest.is_empty() => Command::Help,
        "exit" if rest.is_empty() => Command::Exit,
        "save" if rest.is_empty() => Command::Save,
        "clear" if rest.is_empty() => Command::Clear,
        "tokens" if rest.is_empty() => Command::Tokens,
        "search" => {
            if rest.is_empty() {
                Command::Invalid("Usage: search <query>".to_string())
            } else {
                Command::Search(rest.to_string())
            }
        }
        "chat" if !rest.is_empty() => parse_chat(rest),
        "project" => parse_project(rest),
        "file" if !rest.is_empty() => parse_file(rest),
        _ => Command::Chat(trimmed.to_string()),
    };
    Some(parsed)
}

fn parse_chat(rest: &str) -> Command {
    let (action, _) = split_word(rest);
    match action.to_lowercase().as_str() {
        "list" => Command::ChatList,
        other => Command::Invalid(format!("Unknown chat command: {other}")),
    }
}

fn parse_project(rest: &str) -> Command {
    let (action, argument) = split_word(rest);
    match action.to_lowercase().as_str() {
        "new" | "switch" if argument.is_empty() => {
            Command::Invalid("Please specify a project name".to_string())
        }
        "new" => Command::ProjectNew(argument.to_string()),
        "switch" => Command::ProjectSwitch(argument.to_string()),
        "list" => Command::ProjectList,
        "structure" => Command::ProjectStructure,
        "backup" => Command::ProjectBackup,
        "" => Command::Invalid("Invalid project command".to_string()),
        other => Command::Invalid(format!("Unknown project command: {other}")),
    }
}

fn parse_file(rest: &str) -> Command {
    let (action, argument) = split_word(rest);
    match action.to_lowercase().as_str() {
        "view" if argument.is_empty() => {
            Command::Invalid("Please specify a file path".to_string())
        }
        "view" => Command::FileView(argument.to_string()),
        "list" => Command::FileList,
        other => Command::Invalid(format!("Unknown file command: {other}")),
    }
}

fn split_word(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}
