//! Assembly of the outgoing backend request.
//!
//! The system text is the fixed instructions plus, when a project is active,
//! a section naming the project and its tracked file paths. Contents are
//! never included. No token budget is enforced here.

use agent_provider::{BackendRequest, Turn};
use serde_json::Value;

use crate::project::ProjectStore;

/// Case-insensitive substrings that make a user message worth a web search.
pub const SEARCH_TRIGGERS: [&str; 14] = [
    "current",
    "latest",
    "recent",
    "new",
    "update",
    "trend",
    "compare",
    "versus",
    "vs",
    "difference between",
    "how to",
    "best practice",
    "example of",
    "tutorial",
];

pub const DEFAULT_INSTRUCTIONS: &str = r#"You are a software development and product design assistant working inside a project directory.

<file_operations_format>
Every change to project files MUST be expressed as a file operation block. Raw code snippets outside these blocks are not applied.

Create a file:
```file:create
path: relative/path/to/file.ext
content:
full file content
```

Replace the content of an existing file:
```file:edit
path: relative/path/to/file.ext
content:
full updated content
```

Read a file:
```file:read
path: relative/path/to/file.ext
```

Delete a file:
```file:delete
path: relative/path/to/file.ext
```
</file_operations_format>

Rules:
- Paths are relative to the project root and must not leave it.
- Always include the complete file content in create and edit blocks; never abbreviate with "...".
- If a file body itself contains fenced code, open the operation block with a longer backtick fence (for example four backticks) and close it with the same number.
- Keep the project structure clear and consistent."#;

/// Whether `text` matches any of [`SEARCH_TRIGGERS`].
#[must_use]
pub fn should_search(text: &str) -> bool {
    let lowered = text.to_lowercase();
    SEARCH_TRIGGERS
        .iter()
        .any(|trigger| lowered.contains(trigger))
}

/// Append pretty-printed search results to the user message.
#[must_use]
pub fn augment_with_results(user_message: &str, results: &Value) -> String {
    let rendered =
        serde_json::to_string_pretty(results).unwrap_or_else(|_| results.to_string());
    format!("{user_message}\n\nRelevant information:\n{rendered}")
}

#[derive(Debug, Clone)]
pub struct ContextAssembler {
    instructions: String,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_INSTRUCTIONS)
    }
}

impl ContextAssembler {
    #[must_use]
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
        }
    }

    #[must_use]
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    #[must_use]
    pub fn system_prompt(&self, project: Option<&ProjectStore>) -> String {
        let Some(project) = project else {
            return self.instructions.clone();
        };

        let mut prompt = self.instructions.clone();
        prompt.push_str("\n\nCurrent Project Context:\n");
        prompt.push_str(&format!("Project: {}\n", project.name()));
        prompt.push_str("Files in context:\n");
        for path in project.tracked_paths() {
            prompt.push_str(&format!("- {path}\n"));
        }
        prompt
    }

    /// Prior turns followed by `user_message`, under the project-aware
    /// system prompt.
    #[must_use]
    pub fn assemble(
        &self,
        project: Option<&ProjectStore>,
        history: &[Turn],
        user_message: &str,
    ) -> BackendRequest {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.extend_from_slice(history);
        messages.push(Turn::user(user_message));

        BackendRequest {
            system: self.system_prompt(project),
            messages,
        }
    }
}
