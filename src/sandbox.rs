//! Lexical path confinement for project-relative paths.
//!
//! The guarantee is textual: a path that survives [`normalize`] cannot escape
//! the project root through `..` segments or an absolute prefix. Symlinks are
//! not resolved and case is not folded.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::OperationError;

/// A normalized project-relative path. Segments never contain `.`, `..` or a
/// separator, and there is at least one segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SandboxedPath {
    relative: String,
}

impl SandboxedPath {
    /// `/`-joined relative form, used as the file cache key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.relative
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.relative.split('/')
    }

    /// Join onto `root` segment by segment.
    #[must_use]
    pub fn resolve(&self, root: &Path) -> PathBuf {
        self.segments()
            .fold(root.to_path_buf(), |path, segment| path.join(segment))
    }
}

impl fmt::Display for SandboxedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative)
    }
}

/// Normalize `raw` and reject anything that could land outside the root.
///
/// Both `/` and `\` are separators. Rejected with `PathSecurityViolation`:
/// absolute or rooted paths, drive prefixes (`C:`), paths whose normalized
/// form starts with `..`, NUL bytes, and paths that normalize to nothing.
pub fn normalize(raw: &str) -> Result<SandboxedPath, OperationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.contains('\0') {
        return Err(OperationError::violation(raw));
    }
    if trimmed.starts_with(['/', '\\']) || has_drive_prefix(trimmed) {
        return Err(OperationError::violation(trimmed));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in trimmed.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(OperationError::violation(trimmed));
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(OperationError::violation(trimmed));
    }

    Ok(SandboxedPath {
        relative: segments.join("/"),
    })
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(raw: &str) -> String {
        normalize(raw).expect("path should be accepted").to_string()
    }

    fn rejected(raw: &str) -> bool {
        matches!(
            normalize(raw),
            Err(OperationError::PathSecurityViolation { .. })
        )
    }

    #[test]
    fn collapses_dot_segments() {
        assert_eq!(ok("a/./b/../c.txt"), "a/c.txt");
        assert_eq!(ok("./src//main.rs"), "src/main.rs");
        assert_eq!(ok("  notes.md  "), "notes.md");
    }

    #[test]
    fn backslash_is_a_separator() {
        assert_eq!(ok("a\\b\\c.txt"), "a/b/c.txt");
        assert!(rejected("..\\secret"));
    }

    #[test]
    fn rejects_leading_parent_escape() {
        assert!(rejected("../x"));
        assert!(rejected("a/../../x"));
        assert!(rejected(".."));
    }

    #[test]
    fn rejects_absolute_and_drive_prefixed_paths() {
        assert!(rejected("/etc/passwd"));
        assert!(rejected("\\windows\\system32"));
        assert!(rejected("C:\\temp\\x"));
        assert!(rejected("c:relative"));
    }

    #[test]
    fn rejects_paths_that_normalize_to_root() {
        assert!(rejected(""));
        assert!(rejected("."));
        assert!(rejected("a/.."));
        assert!(rejected("nul\0byte"));
    }

    #[test]
    fn resolve_stays_under_root() {
        let root = Path::new("/projects/demo");
        let path = normalize("a/b/../c.txt").expect("valid");
        assert_eq!(path.resolve(root), root.join("a").join("c.txt"));
        assert!(path.resolve(root).starts_with(root));
    }
}
