//! Extraction of fenced file-operation blocks from generated text.
//!
//! Grammar, one block per match:
//!
//! ````text
//! ```file:create            <- N >= 3 backticks, then `file:<kind>`
//! path: relative/path.txt
//! content:
//! <body lines>
//! ```                       <- exactly N backticks
//! ````
//!
//! `read` and `delete` carry no `content:` section; their closing fence may
//! follow on the next line or sit directly after the path value. Inside a
//! body, a line of N backticks followed by an info string opens a nested
//! fence and a bare N-backtick line closes it, so bodies may embed fenced
//! code. Unknown kinds and malformed or unterminated blocks yield nothing and
//! stay in the text untouched.

use std::fmt;
use std::ops::Range;

const MIN_FENCE: usize = 3;
const FENCE_TAG: &str = "file:";
const PATH_MARKER: &str = "path:";
const CONTENT_MARKER: &str = "content:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Create,
    Edit,
    Read,
    Delete,
}

impl OperationKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Read => "read",
            Self::Delete => "delete",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "create" => Some(Self::Create),
            "edit" => Some(Self::Edit),
            "read" => Some(Self::Read),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    fn has_body(&self) -> bool {
        matches!(self, Self::Create | Self::Edit)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file operation as written in the text. `path` is not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOperation {
    Create { path: String, content: String },
    Edit { path: String, content: String },
    Read { path: String },
    Delete { path: String },
}

impl FileOperation {
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Edit { .. } => OperationKind::Edit,
            Self::Read { .. } => OperationKind::Read,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Create { path, .. }
            | Self::Edit { path, .. }
            | Self::Read { path }
            | Self::Delete { path } => path,
        }
    }
}

/// One matched block: the byte span it occupies in the source text and the
/// operation it encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationBlock {
    pub span: Range<usize>,
    pub operation: FileOperation,
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    start: usize,
    text: &'a str,
}

impl Line<'_> {
    fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

/// Every well-formed block in `text`, in document order.
#[must_use]
pub fn parse_operations(text: &str) -> Vec<OperationBlock> {
    let lines = split_lines(text);
    let mut blocks = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let Some((ticks, kind)) = opening_fence(lines[index].text) else {
            index += 1;
            continue;
        };

        match parse_block(text, &lines, index, ticks, kind) {
            Some((block, closing)) => {
                blocks.push(block);
                index = closing + 1;
            }
            None => index += 1,
        }
    }

    blocks
}

/// Parse the block opened at `open`. Returns the block and the index of the
/// line holding its closing fence.
fn parse_block(
    text: &str,
    lines: &[Line<'_>],
    open: usize,
    ticks: usize,
    kind: OperationKind,
) -> Option<(OperationBlock, usize)> {
    let path_line = lines.get(open + 1)?;
    let raw_path = path_line.text.trim_start().strip_prefix(PATH_MARKER)?;
    let start = lines[open].start;

    if !kind.has_body() {
        let value = raw_path.trim_end();
        if let Some(inline) = strip_closing_suffix(value, ticks) {
            let path = non_empty(inline)?;
            let block = OperationBlock {
                span: start..path_line.end(),
                operation: bodyless(kind, path),
            };
            return Some((block, open + 1));
        }

        let closing = lines.get(open + 2)?;
        if !is_closing_fence(closing.text, ticks) {
            return None;
        }
        let path = non_empty(value)?;
        let block = OperationBlock {
            span: start..closing.end(),
            operation: bodyless(kind, path),
        };
        return Some((block, open + 2));
    }

    let path = non_empty(raw_path)?;
    let marker = lines.get(open + 2)?;
    if marker.text.trim_end() != CONTENT_MARKER {
        return None;
    }

    let body_start = open + 3;
    let closing = find_closing_fence(lines, body_start, ticks)?;
    let content = if closing == body_start {
        String::new()
    } else {
        text[lines[body_start].start..lines[closing - 1].end()].to_string()
    };

    let operation = match kind {
        OperationKind::Create => FileOperation::Create { path, content },
        _ => FileOperation::Edit { path, content },
    };
    let block = OperationBlock {
        span: start..lines[closing].end(),
        operation,
    };
    Some((block, closing))
}

fn bodyless(kind: OperationKind, path: String) -> FileOperation {
    match kind {
        OperationKind::Read => FileOperation::Read { path },
        _ => FileOperation::Delete { path },
    }
}

/// Index of the first bare N-backtick line at nesting depth zero.
fn find_closing_fence(lines: &[Line<'_>], from: usize, ticks: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, line) in lines[from..].iter().enumerate() {
        let (run, rest) = backtick_run(line.text);
        if run != ticks {
            continue;
        }
        if rest.trim().is_empty() {
            if depth == 0 {
                return Some(from + offset);
            }
            depth -= 1;
        } else {
            depth += 1;
        }
    }
    None
}

fn opening_fence(line: &str) -> Option<(usize, OperationKind)> {
    let (ticks, rest) = backtick_run(line);
    if ticks < MIN_FENCE {
        return None;
    }
    let tag = rest.strip_prefix(FENCE_TAG)?.trim_end();
    OperationKind::from_tag(tag).map(|kind| (ticks, kind))
}

fn is_closing_fence(line: &str, ticks: usize) -> bool {
    let (run, rest) = backtick_run(line);
    run == ticks && rest.trim().is_empty()
}

/// `value` without a trailing run of exactly `ticks` backticks.
fn strip_closing_suffix(value: &str, ticks: usize) -> Option<&str> {
    let trailing = value.len() - value.trim_end_matches('`').len();
    if trailing == ticks {
        Some(&value[..value.len() - ticks])
    } else {
        None
    }
}

fn backtick_run(line: &str) -> (usize, &str) {
    let rest = line.trim_start_matches('`');
    (line.len() - rest.len(), rest)
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn split_lines(text: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for raw in text.split_inclusive('\n') {
        let without_newline = raw.strip_suffix('\n').unwrap_or(raw);
        let line = without_newline
            .strip_suffix('\r')
            .unwrap_or(without_newline);
        lines.push(Line {
            start: offset,
            text: line,
        });
        offset += raw.len();
    }
    lines
}
