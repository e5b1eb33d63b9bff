//! Applies parsed operation blocks to the active project and splices a
//! result or error annotation into the text where each block stood.

use crate::error::OperationError;
use crate::operations::{parse_operations, FileOperation, OperationKind};
use crate::project::ProjectStore;

/// Result of one applied operation.
#[derive(Debug)]
pub struct OperationOutcome {
    pub kind: OperationKind,
    pub path: String,
    /// Store message (or file content for reads) on success.
    pub result: Result<String, OperationError>,
}

impl OperationOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    #[must_use]
    pub fn annotation(&self) -> String {
        match &self.result {
            Ok(message) => success_annotation(self.kind, message),
            Err(error) => failure_annotation(self.kind, error),
        }
    }
}

#[derive(Debug)]
pub struct ExecutionReport {
    /// Input text with every matched block replaced by its annotation.
    pub rewritten: String,
    /// One entry per matched block, in document order.
    pub outcomes: Vec<OperationOutcome>,
}

#[must_use]
pub fn success_annotation(kind: OperationKind, message: &str) -> String {
    format!("\n### File Operation Result ({kind}):\n{message}\n")
}

#[must_use]
pub fn failure_annotation(kind: OperationKind, error: &OperationError) -> String {
    format!("\n### Error in file operation ({kind}):\n{error}\n")
}

/// Parse `text`, apply every block in order against `store`, and rewrite.
///
/// A failing operation never stops the batch. With no active project every
/// block fails with `NoActiveProject`.
pub async fn execute_operations(mut store: Option<&mut ProjectStore>, text: &str) -> ExecutionReport {
    let blocks = parse_operations(text);
    let mut rewritten = String::with_capacity(text.len());
    let mut outcomes = Vec::with_capacity(blocks.len());
    let mut cursor = 0;

    for block in blocks {
        let kind = block.operation.kind();
        let path = block.operation.path().to_string();
        let result = match store.as_deref_mut() {
            Some(project) => apply(project, &block.operation).await,
            None => Err(OperationError::NoActiveProject),
        };

        match &result {
            Ok(_) => tracing::info!(kind = %kind, path = %path, "file operation completed"),
            Err(error) => tracing::warn!(kind = %kind, path = %path, %error, "file operation failed"),
        }

        let outcome = OperationOutcome { kind, path, result };
        rewritten.push_str(&text[cursor..block.span.start]);
        rewritten.push_str(&outcome.annotation());
        cursor = block.span.end;
        outcomes.push(outcome);
    }

    rewritten.push_str(&text[cursor..]);
    ExecutionReport {
        rewritten,
        outcomes,
    }
}

async fn apply(
    store: &mut ProjectStore,
    operation: &FileOperation,
) -> Result<String, OperationError> {
    match operation {
        FileOperation::Create { path, content } => store.create(path, content).await,
        FileOperation::Edit { path, content } => store.edit(path, content).await,
        FileOperation::Read { path } => store.read(path).await,
        FileOperation::Delete { path } => store.delete(path).await,
    }
}
