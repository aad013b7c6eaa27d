//! Error types for content synchronization.

use contentsync_directory_watcher::WatcherError;
use contentsync_schema::{FieldKind, SchemaError};
use thiserror::Error;

/// Result type alias for synchronization operations.
pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors that abort a synchronization step.
#[derive(Error, Debug)]
pub enum SourceError {
    /// A file could not be turned into a document.
    #[error("failed to load {relative_file_path}: {source}")]
    Load {
        relative_file_path: String,
        #[source]
        source: ParseError,
    },

    /// A document type name is not registered.
    #[error("unknown document type: {0}")]
    UnknownType(String),

    /// An incremental event arrived before the initial load.
    #[error("cache is not initialized: an init event must come first")]
    NotInitialized,

    /// A previous step failed; the synchronizer accepts no more events.
    #[error("synchronization already failed: {0}")]
    Failed(String),

    /// The file system watcher failed.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// Invalid schema.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal event channel closed unexpectedly.
    #[error("channel error: event mailbox closed")]
    ChannelClosed,
}

/// Failures reported by a [`DocumentParser`](crate::parser::DocumentParser).
#[derive(Error, Debug)]
pub enum ParseError {
    /// Required fields are missing or values have the wrong kind.
    #[error("missing or incompatible data: {}", join_problems(.problems))]
    MissingOrIncompatible { problems: Vec<FieldProblem> },

    /// The file could not be read.
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The file content could not be parsed at all.
    #[error("malformed content: {0}")]
    Malformed(String),
}

impl ParseError {
    /// The file no longer exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

/// One field-level validation problem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    /// A required field is absent or null.
    #[error("required field `{field}` is missing")]
    Missing { field: String },

    /// A value does not fit the declared kind.
    #[error("field `{field}` expects {expected}, found {found}")]
    Incompatible {
        field: String,
        expected: FieldKind,
        found: String,
    },
}

pub(crate) fn join_problems(problems: &[FieldProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
