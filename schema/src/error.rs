//! Error types for schema construction.

use thiserror::Error;

/// Result type alias for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while building document type definitions.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The file-path pattern is not a valid glob.
    #[error("invalid file path pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// Two document types share a name.
    #[error("duplicate document type: {0}")]
    DuplicateType(String),

    /// A field definition is unusable.
    #[error("invalid field `{field}` on document type `{type_name}`: {reason}")]
    InvalidField {
        type_name: String,
        field: String,
        reason: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
