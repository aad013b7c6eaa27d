//! Document type definitions and their file-path patterns.

use std::collections::HashSet;
use std::fmt;

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::field::{FieldDef, FieldKind};
use crate::resolver::normalize_relative_path;

/// `*` stays within one path segment; `**` spans directories.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled glob matched against paths relative to the content directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FilePathPattern {
    source: String,
    compiled: Pattern,
}

impl FilePathPattern {
    /// Compile a glob pattern.
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let source = pattern.into();
        let compiled = Pattern::new(&source).map_err(|e| SchemaError::InvalidPattern {
            pattern: source.clone(),
            source: e,
        })?;

        Ok(Self { source, compiled })
    }

    /// The pattern as written in configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Test a relative file path against the pattern.
    ///
    /// The path is brought into canonical form first, see
    /// [`normalize_relative_path`].
    pub fn matches(&self, relative_file_path: &str) -> bool {
        self.compiled
            .matches_with(&normalize_relative_path(relative_file_path), MATCH_OPTIONS)
    }
}

impl PartialEq for FilePathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for FilePathPattern {}

impl fmt::Display for FilePathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl TryFrom<String> for FilePathPattern {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<FilePathPattern> for String {
    fn from(pattern: FilePathPattern) -> Self {
        pattern.source
    }
}

/// Definition of one document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTypeDef {
    /// Unique type name.
    pub name: String,

    /// Which files belong to this type.
    pub file_path_pattern: FilePathPattern,

    /// Declared fields.
    #[serde(default)]
    pub fields: Vec<FieldDef>,

    /// Human readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DocumentTypeDef {
    /// Create a document type with no fields.
    pub fn new(name: impl Into<String>, file_path_pattern: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            file_path_pattern: FilePathPattern::new(file_path_pattern)?,
            fields: Vec::new(),
            description: None,
        })
    }

    /// Add a field.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Look up a declared field.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check the field set for duplicates and enum fields without options.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(self.invalid_field(field, "declared more than once"));
            }
            if field.kind == FieldKind::Enum && field.options.is_empty() {
                return Err(self.invalid_field(field, "enum field has no options"));
            }
        }

        Ok(())
    }

    fn invalid_field(&self, field: &FieldDef, reason: &str) -> SchemaError {
        SchemaError::InvalidField {
            type_name: self.name.clone(),
            field: field.name.clone(),
            reason: reason.to_string(),
        }
    }
}
