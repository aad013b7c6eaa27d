//! Documents loaded from content files.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One successfully loaded content file.
///
/// Documents are replaced wholesale when their file changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Relative file path, unique within a cache.
    #[serde(rename = "_id")]
    pub id: String,

    /// Name of the owning document type.
    #[serde(rename = "type")]
    pub type_name: String,

    /// Source file information.
    #[serde(rename = "_raw")]
    pub raw: RawDocumentData,

    /// Raw markdown body, for markdown content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Field values, declared and extra, in source order.
    #[serde(flatten)]
    pub fields: IndexMap<String, Value>,
}

impl Document {
    /// Create a document for `relative_file_path`.
    pub fn new(
        relative_file_path: impl Into<String>,
        type_name: impl Into<String>,
        content_type: ContentType,
    ) -> Self {
        let id = relative_file_path.into();
        Self {
            raw: RawDocumentData::new(&id, content_type),
            id,
            type_name: type_name.into(),
            body: None,
            fields: IndexMap::new(),
        }
    }

    /// Set the field values.
    pub fn with_fields(mut self, fields: IndexMap<String, Value>) -> Self {
        self.fields = fields;
        self
    }

    /// Set the markdown body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Get a field value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Information about the file a document came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocumentData {
    /// Path relative to the content directory.
    pub source_file_path: String,

    /// File name with extension.
    pub source_file_name: String,

    /// Directory part of the path, `.` at the root.
    pub source_file_dir: String,

    /// How the file was parsed.
    pub content_type: ContentType,

    /// Path without extension and without a trailing `index`.
    pub flattened_path: String,
}

impl RawDocumentData {
    /// Derive the file information from a relative path.
    pub fn new(relative_file_path: &str, content_type: ContentType) -> Self {
        let (dir, file_name) = match relative_file_path.rsplit_once('/') {
            Some((dir, file_name)) => (dir, file_name),
            None => (".", relative_file_path),
        };

        Self {
            source_file_path: relative_file_path.to_string(),
            source_file_name: file_name.to_string(),
            source_file_dir: dir.to_string(),
            content_type,
            flattened_path: flattened_path(relative_file_path),
        }
    }
}

fn flattened_path(relative_file_path: &str) -> String {
    let (dir, file_name) = match relative_file_path.rsplit_once('/') {
        Some((dir, file_name)) => (Some(dir), file_name),
        None => (None, relative_file_path),
    };
    let stem = file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _)| stem);

    match (dir, stem) {
        (Some(dir), "index") => dir.to_string(),
        (None, "index") => String::new(),
        (Some(dir), stem) => format!("{dir}/{stem}"),
        (None, stem) => stem.to_string(),
    }
}

/// How a file's content is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Markdown with optional YAML front matter.
    Markdown,

    /// MDX with optional YAML front matter.
    Mdx,

    /// A JSON or YAML data file.
    Data,
}

impl ContentType {
    /// Infer the content type from a file extension.
    pub fn from_path(relative_file_path: &str) -> Option<Self> {
        let (_, extension) = relative_file_path.rsplit_once('.')?;

        match extension.to_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "mdx" => Some(Self::Mdx),
            "json" | "yaml" | "yml" => Some(Self::Data),
            _ => None,
        }
    }
}
