//! Turning content files into documents.
//!
//! [`DocumentParser`] is the seam between synchronization and file formats.
//! [`FrontmatterParser`] handles markdown with YAML front matter and plain
//! JSON / YAML data files.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use contentsync_schema::{DocumentTypeDef, FieldDef, FieldKind};
use indexmap::IndexMap;
use serde_json::Value;
use tokio::fs;

use crate::document::{ContentType, Document};
use crate::error::{FieldProblem, ParseError};

/// A parsed document plus the undeclared fields found in its source.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// The document, extra fields included.
    pub document: Document,

    /// Names of fields the type does not declare.
    pub extra_fields: Vec<String>,
}

/// Reads and validates one content file.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    /// Parse `relative_file_path` under `content_dir_path` as `type_def`.
    async fn parse(
        &self,
        content_dir_path: &Path,
        type_def: &DocumentTypeDef,
        relative_file_path: &str,
    ) -> std::result::Result<ParsedDocument, ParseError>;
}

/// Parser for markdown / MDX front matter and JSON / YAML data files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontmatterParser;

#[async_trait]
impl DocumentParser for FrontmatterParser {
    async fn parse(
        &self,
        content_dir_path: &Path,
        type_def: &DocumentTypeDef,
        relative_file_path: &str,
    ) -> std::result::Result<ParsedDocument, ParseError> {
        let content_type = ContentType::from_path(relative_file_path).ok_or_else(|| {
            ParseError::Malformed(format!("unsupported file extension: {relative_file_path}"))
        })?;

        let source = fs::read_to_string(content_dir_path.join(relative_file_path)).await?;

        let (data, body) = match content_type {
            ContentType::Markdown | ContentType::Mdx => {
                let (front_matter, body) = split_front_matter(&source)?;
                let data = match front_matter {
                    Some(yaml) => parse_yaml(yaml)?,
                    None => IndexMap::new(),
                };
                (data, Some(body.to_string()))
            }
            ContentType::Data if is_json(relative_file_path) => (parse_json(&source)?, None),
            ContentType::Data => (parse_yaml(&source)?, None),
        };

        let problems = check_fields(type_def, &data);
        if !problems.is_empty() {
            return Err(ParseError::MissingOrIncompatible { problems });
        }

        let extra_fields = data
            .keys()
            .filter(|name| type_def.field(name).is_none())
            .cloned()
            .collect();

        let mut document = Document::new(relative_file_path, &type_def.name, content_type)
            .with_fields(data);
        document.body = body;

        Ok(ParsedDocument {
            document,
            extra_fields,
        })
    }
}

/// Split `---` fenced YAML front matter from the body.
///
/// Returns `None` for the front matter when the file does not open with a
/// fence.
fn split_front_matter(source: &str) -> std::result::Result<(Option<&str>, &str), ParseError> {
    let text = source.strip_prefix('\u{feff}').unwrap_or(source);

    let Some(after_fence) = text.strip_prefix("---") else {
        return Ok((None, text));
    };
    let Some(rest) = after_fence
        .strip_prefix("\r\n")
        .or_else(|| after_fence.strip_prefix('\n'))
    else {
        return Ok((None, text));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Ok((Some(&rest[..offset]), &rest[offset + line.len()..]));
        }
        offset += line.len();
    }

    Err(ParseError::Malformed("unterminated front matter".to_string()))
}

fn is_json(relative_file_path: &str) -> bool {
    relative_file_path
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("json"))
}

fn parse_yaml(source: &str) -> std::result::Result<IndexMap<String, Value>, ParseError> {
    let value: Value =
        serde_yaml::from_str(source).map_err(|e| ParseError::Malformed(e.to_string()))?;
    into_object(value)
}

fn parse_json(source: &str) -> std::result::Result<IndexMap<String, Value>, ParseError> {
    let value: Value =
        serde_json::from_str(source).map_err(|e| ParseError::Malformed(e.to_string()))?;
    into_object(value)
}

fn into_object(value: Value) -> std::result::Result<IndexMap<String, Value>, ParseError> {
    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        // Empty front matter or an empty file.
        Value::Null => Ok(IndexMap::new()),
        other => Err(ParseError::Malformed(format!(
            "expected a mapping at the top level, found {}",
            describe(&other)
        ))),
    }
}

/// Check declared fields against the parsed values.
fn check_fields(type_def: &DocumentTypeDef, data: &IndexMap<String, Value>) -> Vec<FieldProblem> {
    let mut problems = Vec::new();

    for field in &type_def.fields {
        match data.get(&field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    problems.push(FieldProblem::Missing {
                        field: field.name.clone(),
                    });
                }
            }
            Some(value) if !accepts(field, value) => {
                problems.push(FieldProblem::Incompatible {
                    field: field.name.clone(),
                    expected: field.kind,
                    found: describe(value),
                });
            }
            Some(_) => {}
        }
    }

    problems
}

fn accepts(field: &FieldDef, value: &Value) -> bool {
    match field.kind {
        FieldKind::String => value.is_string(),
        FieldKind::Number => value.is_number(),
        FieldKind::Boolean => value.is_boolean(),
        FieldKind::Date => value.as_str().is_some_and(is_date),
        FieldKind::List => value.is_array(),
        FieldKind::Json => true,
        FieldKind::Enum => value
            .as_str()
            .is_some_and(|s| field.options.iter().any(|o| o == s)),
    }
}

fn is_date(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok() || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(_) => "list".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}
