//! # Content Schema
//!
//! Static description of the document types a content directory holds.
//!
//! - **Document types**: a name, a file-path glob and a field set
//! - **Type registry**: the ordered, read-only table built once at startup
//! - **Path resolution**: which single type owns a relative file path
//! - **Core schema**: the schema metadata attached to every cache snapshot
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Content Schema                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  DocumentTypeDef ──► TypeRegistry ──► resolve_type(path)        │
//! │        │                  │                                     │
//! │        ▼                  ▼                                     │
//! │     FieldDef          SchemaDef (hash)                          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod core_schema;
pub mod document_type;
pub mod error;
pub mod field;
pub mod registry;
pub mod resolver;

pub use core_schema::SchemaDef;
pub use document_type::{DocumentTypeDef, FilePathPattern};
pub use error::{Result, SchemaError};
pub use field::{FieldDef, FieldKind};
pub use registry::{FilePathPatternMap, TypeRegistry};
pub use resolver::{normalize_relative_path, resolve_type};
