//! Loading one file as a document, with flag handling.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use contentsync_schema::TypeRegistry;
use tracing::{debug, warn};

use crate::document::Document;
use crate::error::{ParseError, Result, SourceError, join_problems};
use crate::flags::{OnExtraData, OnMissingOrIncompatibleData, SyncFlags};
use crate::parser::DocumentParser;

/// Outcome of loading a file that did not fail fatally.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The file became a document.
    Loaded(Document),

    /// The file is left out of the cache.
    Omitted,
}

impl LoadOutcome {
    /// The loaded document, if any.
    pub fn into_document(self) -> Option<Document> {
        match self {
            Self::Loaded(document) => Some(document),
            Self::Omitted => None,
        }
    }
}

/// Loads files through a [`DocumentParser`] and applies [`SyncFlags`].
#[derive(Clone)]
pub struct DocumentLoader {
    content_dir_path: PathBuf,
    registry: Arc<TypeRegistry>,
    parser: Arc<dyn DocumentParser>,
    flags: SyncFlags,
}

impl DocumentLoader {
    /// Create a new loader.
    pub fn new(
        content_dir_path: impl Into<PathBuf>,
        registry: Arc<TypeRegistry>,
        parser: Arc<dyn DocumentParser>,
        flags: SyncFlags,
    ) -> Self {
        Self {
            content_dir_path: content_dir_path.into(),
            registry,
            parser,
            flags,
        }
    }

    pub fn content_dir_path(&self) -> &Path {
        &self.content_dir_path
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn flags(&self) -> SyncFlags {
        self.flags
    }

    /// Load `relative_file_path` as a document of type `type_name`.
    ///
    /// A file that no longer exists is omitted, since its removal event is
    /// still on the way. `Err` is fatal: either the data problem is
    /// configured to fail, or the file could not be read or parsed at all.
    pub async fn load(&self, type_name: &str, relative_file_path: &str) -> Result<LoadOutcome> {
        let type_def = self
            .registry
            .get(type_name)
            .ok_or_else(|| SourceError::UnknownType(type_name.to_string()))?;

        let parsed = match self
            .parser
            .parse(&self.content_dir_path, type_def, relative_file_path)
            .await
        {
            Ok(parsed) => parsed,
            Err(ParseError::MissingOrIncompatible { problems }) => {
                return match self.flags.on_missing_or_incompatible_data {
                    OnMissingOrIncompatibleData::Skip => {
                        warn!(
                            "Skipping {relative_file_path}: missing or incompatible data for document type `{type_name}`: {}",
                            join_problems(&problems)
                        );
                        Ok(LoadOutcome::Omitted)
                    }
                    OnMissingOrIncompatibleData::SkipIgnore => Ok(LoadOutcome::Omitted),
                    OnMissingOrIncompatibleData::Fail => Err(SourceError::Load {
                        relative_file_path: relative_file_path.to_string(),
                        source: ParseError::MissingOrIncompatible { problems },
                    }),
                };
            }
            Err(e) if e.is_not_found() => {
                debug!("{relative_file_path} no longer exists, omitting");
                return Ok(LoadOutcome::Omitted);
            }
            Err(source) => {
                return Err(SourceError::Load {
                    relative_file_path: relative_file_path.to_string(),
                    source,
                });
            }
        };

        if !parsed.extra_fields.is_empty() && self.flags.on_extra_data == OnExtraData::Warn {
            warn!(
                "Extra fields in {relative_file_path} not declared on document type `{type_name}`: {}",
                parsed.extra_fields.join(", ")
            );
        }

        debug!("Loaded {relative_file_path} as `{type_name}`");
        Ok(LoadOutcome::Loaded(parsed.document))
    }
}

impl fmt::Debug for DocumentLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentLoader")
            .field("content_dir_path", &self.content_dir_path)
            .field("types", &self.registry.len())
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}
