//! Source configuration, loaded from TOML.
//!
//! ```toml
//! content_dir_path = "content"
//!
//! [flags]
//! on_missing_or_incompatible_data = "fail"
//!
//! [[document_types]]
//! name = "post"
//! file_path_pattern = "posts/*.md"
//! fields = [{ name = "title", type = "string", required = true }]
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use contentsync_directory_watcher::{AwaitWriteFinish, WatchConfig};
use contentsync_schema::{DocumentTypeDef, SchemaError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SourceError};
use crate::flags::SyncFlags;

/// Everything needed to synchronize one content directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding the content files.
    pub content_dir_path: PathBuf,

    /// Document types, in resolution order.
    #[serde(default)]
    pub document_types: Vec<DocumentTypeDef>,

    /// Loader flags.
    #[serde(default)]
    pub flags: SyncFlags,

    /// Watch mode settings.
    #[serde(default)]
    pub watch: WatchOptions,

    /// Maximum number of files loaded at once during a full scan.
    #[serde(default = "SourceConfig::default_scan_concurrency")]
    pub scan_concurrency: usize,
}

impl SourceConfig {
    /// Create a config with no document types.
    pub fn new(content_dir_path: impl Into<PathBuf>) -> Self {
        Self {
            content_dir_path: content_dir_path.into(),
            document_types: Vec::new(),
            flags: SyncFlags::default(),
            watch: WatchOptions::default(),
            scan_concurrency: Self::default_scan_concurrency(),
        }
    }

    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| SourceError::Config(e.to_string()))
    }

    /// Load a config file.
    ///
    /// A relative `content_dir_path` is resolved against the file's
    /// directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            SourceError::Config(format!("failed to read {}: {e}", path.display()))
        })?;

        let mut config = Self::from_toml_str(&text)?;
        if config.content_dir_path.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.content_dir_path = base.join(&config.content_dir_path);
        }

        info!(
            "Loaded config from {} ({} document types)",
            path.display(),
            config.document_types.len()
        );
        Ok(config)
    }

    /// Add a document type.
    pub fn with_document_type(mut self, def: DocumentTypeDef) -> Self {
        self.document_types.push(def);
        self
    }

    pub fn with_flags(mut self, flags: SyncFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_watch(mut self, watch: WatchOptions) -> Self {
        self.watch = watch;
        self
    }

    pub fn with_scan_concurrency(mut self, scan_concurrency: usize) -> Self {
        self.scan_concurrency = scan_concurrency;
        self
    }

    /// Reject duplicate type names, invalid fields and a missing content
    /// directory.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for def in &self.document_types {
            if !names.insert(def.name.as_str()) {
                return Err(SchemaError::DuplicateType(def.name.clone()).into());
            }
            def.validate()?;
        }

        if self.scan_concurrency == 0 {
            return Err(SourceError::Config(
                "scan_concurrency must be at least 1".to_string(),
            ));
        }

        if !self.content_dir_path.is_dir() {
            return Err(SourceError::Config(format!(
                "content directory {} does not exist or is not a directory",
                self.content_dir_path.display()
            )));
        }

        Ok(())
    }

    fn default_scan_concurrency() -> usize {
        16
    }
}

/// Watch mode settings, without the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchOptions {
    /// Glob patterns, relative to the content directory, that are never
    /// watched or scanned.
    pub exclude_patterns: Vec<String>,

    /// Delay add/change events until the file stops changing.
    pub await_write_finish: bool,

    /// How long size and mtime must stay unchanged.
    pub stability_threshold_ms: u64,

    /// How often to poll a file that is being written.
    pub poll_interval_ms: u64,

    /// Whether to follow symbolic links.
    pub follow_symlinks: bool,

    /// Capacity of the raw event channel.
    pub channel_capacity: usize,
}

impl WatchOptions {
    /// Watcher configuration for `root`.
    pub fn to_watch_config(&self, root: impl Into<PathBuf>) -> WatchConfig {
        let await_write_finish = self.await_write_finish.then_some(AwaitWriteFinish {
            stability_threshold_ms: self.stability_threshold_ms,
            poll_interval_ms: self.poll_interval_ms,
        });

        let mut config = WatchConfig::new(root)
            .with_await_write_finish(await_write_finish)
            .with_channel_capacity(self.channel_capacity);
        config.exclude_patterns = self.exclude_patterns.clone();
        config.follow_symlinks = self.follow_symlinks;
        config
    }
}

impl Default for WatchOptions {
    fn default() -> Self {
        let defaults = WatchConfig::new(PathBuf::new());
        let write_finish = AwaitWriteFinish::default();

        Self {
            exclude_patterns: defaults.exclude_patterns,
            await_write_finish: true,
            stability_threshold_ms: write_finish.stability_threshold_ms,
            poll_interval_ms: write_finish.poll_interval_ms,
            follow_symlinks: defaults.follow_symlinks,
            channel_capacity: defaults.channel_capacity,
        }
    }
}
