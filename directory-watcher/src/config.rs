//! Configuration for content directory watching.

use std::path::{Path, PathBuf};
use std::time::Duration;

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WatcherError};

/// Configuration for a watched content directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Root of the content directory. Event paths are relative to it.
    pub root: PathBuf,

    /// Patterns to exclude (glob patterns against the relative path).
    #[serde(default = "WatchConfig::default_excludes")]
    pub exclude_patterns: Vec<String>,

    /// Delay `add`/`change` events until writes settle. `None` disables.
    #[serde(default = "WatchConfig::default_await_write_finish")]
    pub await_write_finish: Option<AwaitWriteFinish>,

    /// Whether to follow symbolic links when indexing directories.
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Capacity of the outgoing event channel.
    #[serde(default = "WatchConfig::default_channel_capacity")]
    pub channel_capacity: usize,
}

impl WatchConfig {
    /// Create a new watch config.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclude_patterns: Self::default_excludes(),
            await_write_finish: Self::default_await_write_finish(),
            follow_symlinks: false,
            channel_capacity: Self::default_channel_capacity(),
        }
    }

    /// Add an exclude pattern.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Set the write stabilization options.
    pub fn with_await_write_finish(mut self, options: Option<AwaitWriteFinish>) -> Self {
        self.await_write_finish = options;
        self
    }

    /// Enable following symbolic links.
    pub fn follow_symlinks(mut self) -> Self {
        self.follow_symlinks = true;
        self
    }

    /// Set the outgoing channel capacity.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Get default exclude patterns.
    fn default_excludes() -> Vec<String> {
        vec![
            // Version control
            "**/.git/**".to_string(),
            "**/.hg/**".to_string(),
            "**/.svn/**".to_string(),
            // IDE/Editor
            "**/*.swp".to_string(),
            "**/*~".to_string(),
            // System files
            "**/.DS_Store".to_string(),
            "**/Thumbs.db".to_string(),
        ]
    }

    fn default_await_write_finish() -> Option<AwaitWriteFinish> {
        Some(AwaitWriteFinish::default())
    }

    fn default_channel_capacity() -> usize {
        1000
    }

    /// Compile the exclude patterns, rejecting invalid ones.
    pub fn compile_excludes(&self) -> Result<ExcludeSet> {
        let patterns = self
            .exclude_patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| WatcherError::InvalidPattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ExcludeSet { patterns })
    }
}

/// Write stabilization settings, applied before `add`/`change` are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwaitWriteFinish {
    /// How long size and mtime must stay unchanged.
    pub stability_threshold_ms: u64,

    /// How often to poll the file.
    pub poll_interval_ms: u64,
}

impl AwaitWriteFinish {
    pub fn stability_threshold(&self) -> Duration {
        Duration::from_millis(self.stability_threshold_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for AwaitWriteFinish {
    fn default() -> Self {
        Self {
            stability_threshold_ms: 50,
            poll_interval_ms: 10,
        }
    }
}

/// Compiled exclude patterns.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    /// Check if a relative path should be excluded.
    ///
    /// A leading `**/` also matches at the root, so `**/.git/**` excludes
    /// `.git/config`.
    pub fn should_exclude(&self, relative_path: &Path) -> bool {
        let path = relative_path.to_string_lossy().replace('\\', "/");
        let rooted = format!("/{path}");

        self.patterns
            .iter()
            .any(|p| p.matches(&path) || p.matches(&rooted))
    }
}
