//! Full scans of the content directory.

use std::io;
use std::path::{Path, PathBuf};

use contentsync_directory_watcher::ExcludeSet;
use contentsync_schema::resolve_type;
use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::SourceConfig;
use crate::document::Document;
use crate::error::Result;
use crate::loader::DocumentLoader;

/// Enumerates and loads every file below the content directory.
#[derive(Debug, Clone)]
pub struct ContentScanner {
    content_dir_path: PathBuf,
    excludes: ExcludeSet,
    follow_symlinks: bool,
    concurrency: usize,
}

impl ContentScanner {
    pub fn new(content_dir_path: impl Into<PathBuf>, excludes: ExcludeSet) -> Self {
        Self {
            content_dir_path: content_dir_path.into(),
            excludes,
            follow_symlinks: false,
            concurrency: 16,
        }
    }

    /// Scanner using the config's exclude patterns and concurrency.
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let excludes = config
            .watch
            .to_watch_config(&config.content_dir_path)
            .compile_excludes()?;

        Ok(Self::new(&config.content_dir_path, excludes)
            .with_follow_symlinks(config.watch.follow_symlinks)
            .with_concurrency(config.scan_concurrency))
    }

    pub fn with_follow_symlinks(mut self, follow_symlinks: bool) -> Self {
        self.follow_symlinks = follow_symlinks;
        self
    }

    /// Maximum number of files loaded at once. Values below 1 are raised
    /// to 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn content_dir_path(&self) -> &Path {
        &self.content_dir_path
    }

    /// Relative, `/`-separated paths of all files, sorted.
    ///
    /// A missing or unreadable content directory is an error; unreadable
    /// entries below it are skipped with a warning.
    pub async fn list_files(&self) -> Result<Vec<String>> {
        let root = self.content_dir_path.clone();
        let excludes = self.excludes.clone();
        let follow_symlinks = self.follow_symlinks;

        tokio::task::spawn_blocking(move || walk(&root, &excludes, follow_symlinks))
            .await
            .map_err(io::Error::other)?
    }

    /// Load every file that resolves to a document type.
    ///
    /// Files are loaded concurrently; the first fatal failure aborts the
    /// scan. Documents are returned sorted by id.
    pub async fn scan(&self, loader: &DocumentLoader) -> Result<Vec<Document>> {
        let files = self.list_files().await?;
        let registry = loader.registry();

        let mut matched = Vec::with_capacity(files.len());
        for relative_file_path in files {
            match resolve_type(&relative_file_path, registry) {
                Some(type_name) => matched.push((type_name.to_string(), relative_file_path)),
                None => debug!("No document type for {relative_file_path}, skipping"),
            }
        }

        let mut documents: Vec<Document> = stream::iter(matched)
            .map(|(type_name, relative_file_path)| async move {
                loader.load(&type_name, &relative_file_path).await
            })
            .buffer_unordered(self.concurrency)
            .try_filter_map(|outcome| async move { Ok(outcome.into_document()) })
            .try_collect()
            .await?;

        documents.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));

        info!(
            "Scanned {}: {} documents",
            self.content_dir_path.display(),
            documents.len()
        );
        Ok(documents)
    }
}

fn walk(root: &Path, excludes: &ExcludeSet, follow_symlinks: bool) -> Result<Vec<String>> {
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(follow_symlinks)
        .into_iter()
        .filter_entry(|entry| {
            !entry
                .path()
                .strip_prefix(root)
                .is_ok_and(|relative| excludes.should_exclude(relative))
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(io::Error::from(e).into()),
            Err(e) => {
                warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(
                relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/"),
            );
        }
    }

    files.sort();
    Ok(files)
}
