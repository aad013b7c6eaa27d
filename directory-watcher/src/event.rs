//! Raw file system events and their translation from notify.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use notify::EventKind;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::config::ExcludeSet;

/// A primitive file system event, relative to the watched root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFsEvent {
    /// The kind of event.
    pub kind: RawEventKind,

    /// Path relative to the watched root, `/`-separated.
    pub relative_path: String,

    /// When the event was observed.
    pub timestamp: DateTime<Utc>,
}

impl RawFsEvent {
    /// Create a new raw event.
    pub fn new(kind: RawEventKind, relative_path: impl Into<String>) -> Self {
        Self {
            kind,
            relative_path: relative_path.into(),
            timestamp: Utc::now(),
        }
    }

    /// Check if this is a directory event.
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, RawEventKind::AddDir | RawEventKind::UnlinkDir)
    }
}

/// Kind of raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RawEventKind {
    /// File was created.
    Add,

    /// File content changed.
    Change,

    /// File was removed.
    Unlink,

    /// Directory was created.
    AddDir,

    /// Directory was removed.
    UnlinkDir,
}

impl RawEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Change => "change",
            Self::Unlink => "unlink",
            Self::AddDir => "addDir",
            Self::UnlinkDir => "unlinkDir",
        }
    }
}

/// Translates notify events into [`RawFsEvent`]s.
///
/// Keeps the set of known directories so removals reported without a
/// file/folder hint can still be told apart.
#[derive(Debug)]
pub struct EventTranslator {
    root: PathBuf,
    excludes: ExcludeSet,
    directories: HashSet<PathBuf>,
}

impl EventTranslator {
    /// Create a translator for `root` with no known directories.
    pub fn new(root: impl Into<PathBuf>, excludes: ExcludeSet) -> Self {
        Self {
            root: root.into(),
            excludes,
            directories: HashSet::new(),
        }
    }

    /// Record every directory currently below the root.
    pub fn index_directories(&mut self, follow_symlinks: bool) {
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(follow_symlinks);

        for entry in walker.into_iter().filter_map(Result::ok) {
            if entry.file_type().is_dir() {
                self.directories.insert(entry.into_path());
            }
        }
    }

    /// Number of directories currently known.
    pub fn known_directories(&self) -> usize {
        self.directories.len()
    }

    /// Translate one notify event.
    pub fn translate(&mut self, event: &notify::Event) -> Vec<RawFsEvent> {
        let mut out = Vec::new();

        match event.kind {
            EventKind::Create(kind) => {
                for path in &event.paths {
                    let is_dir = match kind {
                        CreateKind::Folder => true,
                        CreateKind::File => false,
                        _ => path.is_dir(),
                    };
                    self.created(path, is_dir, &mut out);
                }
            }
            EventKind::Remove(kind) => {
                for path in &event.paths {
                    let is_dir = kind == RemoveKind::Folder || self.directories.contains(path);
                    self.removed(path, is_dir, &mut out);
                }
            }
            EventKind::Modify(ModifyKind::Name(mode)) => match (mode, event.paths.as_slice()) {
                (RenameMode::Both, [from, to]) => {
                    let was_dir = self.directories.contains(from);
                    self.removed(from, was_dir, &mut out);
                    self.created(to, to.is_dir(), &mut out);
                }
                (RenameMode::From, paths) => {
                    for path in paths {
                        let was_dir = self.directories.contains(path);
                        self.removed(path, was_dir, &mut out);
                    }
                }
                (_, paths) => {
                    // `To` or an unpaired rename: whatever exists now was added.
                    for path in paths {
                        if path.exists() {
                            self.created(path, path.is_dir(), &mut out);
                        } else {
                            let was_dir = self.directories.contains(path);
                            self.removed(path, was_dir, &mut out);
                        }
                    }
                }
            },
            EventKind::Modify(ModifyKind::Metadata(_)) => {}
            EventKind::Modify(_) => {
                for path in &event.paths {
                    if !path.is_dir() && !self.directories.contains(path) {
                        self.push(RawEventKind::Change, path, &mut out);
                    }
                }
            }
            EventKind::Access(_) | EventKind::Any | EventKind::Other => {}
        }

        out
    }

    fn created(&mut self, path: &Path, is_dir: bool, out: &mut Vec<RawFsEvent>) {
        if is_dir {
            self.directories.insert(path.to_path_buf());
            self.push(RawEventKind::AddDir, path, out);
        } else {
            self.push(RawEventKind::Add, path, out);
        }
    }

    fn removed(&mut self, path: &Path, is_dir: bool, out: &mut Vec<RawFsEvent>) {
        if is_dir {
            self.directories.retain(|d| !d.starts_with(path));
            self.push(RawEventKind::UnlinkDir, path, out);
        } else {
            self.push(RawEventKind::Unlink, path, out);
        }
    }

    fn push(&self, kind: RawEventKind, path: &Path, out: &mut Vec<RawFsEvent>) {
        let Some(relative) = self.relative(path) else {
            return;
        };
        if relative.as_os_str().is_empty() || self.excludes.should_exclude(&relative) {
            return;
        }

        let relative_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        out.push(RawFsEvent::new(kind, relative_path));
    }

    fn relative(&self, path: &Path) -> Option<PathBuf> {
        if path.is_relative() {
            return Some(path.to_path_buf());
        }
        path.strip_prefix(&self.root).ok().map(Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WatchConfig;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn translator(root: &Path) -> EventTranslator {
        let excludes = WatchConfig::new(root).compile_excludes().unwrap();
        EventTranslator::new(root, excludes)
    }

    fn kinds(events: &[RawFsEvent]) -> Vec<(RawEventKind, &str)> {
        events
            .iter()
            .map(|e| (e.kind, e.relative_path.as_str()))
            .collect()
    }

    #[test]
    fn test_file_lifecycle() {
        let root = Path::new("/content");
        let mut translator = translator(root);
        let path = root.join("posts/a.md");

        let created = notify::Event::new(EventKind::Create(CreateKind::File)).add_path(path.clone());
        let modified = notify::Event::new(EventKind::Modify(ModifyKind::Data(
            notify::event::DataChange::Content,
        )))
        .add_path(path.clone());
        let removed = notify::Event::new(EventKind::Remove(RemoveKind::File)).add_path(path);

        assert_eq!(
            kinds(&translator.translate(&created)),
            vec![(RawEventKind::Add, "posts/a.md")]
        );
        assert_eq!(
            kinds(&translator.translate(&modified)),
            vec![(RawEventKind::Change, "posts/a.md")]
        );
        assert_eq!(
            kinds(&translator.translate(&removed)),
            vec![(RawEventKind::Unlink, "posts/a.md")]
        );
    }

    #[test]
    fn test_directory_events() {
        let root = Path::new("/content");
        let mut translator = translator(root);
        let dir = root.join("posts");

        let created = notify::Event::new(EventKind::Create(CreateKind::Folder)).add_path(dir.clone());
        assert_eq!(
            kinds(&translator.translate(&created)),
            vec![(RawEventKind::AddDir, "posts")]
        );

        // Removal without a hint is recognized through the known directory set.
        let removed = notify::Event::new(EventKind::Remove(RemoveKind::Any)).add_path(dir);
        assert_eq!(
            kinds(&translator.translate(&removed)),
            vec![(RawEventKind::UnlinkDir, "posts")]
        );
        assert_eq!(translator.known_directories(), 0);
    }

    #[test]
    fn test_rename_both_is_unlink_then_add() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("b.md"), "x").unwrap();
        let mut translator = translator(root);

        let event = notify::Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(root.join("a.md"))
            .add_path(root.join("b.md"));

        assert_eq!(
            kinds(&translator.translate(&event)),
            vec![(RawEventKind::Unlink, "a.md"), (RawEventKind::Add, "b.md")]
        );
    }

    #[test]
    fn test_excluded_and_foreign_paths_are_dropped() {
        let root = Path::new("/content");
        let mut translator = translator(root);

        let event = notify::Event::new(EventKind::Create(CreateKind::File))
            .add_path(root.join(".git/index"))
            .add_path(PathBuf::from("/elsewhere/a.md"));

        assert!(translator.translate(&event).is_empty());
    }

    #[test]
    fn test_metadata_and_access_are_ignored() {
        let root = Path::new("/content");
        let mut translator = translator(root);
        let path = root.join("a.md");

        let metadata = notify::Event::new(EventKind::Modify(ModifyKind::Metadata(
            notify::event::MetadataKind::WriteTime,
        )))
        .add_path(path.clone());
        let access = notify::Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(path);

        assert!(translator.translate(&metadata).is_empty());
        assert!(translator.translate(&access).is_empty());
    }

    #[test]
    fn test_index_directories() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("posts/2024")).unwrap();
        fs::write(temp_dir.path().join("posts/a.md"), "a").unwrap();

        let mut translator = translator(temp_dir.path());
        translator.index_directories(false);

        assert_eq!(translator.known_directories(), 2);
    }

    #[test]
    fn test_kind_serialization() {
        let event = RawFsEvent::new(RawEventKind::UnlinkDir, "posts");
        assert!(event.is_directory());
        assert_eq!(event.kind.as_str(), "unlinkDir");
    }
}
