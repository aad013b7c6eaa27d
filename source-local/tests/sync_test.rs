use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use contentsync_directory_watcher::{RawEventKind, RawFsEvent, WatcherError};
use contentsync_schema::{DocumentTypeDef, FieldDef, FieldKind};
use contentsync_source_local::{
    Cache, CacheStream, DocumentParser, FrontmatterParser, LocalContentSource,
    OnMissingOrIncompatibleData, ParseError, ParsedDocument, SourceConfig, SourceError, SyncFlags,
};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

type RawSender = mpsc::Sender<contentsync_directory_watcher::Result<RawFsEvent>>;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn config(root: &Path) -> SourceConfig {
    SourceConfig::new(root).with_document_type(
        DocumentTypeDef::new("post", "posts/*.md")
            .unwrap()
            .with_field(FieldDef::new("title", FieldKind::String).required()),
    )
}

fn ids(cache: &Cache) -> Vec<String> {
    cache.ids().map(str::to_string).collect()
}

async fn next(stream: &mut CacheStream) -> Cache {
    tokio::time::timeout(Duration::from_secs(10), stream.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap()
}

fn scripted(source: &LocalContentSource) -> (RawSender, CacheStream) {
    let (tx, rx) = mpsc::channel(16);
    let stream = source.fetch_data_from(ReceiverStream::new(rx)).unwrap();
    (tx, stream)
}

async fn send(tx: &RawSender, kind: RawEventKind, path: &str) {
    tx.send(Ok(RawFsEvent::new(kind, path))).await.unwrap();
}

#[tokio::test]
async fn test_one_shot_and_incremental_updates() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "posts/a.md", "---\ntitle: A\n---\n");
    write(root, "posts/b.md", "---\ntitle: B\n---\n");

    let source = LocalContentSource::new(config(root)).unwrap();

    let mut one_shot = source.fetch_data(false).unwrap();
    let cache = next(&mut one_shot).await;
    assert_eq!(ids(&cache), vec!["posts/a.md", "posts/b.md"]);
    assert!(one_shot.next().await.is_none());

    let (tx, mut stream) = scripted(&source);
    assert_eq!(next(&mut stream).await.len(), 2);

    write(root, "posts/a.md", "---\ntitle: A2\n---\n");
    send(&tx, RawEventKind::Change, "posts/a.md").await;
    let cache = next(&mut stream).await;
    assert_eq!(cache.len(), 2);
    assert_eq!(
        cache.get("posts/a.md").unwrap().field("title"),
        Some(&serde_json::json!("A2"))
    );

    fs::remove_file(root.join("posts/b.md")).unwrap();
    send(&tx, RawEventKind::Unlink, "posts/b.md").await;
    let cache = next(&mut stream).await;
    assert_eq!(ids(&cache), vec!["posts/a.md"]);
}

#[tokio::test]
async fn test_directory_event_reloads_everything() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "posts/a.md", "---\ntitle: A\n---\n");

    let source = LocalContentSource::new(config(root)).unwrap();
    let (tx, mut stream) = scripted(&source);
    assert_eq!(next(&mut stream).await.len(), 1);

    fs::remove_dir_all(root.join("posts")).unwrap();
    write(root, "posts/c.md", "---\ntitle: C\n---\n");
    send(&tx, RawEventKind::AddDir, "posts").await;

    assert_eq!(ids(&next(&mut stream).await), vec!["posts/c.md"]);
}

/// Delays every parse so a later event would overtake it if events were
/// applied concurrently.
struct SlowParser;

#[async_trait]
impl DocumentParser for SlowParser {
    async fn parse(
        &self,
        content_dir_path: &Path,
        type_def: &DocumentTypeDef,
        relative_file_path: &str,
    ) -> Result<ParsedDocument, ParseError> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        FrontmatterParser
            .parse(content_dir_path, type_def, relative_file_path)
            .await
    }
}

#[tokio::test]
async fn test_slow_update_followed_by_delete_applies_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "posts/a.md", "---\ntitle: A\n---\n");

    let source = LocalContentSource::new(config(root))
        .unwrap()
        .with_parser(Arc::new(SlowParser));
    let (tx, mut stream) = scripted(&source);
    assert_eq!(next(&mut stream).await.len(), 1);

    // Both events are queued before the slow update finishes loading.
    send(&tx, RawEventKind::Change, "posts/a.md").await;
    send(&tx, RawEventKind::Unlink, "posts/a.md").await;

    let after_update = next(&mut stream).await;
    let after_delete = next(&mut stream).await;

    assert!(after_update.contains("posts/a.md"));
    assert!(!after_delete.contains("posts/a.md"));
}

#[tokio::test]
async fn test_update_for_removed_file_then_delete() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "posts/a.md", "---\ntitle: A\n---\n");
    write(root, "posts/b.md", "---\ntitle: B\n---\n");

    let source = LocalContentSource::new(config(root)).unwrap();
    let (tx, mut stream) = scripted(&source);
    assert_eq!(next(&mut stream).await.len(), 2);

    // The file is gone before its queued update runs.
    fs::remove_file(root.join("posts/a.md")).unwrap();
    send(&tx, RawEventKind::Change, "posts/a.md").await;
    send(&tx, RawEventKind::Unlink, "posts/a.md").await;

    assert_eq!(ids(&next(&mut stream).await), vec!["posts/b.md"]);
    assert_eq!(ids(&next(&mut stream).await), vec!["posts/b.md"]);

    // The session is still alive.
    write(root, "posts/c.md", "---\ntitle: C\n---\n");
    send(&tx, RawEventKind::Add, "posts/c.md").await;
    assert_eq!(
        ids(&next(&mut stream).await),
        vec!["posts/b.md", "posts/c.md"]
    );
}

#[tokio::test]
async fn test_dot_prefixed_path_updates_existing_entry() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "posts/a.md", "---\ntitle: A\n---\n");

    let source = LocalContentSource::new(config(root)).unwrap();
    let (tx, mut stream) = scripted(&source);
    assert_eq!(next(&mut stream).await.len(), 1);

    write(root, "posts/a.md", "---\ntitle: A2\n---\n");
    send(&tx, RawEventKind::Change, "./posts/a.md").await;
    let cache = next(&mut stream).await;
    assert_eq!(ids(&cache), vec!["posts/a.md"]);
    assert_eq!(
        cache.get("posts/a.md").unwrap().field("title"),
        Some(&serde_json::json!("A2"))
    );

    fs::remove_file(root.join("posts/a.md")).unwrap();
    send(&tx, RawEventKind::Unlink, "./posts/a.md").await;
    assert!(next(&mut stream).await.is_empty());
}

#[tokio::test]
async fn test_fatal_load_ends_stream() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "posts/a.md", "---\ntitle: A\n---\n");

    let flags = SyncFlags::default()
        .with_on_missing_or_incompatible_data(OnMissingOrIncompatibleData::Fail);
    let source = LocalContentSource::new(config(root).with_flags(flags)).unwrap();
    let (tx, mut stream) = scripted(&source);
    assert_eq!(next(&mut stream).await.len(), 1);

    write(root, "posts/b.md", "---\nsummary: no title\n---\n");
    send(&tx, RawEventKind::Add, "posts/b.md").await;

    let err = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        SourceError::Load {
            source: ParseError::MissingOrIncompatible { .. },
            ..
        }
    ));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_watcher_failure_ends_stream() {
    let temp_dir = TempDir::new().unwrap();
    let source = LocalContentSource::new(config(temp_dir.path())).unwrap();
    let (tx, mut stream) = scripted(&source);
    assert!(next(&mut stream).await.is_empty());

    tx.send(Err(WatcherError::DirectoryNotFound(
        temp_dir.path().display().to_string(),
    )))
    .await
    .unwrap();

    assert!(matches!(
        stream.next().await,
        Some(Err(SourceError::Watcher(_)))
    ));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_watch_mode_picks_up_new_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "posts/a.md", "---\ntitle: A\n---\n");

    let source = LocalContentSource::new(config(root)).unwrap();
    let mut stream = source.fetch_data(true).unwrap();
    assert!(stream.is_watching());
    assert_eq!(next(&mut stream).await.len(), 1);

    write(root, "posts/b.md", "---\ntitle: B\n---\n");

    let found = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(cache) = stream.next().await {
            if cache.unwrap().contains("posts/b.md") {
                return true;
            }
        }
        false
    })
    .await
    .unwrap();

    assert!(found);
}
