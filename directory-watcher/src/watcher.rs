//! Directory watcher implementation.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::config::{AwaitWriteFinish, WatchConfig};
use crate::error::{Result, WatcherError};
use crate::event::{EventTranslator, RawEventKind, RawFsEvent};

/// Receiving end of a running watcher.
///
/// An `Err` item reports a failure of the underlying notify backend.
pub type RawEventReceiver = mpsc::Receiver<Result<RawFsEvent>>;

/// Watcher that reports changes below a content directory.
///
/// Only changes made after [`DirectoryWatcher::start`] are reported; files
/// that already exist produce no events.
pub struct DirectoryWatcher {
    /// Watch configuration.
    config: WatchConfig,

    /// Internal notify watcher.
    watcher: Option<RecommendedWatcher>,

    /// Task translating notify events into raw events.
    forwarder: Option<JoinHandle<()>>,
}

impl DirectoryWatcher {
    /// Create a new directory watcher.
    pub fn new(config: WatchConfig) -> Self {
        Self {
            config,
            watcher: None,
            forwarder: None,
        }
    }

    /// Get the watch configuration.
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Check if the watcher is running.
    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }

    /// Start watching the configured root.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<RawEventReceiver> {
        let path = self.config.root.clone();

        if self.is_running() {
            return Err(WatcherError::AlreadyWatching(path.display().to_string()));
        }

        // Validate path exists
        if !path.exists() {
            return Err(WatcherError::DirectoryNotFound(path.display().to_string()));
        }

        if !path.is_dir() {
            return Err(WatcherError::NotADirectory(path.display().to_string()));
        }

        let root = std::fs::canonicalize(&path)?;
        let mut translator = EventTranslator::new(&root, self.config.compile_excludes()?);
        translator.index_directories(self.config.follow_symlinks);

        let capacity = self.config.channel_capacity.max(1);
        let (notify_tx, notify_rx) = mpsc::channel(capacity);
        let (event_tx, event_rx) = mpsc::channel(capacity);

        // Create the notify watcher
        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| {
                if notify_tx.blocking_send(res).is_err() {
                    debug!("Dropping notify event, watcher is shutting down");
                }
            },
        )?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        let forwarder = tokio::spawn(forward_events(
            root.clone(),
            translator,
            self.config.await_write_finish,
            notify_rx,
            event_tx,
        ));

        self.watcher = Some(watcher);
        self.forwarder = Some(forwarder);
        info!("Watching content directory: {}", root.display());

        Ok(event_rx)
    }

    /// Stop watching.
    pub fn stop(&mut self) {
        // Dropping the notify watcher releases its watches.
        if self.watcher.take().is_some() {
            info!("Directory watcher stopped");
        }
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn forward_events(
    root: PathBuf,
    mut translator: EventTranslator,
    await_write_finish: Option<AwaitWriteFinish>,
    mut notify_rx: mpsc::Receiver<std::result::Result<notify::Event, notify::Error>>,
    event_tx: mpsc::Sender<Result<RawFsEvent>>,
) {
    while let Some(res) = notify_rx.recv().await {
        let events = match res {
            Ok(event) => translator.translate(&event),
            Err(e) => {
                error!("Watch error: {e}");
                if event_tx.send(Err(WatcherError::Notify(e))).await.is_err() {
                    return;
                }
                continue;
            }
        };

        for event in events {
            if let (Some(options), RawEventKind::Add | RawEventKind::Change) =
                (await_write_finish, event.kind)
            {
                wait_for_write_finish(&root.join(&event.relative_path), options).await;
            }

            debug!("Raw event {}: {}", event.kind.as_str(), event.relative_path);
            if event_tx.send(Ok(event)).await.is_err() {
                return;
            }
        }
    }
}

/// Wait until the file's size and mtime stop changing.
///
/// Returns immediately once the file is gone; the removal is reported by
/// its own event.
async fn wait_for_write_finish(path: &Path, options: AwaitWriteFinish) {
    let mut last = file_signature(path).await;
    let mut stable_since = Instant::now();

    while last.is_some() {
        if stable_since.elapsed() >= options.stability_threshold() {
            return;
        }

        tokio::time::sleep(options.poll_interval()).await;

        let current = file_signature(path).await;
        if current != last {
            last = current;
            stable_since = Instant::now();
        }
    }
}

async fn file_signature(path: &Path) -> Option<(u64, Option<SystemTime>)> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    Some((metadata.len(), metadata.modified().ok()))
}
