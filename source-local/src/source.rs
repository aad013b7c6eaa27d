//! The local content source: wires watcher, normalizer and synchronizer.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use contentsync_directory_watcher::{DirectoryWatcher, RawFsEvent};
use contentsync_schema::{SchemaDef, TypeRegistry};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info};

use crate::cache::Cache;
use crate::config::SourceConfig;
use crate::error::{Result, SourceError};
use crate::event::SyncEvent;
use crate::loader::DocumentLoader;
use crate::normalizer::{ChangeNormalizer, RawEventSource};
use crate::parser::{DocumentParser, FrontmatterParser};
use crate::scan::ContentScanner;
use crate::synchronizer::CacheSynchronizer;

type WatcherStream = ReceiverStream<contentsync_directory_watcher::Result<RawFsEvent>>;

/// A content source backed by a local directory.
pub struct LocalContentSource {
    config: SourceConfig,
    registry: Arc<TypeRegistry>,
    schema: Arc<SchemaDef>,
    parser: Arc<dyn DocumentParser>,
}

impl LocalContentSource {
    /// Validate the config and build the type registry and schema.
    pub fn new(config: SourceConfig) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(TypeRegistry::new(config.document_types.clone()));
        let schema = Arc::new(SchemaDef::from_registry(&registry)?);

        Ok(Self {
            config,
            registry,
            schema,
            parser: Arc::new(FrontmatterParser),
        })
    }

    /// Use a different parser.
    pub fn with_parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Schema metadata attached to every cache.
    pub fn provide_schema(&self) -> Arc<SchemaDef> {
        Arc::clone(&self.schema)
    }

    /// A fresh synchronizer in the `Uninitialized` state.
    pub fn synchronizer(&self) -> Result<CacheSynchronizer> {
        let loader = DocumentLoader::new(
            &self.config.content_dir_path,
            Arc::clone(&self.registry),
            Arc::clone(&self.parser),
            self.config.flags,
        );
        let scanner = ContentScanner::from_config(&self.config)?;

        Ok(CacheSynchronizer::new(
            loader,
            scanner,
            Arc::clone(&self.schema),
        ))
    }

    /// Stream cache snapshots.
    ///
    /// Without `watch` the stream yields exactly one item. With `watch` it
    /// yields one item after the initial load and one per later event,
    /// until a fatal error, which is yielded last. Must be called from
    /// within a tokio runtime.
    pub fn fetch_data(&self, watch: bool) -> Result<CacheStream> {
        info!(
            "Fetching documents from {} (watch: {watch})",
            self.config.content_dir_path.display()
        );

        if !watch {
            return self.spawn_pipeline(None::<WatcherStream>, None);
        }

        // Watch before the initial scan so no change falls between the two.
        let mut watcher = DirectoryWatcher::new(
            self.config
                .watch
                .to_watch_config(&self.config.content_dir_path),
        );
        let events = ReceiverStream::new(watcher.start()?);

        self.spawn_pipeline(Some(events), Some(watcher))
    }

    /// Stream cache snapshots driven by an arbitrary raw event source.
    ///
    /// The stream starts with the initial load, followed by one snapshot
    /// per event from `source`.
    pub fn fetch_data_from<S: RawEventSource>(&self, source: S) -> Result<CacheStream> {
        self.spawn_pipeline(Some(source), None)
    }

    fn spawn_pipeline<S: RawEventSource>(
        &self,
        source: Option<S>,
        watcher: Option<DirectoryWatcher>,
    ) -> Result<CacheStream> {
        let synchronizer = self.synchronizer()?;
        let capacity = self.config.watch.channel_capacity.max(1);

        let (mailbox_tx, mailbox_rx) = mpsc::channel(capacity);
        mailbox_tx
            .try_send(Ok(SyncEvent::Init))
            .map_err(|_| SourceError::ChannelClosed)?;

        let mut tasks = Vec::with_capacity(2);
        match source {
            Some(source) => tasks.push(tokio::spawn(
                ChangeNormalizer::new(source).run(mailbox_tx),
            )),
            // One-shot: the mailbox closes after the initial event.
            None => drop(mailbox_tx),
        }

        let (snapshot_tx, snapshot_rx) = mpsc::channel(capacity);
        tasks.push(tokio::spawn(run_synchronizer(
            synchronizer,
            mailbox_rx,
            snapshot_tx,
        )));

        Ok(CacheStream {
            inner: ReceiverStream::new(snapshot_rx),
            tasks,
            watcher,
        })
    }
}

/// Apply mailbox events in arrival order, one at a time.
async fn run_synchronizer(
    mut synchronizer: CacheSynchronizer,
    mut mailbox: mpsc::Receiver<Result<SyncEvent>>,
    snapshots: mpsc::Sender<Result<Cache>>,
) {
    while let Some(item) = mailbox.recv().await {
        let result = match item {
            Ok(event) => synchronizer.apply(event).await,
            Err(e) => {
                error!("Event source failed: {e}");
                Err(e)
            }
        };

        let fatal = result.is_err();
        if snapshots.send(result).await.is_err() {
            debug!("Snapshot stream dropped, stopping synchronizer");
            return;
        }
        if fatal {
            return;
        }
    }

    debug!("Mailbox closed, synchronizer finished");
}

/// Stream of cache snapshots returned by [`LocalContentSource::fetch_data`].
///
/// Dropping the stream stops the watcher and the background tasks.
pub struct CacheStream {
    inner: ReceiverStream<Result<Cache>>,
    tasks: Vec<JoinHandle<()>>,
    watcher: Option<DirectoryWatcher>,
}

impl CacheStream {
    /// Whether a directory watcher feeds this stream.
    pub fn is_watching(&self) -> bool {
        self.watcher.as_ref().is_some_and(DirectoryWatcher::is_running)
    }
}

impl Stream for CacheStream {
    type Item = Result<Cache>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl Drop for CacheStream {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
