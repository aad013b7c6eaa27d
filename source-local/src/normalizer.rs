//! Mapping raw file system events to synchronization events.

use contentsync_directory_watcher::{RawEventKind, RawFsEvent};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::{Result, SourceError};
use crate::event::SyncEvent;

/// A stream of raw events, as produced by the directory watcher.
pub trait RawEventSource:
    Stream<Item = contentsync_directory_watcher::Result<RawFsEvent>> + Send + Unpin + 'static
{
}

impl<S> RawEventSource for S where
    S: Stream<Item = contentsync_directory_watcher::Result<RawFsEvent>> + Send + Unpin + 'static
{
}

/// Map one raw event.
///
/// Directory changes can move files between document types, so they
/// trigger a full reload.
pub fn normalize(event: &RawFsEvent) -> SyncEvent {
    match event.kind {
        RawEventKind::Add | RawEventKind::Change => SyncEvent::updated(&event.relative_path),
        RawEventKind::Unlink => SyncEvent::deleted(&event.relative_path),
        RawEventKind::AddDir | RawEventKind::UnlinkDir => SyncEvent::Init,
    }
}

/// Forwards normalized events from a raw source into the synchronizer's
/// mailbox.
pub struct ChangeNormalizer<S> {
    source: S,
}

impl<S: RawEventSource> ChangeNormalizer<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Run until the source ends, the source fails, or the mailbox closes.
    ///
    /// A source failure is forwarded as the last item.
    pub async fn run(mut self, mailbox: mpsc::Sender<Result<SyncEvent>>) {
        while let Some(item) = self.source.next().await {
            let event = match item {
                Ok(raw) => {
                    let event = normalize(&raw);
                    match event.relative_file_path() {
                        Some(path) => info!("Watch event \"{}\": {path}", event.tag()),
                        None => info!(
                            "Watch event \"{}\": {}, reloading all documents",
                            raw.kind.as_str(),
                            raw.relative_path
                        ),
                    }
                    Ok(event)
                }
                Err(e) => Err(SourceError::Watcher(e)),
            };

            let failed = event.is_err();
            if mailbox.send(event).await.is_err() {
                debug!("Mailbox closed, stopping change normalizer");
                return;
            }
            if failed {
                return;
            }
        }

        debug!("Raw event source ended");
    }
}
