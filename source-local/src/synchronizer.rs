//! The cache synchronizer: a state machine applying one event at a time.
//!
//! ```text
//!   Uninitialized ──Init──► Ready(cache) ──Init / Updated / Deleted──► Ready(cache')
//!         │                      │
//!         └──── fatal error ─────┴──────────► Failed (terminal)
//! ```
//!
//! Each call to [`CacheSynchronizer::apply`] runs its load to completion
//! before committing, so events commit in the order they are applied.

use std::sync::Arc;

use contentsync_schema::{SchemaDef, normalize_relative_path, resolve_type};
use tracing::{debug, error, info, warn};

use crate::cache::Cache;
use crate::error::{Result, SourceError};
use crate::event::SyncEvent;
use crate::loader::{DocumentLoader, LoadOutcome};
use crate::scan::ContentScanner;

/// Lifecycle of a synchronizer.
#[derive(Debug, Clone)]
pub enum SyncState {
    /// No initial load yet.
    Uninitialized,

    /// The cache reflects every event applied so far.
    Ready(Cache),

    /// A fatal error occurred. No further events are applied.
    Failed {
        reason: String,
        last_good: Option<Cache>,
    },
}

impl SyncState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Sole owner of the cache.
#[derive(Debug)]
pub struct CacheSynchronizer {
    loader: DocumentLoader,
    scanner: ContentScanner,
    schema: Arc<SchemaDef>,
    state: SyncState,
}

impl CacheSynchronizer {
    pub fn new(loader: DocumentLoader, scanner: ContentScanner, schema: Arc<SchemaDef>) -> Self {
        Self {
            loader,
            scanner,
            schema,
            state: SyncState::Uninitialized,
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// The current cache, if ready.
    pub fn cache(&self) -> Option<&Cache> {
        match &self.state {
            SyncState::Ready(cache) => Some(cache),
            _ => None,
        }
    }

    /// Apply one event and return the resulting snapshot.
    ///
    /// An incremental event before the first `Init` is rejected with
    /// [`SourceError::NotInitialized`] and leaves the state unchanged. A
    /// fatal load error moves the synchronizer to [`SyncState::Failed`]
    /// without touching the cache; later calls return
    /// [`SourceError::Failed`].
    ///
    /// Paths are normalized before use, so `./posts/a.md` and
    /// `posts/a.md` address the same entry.
    pub async fn apply(&mut self, event: SyncEvent) -> Result<Cache> {
        if let SyncState::Failed { reason, .. } = &self.state {
            return Err(SourceError::Failed(reason.clone()));
        }

        debug!("Applying {} event", event.tag());

        match event {
            SyncEvent::Init => self.reload().await,
            SyncEvent::Updated { relative_file_path } => {
                self.update(&normalize_relative_path(&relative_file_path)).await
            }
            SyncEvent::Deleted { relative_file_path } => {
                self.delete(&normalize_relative_path(&relative_file_path))
            }
        }
    }

    async fn reload(&mut self) -> Result<Cache> {
        match self.scanner.scan(&self.loader).await {
            Ok(documents) => {
                let cache = Cache::from_documents(Arc::clone(&self.schema), documents);
                info!("Loaded {} documents", cache.len());
                self.state = SyncState::Ready(cache.clone());
                Ok(cache)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn update(&mut self, relative_file_path: &str) -> Result<Cache> {
        if !self.state.is_ready() {
            return Err(SourceError::NotInitialized);
        }

        let Some(type_name) = resolve_type(relative_file_path, self.loader.registry()) else {
            warn!("No matching document type found for {relative_file_path}");
            return self.snapshot();
        };
        let type_name = type_name.to_string();

        // Load before borrowing the cache so a failure leaves it untouched.
        let outcome = match self.loader.load(&type_name, relative_file_path).await {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail(e)),
        };

        let SyncState::Ready(cache) = &mut self.state else {
            return Err(SourceError::NotInitialized);
        };
        match outcome {
            LoadOutcome::Loaded(document) => cache.upsert(document),
            LoadOutcome::Omitted => {
                cache.remove(relative_file_path);
            }
        }

        Ok(cache.clone())
    }

    fn delete(&mut self, relative_file_path: &str) -> Result<Cache> {
        let SyncState::Ready(cache) = &mut self.state else {
            return Err(SourceError::NotInitialized);
        };

        if !cache.remove(relative_file_path) {
            debug!("Deleted {relative_file_path} was not cached");
        }

        Ok(cache.clone())
    }

    fn snapshot(&self) -> Result<Cache> {
        self.cache().cloned().ok_or(SourceError::NotInitialized)
    }

    /// Enter the terminal state, keeping the last good cache.
    fn fail(&mut self, e: SourceError) -> SourceError {
        error!("Synchronization failed: {e}");

        let last_good = match std::mem::replace(&mut self.state, SyncState::Uninitialized) {
            SyncState::Ready(cache) => Some(cache),
            SyncState::Failed { last_good, .. } => last_good,
            SyncState::Uninitialized => None,
        };
        self.state = SyncState::Failed {
            reason: e.to_string(),
            last_good,
        };

        e
    }
}
