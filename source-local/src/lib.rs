//! # Local Content Source
//!
//! Keeps an in-memory cache of documents in sync with a content directory.
//!
//! - **Document Loader**: parses one file through a [`DocumentParser`] and
//!   applies the extra / missing data flags
//! - **Change Normalizer**: maps raw file system events to [`SyncEvent`]s
//! - **Cache Synchronizer**: owns the cache and applies one event at a time
//! - **Content Source**: wires the pieces into a stream of cache snapshots
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Local Content Source                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  DirectoryWatcher ──► ChangeNormalizer ──► mailbox (SyncEvent)  │
//! │                                                │                │
//! │                                                ▼                │
//! │  resolve_type ◄── CacheSynchronizer ──► DocumentLoader          │
//! │                          │                                      │
//! │                          ▼                                      │
//! │                   CacheStream (snapshots)                       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use contentsync_source_local::{LocalContentSource, SourceConfig};
//! use futures::StreamExt;
//!
//! let source = LocalContentSource::new(SourceConfig::load("contentsync.toml")?)?;
//! let mut snapshots = source.fetch_data(true)?;
//!
//! while let Some(cache) = snapshots.next().await {
//!     println!("{} documents", cache?.len());
//! }
//! ```

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod flags;
pub mod loader;
pub mod normalizer;
pub mod parser;
pub mod scan;
pub mod source;
pub mod synchronizer;

pub use cache::Cache;
pub use config::{SourceConfig, WatchOptions};
pub use document::{ContentType, Document, RawDocumentData};
pub use error::{FieldProblem, ParseError, Result, SourceError};
pub use event::SyncEvent;
pub use flags::{OnExtraData, OnMissingOrIncompatibleData, SyncFlags};
pub use loader::{DocumentLoader, LoadOutcome};
pub use normalizer::{ChangeNormalizer, RawEventSource, normalize};
pub use parser::{DocumentParser, FrontmatterParser, ParsedDocument};
pub use scan::ContentScanner;
pub use source::{CacheStream, LocalContentSource};
pub use synchronizer::{CacheSynchronizer, SyncState};

// Re-export from dependencies for convenience
pub use contentsync_directory_watcher::{RawEventKind, RawFsEvent};
pub use contentsync_schema::{DocumentTypeDef, FieldDef, FieldKind, SchemaDef, TypeRegistry};
