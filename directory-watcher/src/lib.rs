//! # Directory Watcher
//!
//! This crate watches a content directory and reports primitive file system
//! events relative to it: `add`, `change`, `unlink`, `addDir`, `unlinkDir`.
//!
//! ## Features
//!
//! - **Real-time Watching**: recursive notify watch on the content root
//! - **Ignore Initial**: files that already exist produce no events
//! - **Exclusion Patterns**: filter out VCS and editor noise
//! - **Await Write Finish**: hold `add`/`change` until the file stops growing
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       Directory Watcher                          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │ notify ──► EventTranslator ──► await_write_finish ──► RawFsEvent │
//! │                   │                                              │
//! │                   ▼                                              │
//! │           WatchConfig (excludes)                                 │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod watcher;

pub use config::{AwaitWriteFinish, ExcludeSet, WatchConfig};
pub use error::{Result, WatcherError};
pub use event::{EventTranslator, RawEventKind, RawFsEvent};
pub use watcher::{DirectoryWatcher, RawEventReceiver};
