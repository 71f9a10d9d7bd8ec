//! filesync-core: one-way directory synchronization engine
//!
//! Brings the top-level regular files of a destination directory in line
//! with a source directory. Files are copied when missing or stale, skipped
//! when identical or newer in the destination, and never deleted.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod hash;
pub mod resolve;
pub mod scan;
pub mod transfer;

pub use classify::{SyncDecision, classify};
pub use config::SyncOptions;
pub use engine::{FileFailure, SyncReport, Syncer};
pub use error::{Result, SyncError};
pub use event::{Reporter, SyncEvent};
pub use hash::ContentHash;
pub use resolve::{DestinationStatus, SyncTask};
pub use scan::{DEFAULT_MAX_FILES, FileEntry, ScanOutcome, Scanner};
pub use transfer::copy_entry;
