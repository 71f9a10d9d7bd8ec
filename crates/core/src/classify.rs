//! Change classification for a single entry
//!
//! Content equality always wins over timestamps: a byte-identical file is
//! never re-copied, whatever its modification time says.

use std::fs::Metadata;
use std::io;

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::hash::ContentHash;
use crate::scan::FileEntry;

/// What a run should do with one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDecision {
    /// Destination file is absent
    New,
    /// Destination file has the same content
    Identical,
    /// Content differs and the source was modified strictly later
    UpdateFromSource,
    /// Content differs and the source is not strictly newer
    DestinationNewer,
}

impl SyncDecision {
    /// Whether this decision leads to a transfer
    #[must_use]
    pub fn needs_copy(self) -> bool {
        matches!(self, Self::New | Self::UpdateFromSource)
    }
}

/// Classify one scanned entry against its destination counterpart
///
/// # Errors
/// Returns [`SyncError::Stat`] if either file cannot be inspected or read
pub fn classify(entry: &FileEntry) -> Result<SyncDecision> {
    let stat_err = |source| SyncError::Stat {
        name: entry.name.clone(),
        source,
    };

    let dest_meta = match std::fs::metadata(&entry.dest_path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(name = ?entry.name, "destination absent");
            return Ok(SyncDecision::New);
        }
        Err(e) => return Err(stat_err(e)),
    };
    let source_meta = std::fs::metadata(&entry.source_path).map_err(stat_err)?;

    if !dest_meta.is_file() {
        return Err(stat_err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "destination exists but is not a regular file",
        )));
    }

    if same_content(entry, &source_meta, &dest_meta).map_err(stat_err)? {
        debug!(name = ?entry.name, "content identical");
        return Ok(SyncDecision::Identical);
    }

    let source_mtime = source_meta.modified().map_err(stat_err)?;
    let dest_mtime = dest_meta.modified().map_err(stat_err)?;
    debug!(name = ?entry.name, ?source_mtime, ?dest_mtime, "content differs");

    // Ties keep the destination
    if source_mtime > dest_mtime {
        Ok(SyncDecision::UpdateFromSource)
    } else {
        Ok(SyncDecision::DestinationNewer)
    }
}

fn same_content(
    entry: &FileEntry,
    source_meta: &Metadata,
    dest_meta: &Metadata,
) -> io::Result<bool> {
    if source_meta.len() != dest_meta.len() {
        debug!(
            name = ?entry.name,
            source_len = source_meta.len(),
            dest_len = dest_meta.len(),
            "sizes differ"
        );
        return Ok(false);
    }

    let source_hash = ContentHash::from_file(&entry.source_path)?;
    let dest_hash = ContentHash::from_file(&entry.dest_path)?;
    debug!(name = ?entry.name, source = %source_hash, dest = %dest_hash, "hashed");
    Ok(source_hash == dest_hash)
}
