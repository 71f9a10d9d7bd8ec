//! Single-level scanning of the source root

use std::ffi::OsString;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::{Result, SyncError};
use crate::resolve::SyncTask;

/// Number of files tracked per run unless configured otherwise
pub const DEFAULT_MAX_FILES: usize = 100;

/// One regular file found directly under the source root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Base filename, unique within a scan
    pub name: OsString,
    /// Absolute path in the source tree
    pub source_path: PathBuf,
    /// Absolute path the file maps to in the destination tree
    pub dest_path: PathBuf,
}

/// Result of scanning a source root
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Entries in byte-wise lexicographic order of `name`
    pub entries: Vec<FileEntry>,
    /// Number of regular files found, when the cap dropped some of them
    pub truncated_from: Option<usize>,
}

/// Scanner for the top level of a source directory
pub struct Scanner<'a> {
    task: &'a SyncTask,
    max_files: Option<usize>,
}

impl<'a> Scanner<'a> {
    /// Create a scanner with the default capacity cap
    #[must_use]
    pub fn new(task: &'a SyncTask) -> Self {
        Self {
            task,
            max_files: Some(DEFAULT_MAX_FILES),
        }
    }

    /// Set the capacity cap; `None` tracks every file
    #[must_use]
    pub fn max_files(mut self, max_files: Option<usize>) -> Self {
        self.max_files = max_files;
        self
    }

    /// Scan the source root and return its regular files, sorted by name
    ///
    /// Symlinks are followed, so a link to a regular file is included while
    /// links to directories and broken links are not.
    ///
    /// # Errors
    /// Returns [`SyncError::Scan`] if the directory cannot be listed
    pub fn scan(&self) -> Result<ScanOutcome> {
        let root = self.task.source_root();
        let scan_err = |source| SyncError::Scan {
            path: root.to_path_buf(),
            source,
        };

        let mut names = Vec::new();
        for entry in std::fs::read_dir(root).map_err(scan_err)? {
            let entry = entry.map_err(scan_err)?;
            let path = entry.path();

            match std::fs::metadata(&path) {
                Ok(metadata) if metadata.is_file() => names.push(entry.file_name()),
                Ok(_) => debug!("skipping non-regular entry {}", path.display()),
                Err(e) => debug!("skipping unreadable entry {}: {e}", path.display()),
            }
        }

        // Sort for deterministic ordering
        names.sort();

        let mut truncated_from = None;
        let cap = self.max_files.unwrap_or(usize::MAX);
        if names.len() > cap {
            warn!(
                "source has {} regular files; only the first {cap} will be synchronized",
                names.len()
            );
            truncated_from = Some(names.len());
            names.truncate(cap);
        }

        let entries = names
            .into_iter()
            .map(|name| FileEntry {
                source_path: root.join(&name),
                dest_path: self.task.dest_root().join(&name),
                name,
            })
            .collect();

        Ok(ScanOutcome {
            entries,
            truncated_from,
        })
    }
}
