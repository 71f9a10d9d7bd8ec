//! Status events emitted during a run, one per line of user-facing output

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use crate::classify::SyncDecision;

/// A user-facing status event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The destination tree did not exist and was created
    DestinationCreated { path: PathBuf },
    /// Working directory the run was started from
    WorkingDirectory { path: PathBuf },
    /// Resolved roots of the run
    Synchronizing {
        source: PathBuf,
        destination: PathBuf,
    },
    /// The capacity cap dropped part of the scan
    ScanTruncated { found: usize, kept: usize },
    /// An entry was classified
    Decided {
        name: OsString,
        decision: SyncDecision,
    },
    /// An entry was transferred
    Copied {
        source: PathBuf,
        destination: PathBuf,
    },
    /// An entry could not be classified or copied
    Failed { name: OsString, reason: String },
    /// The run stopped before processing every entry
    Cancelled,
    /// The run finished
    Complete,
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DestinationCreated { path } => {
                write!(f, "Created destination directory '{}'.", path.display())
            }
            Self::WorkingDirectory { path } => {
                write!(f, "Current working directory: {}", path.display())
            }
            Self::Synchronizing {
                source,
                destination,
            } => write!(
                f,
                "Synchronizing from {} to {}",
                source.display(),
                destination.display()
            ),
            Self::ScanTruncated { found, kept } => write!(
                f,
                "Warning: source has {found} regular files; only the first {kept} will be synchronized."
            ),
            Self::Decided { name, decision } => {
                let name = name.to_string_lossy();
                match decision {
                    SyncDecision::New => write!(f, "New file found: {name}"),
                    SyncDecision::Identical => write!(f, "File {name} is identical. Skipping..."),
                    SyncDecision::UpdateFromSource => {
                        write!(f, "File {name} is newer in source. Updating...")
                    }
                    SyncDecision::DestinationNewer => {
                        write!(f, "File {name} is newer in destination. Skipping...")
                    }
                }
            }
            Self::Copied {
                source,
                destination,
            } => write!(
                f,
                "Copied: {} -> {}",
                source.display(),
                destination.display()
            ),
            Self::Failed { name, reason } => {
                write!(f, "Error: {}: {reason}", name.to_string_lossy())
            }
            Self::Cancelled => f.write_str("Synchronization cancelled."),
            Self::Complete => f.write_str("Synchronization complete."),
        }
    }
}

/// Sink for status events
pub trait Reporter {
    fn report(&mut self, event: &SyncEvent);
}

impl Reporter for Vec<SyncEvent> {
    fn report(&mut self, event: &SyncEvent) {
        self.push(event.clone());
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, event: &SyncEvent) {
        (**self).report(event);
    }
}
