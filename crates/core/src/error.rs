//! Error taxonomy for a synchronization run
//!
//! Fatal variants abort the run. `Stat` and `Copy` are per-file and are
//! collected by the engine instead of being propagated.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

/// Errors produced while resolving, scanning, classifying or copying
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The source path does not exist, cannot be resolved, or is not a directory
    #[error("Source directory '{}' does not exist.", path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The destination exists but is unusable, or could not be created
    #[error("Destination directory '{}' is invalid", path.display())]
    DestinationInvalid {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The resolved source directory could not be listed
    #[error("Failed to open source directory '{}'", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The worker pool for concurrent entries could not be started
    #[error("cannot start {jobs} sync workers")]
    WorkerPool {
        jobs: usize,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },

    /// Metadata or content of one entry could not be read
    #[error("cannot inspect {}: {source}", name.to_string_lossy())]
    Stat {
        name: OsString,
        #[source]
        source: io::Error,
    },

    /// One entry could not be copied into the destination
    #[error("cannot copy {}: {source}", name.to_string_lossy())]
    Copy {
        name: OsString,
        #[source]
        source: io::Error,
    },
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_not_found_message() {
        let err = SyncError::SourceNotFound {
            path: PathBuf::from("nonexistent_src"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(
            err.to_string(),
            "Source directory 'nonexistent_src' does not exist."
        );
    }

    #[test]
    fn test_per_file_errors_name_the_file() {
        let err = SyncError::Copy {
            name: OsString::from("a.txt"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().starts_with("cannot copy a.txt: "));
    }
}
