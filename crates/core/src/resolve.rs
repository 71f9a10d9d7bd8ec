//! Resolution of the source and destination roots

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, SyncError};

/// The two canonical roots of a synchronization run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTask {
    source_root: PathBuf,
    dest_root: PathBuf,
}

/// Whether resolution had to create the destination tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationStatus {
    Existing,
    Created,
}

impl SyncTask {
    /// Resolve user-supplied paths into canonical absolute roots.
    ///
    /// The destination, and any missing ancestors, are created when absent.
    /// The source tree is never modified.
    ///
    /// # Errors
    /// Returns [`SyncError::SourceNotFound`] if the source is not an existing
    /// directory, and [`SyncError::DestinationInvalid`] if the destination
    /// cannot be resolved or created as a directory.
    pub fn resolve(
        source: impl AsRef<Path>,
        dest: impl AsRef<Path>,
    ) -> Result<(Self, DestinationStatus)> {
        let source = source.as_ref();
        let dest = dest.as_ref();

        let source_root = resolve_source(source)?;
        let (dest_root, status) = resolve_destination(dest)?;

        debug!(
            source = %source_root.display(),
            dest = %dest_root.display(),
            ?status,
            "resolved sync roots"
        );

        Ok((
            Self {
                source_root,
                dest_root,
            },
            status,
        ))
    }

    /// Canonical source directory
    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Canonical destination directory
    #[must_use]
    pub fn dest_root(&self) -> &Path {
        &self.dest_root
    }
}

fn resolve_source(path: &Path) -> Result<PathBuf> {
    let not_found = |source| SyncError::SourceNotFound {
        path: path.to_path_buf(),
        source,
    };

    let resolved = std::fs::canonicalize(path).map_err(not_found)?;
    if !resolved.is_dir() {
        return Err(not_found(io::Error::new(
            io::ErrorKind::NotADirectory,
            "source is not a directory",
        )));
    }
    Ok(resolved)
}

fn resolve_destination(path: &Path) -> Result<(PathBuf, DestinationStatus)> {
    let invalid = |source| SyncError::DestinationInvalid {
        path: path.to_path_buf(),
        source,
    };

    let (resolved, status) = match std::fs::canonicalize(path) {
        Ok(resolved) => (resolved, DestinationStatus::Existing),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            std::fs::create_dir_all(path).map_err(invalid)?;
            info!("created destination directory {}", path.display());
            let resolved = std::fs::canonicalize(path).map_err(invalid)?;
            (resolved, DestinationStatus::Created)
        }
        Err(e) => return Err(invalid(e)),
    };

    if !resolved.is_dir() {
        return Err(invalid(io::Error::new(
            io::ErrorKind::NotADirectory,
            "destination is not a directory",
        )));
    }

    Ok((resolved, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_existing_roots() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::create_dir(dir.path().join("dst")).unwrap();

        let (task, status) =
            SyncTask::resolve(dir.path().join("src"), dir.path().join("dst")).unwrap();

        assert_eq!(status, DestinationStatus::Existing);
        assert!(task.source_root().is_absolute());
        assert_eq!(
            task.dest_root(),
            fs::canonicalize(dir.path().join("dst")).unwrap()
        );
    }

    #[test]
    fn test_resolve_creates_nested_destination() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        let dest = dir.path().join("new1/new2/new3");

        let (task, status) = SyncTask::resolve(dir.path().join("src"), &dest).unwrap();

        assert_eq!(status, DestinationStatus::Created);
        assert!(dest.is_dir());
        assert_eq!(task.dest_root(), fs::canonicalize(&dest).unwrap());
    }

    #[test]
    fn test_resolve_normalizes_relative_components() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/inner")).unwrap();
        fs::create_dir(dir.path().join("dst")).unwrap();

        let (task, _) =
            SyncTask::resolve(dir.path().join("src/inner/.."), dir.path().join("dst")).unwrap();

        assert_eq!(
            task.source_root(),
            fs::canonicalize(dir.path().join("src")).unwrap()
        );
    }

    #[test]
    fn test_missing_source_is_fatal_and_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("dst");

        let err = SyncTask::resolve(dir.path().join("missing"), &dest).unwrap_err();

        assert!(matches!(err, SyncError::SourceNotFound { .. }));
        assert!(!dest.exists(), "destination must not be created");
    }

    #[test]
    fn test_source_file_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("file.txt"), "x").unwrap();

        let err = SyncTask::resolve(dir.path().join("file.txt"), dir.path().join("dst"))
            .unwrap_err();
        assert!(matches!(err, SyncError::SourceNotFound { .. }));
    }

    #[test]
    fn test_destination_that_is_a_file_is_invalid() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("dst"), "not a dir").unwrap();

        let err = SyncTask::resolve(dir.path().join("src"), dir.path().join("dst")).unwrap_err();
        assert!(matches!(err, SyncError::DestinationInvalid { .. }));
    }

    #[test]
    fn test_destination_below_a_file_is_invalid() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("blocker"), "file").unwrap();

        let err = SyncTask::resolve(dir.path().join("src"), dir.path().join("blocker/dst"))
            .unwrap_err();
        assert!(matches!(err, SyncError::DestinationInvalid { .. }));
    }
}
