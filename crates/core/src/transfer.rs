//! Atomic file transfer into the destination tree

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write as _};

use tracing::debug;

use crate::error::{Result, SyncError};
use crate::scan::FileEntry;

/// Prefix of the staging files created next to their destination
pub const TEMP_PREFIX: &str = ".filesync-";

/// Copy an entry's source bytes over its destination path.
///
/// Data is staged in a temporary file in the destination directory and
/// renamed into place, so readers see either the old or the new content.
/// The staging file is removed if anything fails.
///
/// Returns the number of bytes copied.
///
/// # Errors
/// Returns [`SyncError::Copy`] if reading, writing or the final rename fails
pub fn copy_entry(entry: &FileEntry) -> Result<u64> {
    let copy_err = |source| SyncError::Copy {
        name: entry.name.clone(),
        source,
    };

    let dest_dir = entry.dest_path.parent().ok_or_else(|| {
        copy_err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "destination has no parent directory",
        ))
    })?;

    let mut reader = BufReader::new(File::open(&entry.source_path).map_err(copy_err)?);
    let staged = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".tmp")
        .tempfile_in(dest_dir)
        .map_err(copy_err)?;

    let bytes = {
        let mut writer = BufWriter::new(staged.as_file());
        let bytes = io::copy(&mut reader, &mut writer).map_err(copy_err)?;
        writer.flush().map_err(copy_err)?;
        bytes
    };
    staged.as_file().sync_all().map_err(copy_err)?;

    debug!(
        name = ?entry.name,
        staged = %staged.path().display(),
        bytes,
        "renaming staged copy into place"
    );
    staged
        .persist(&entry.dest_path)
        .map_err(|e| copy_err(e.error))?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn entry(dir: &TempDir, name: &str) -> FileEntry {
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("dst")).unwrap();
        FileEntry {
            name: name.into(),
            source_path: dir.path().join("src").join(name),
            dest_path: dir.path().join("dst").join(name),
        }
    }

    fn staging_files(dir: &TempDir) -> Vec<String> {
        fs::read_dir(dir.path().join("dst"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(TEMP_PREFIX))
            .collect()
    }

    #[test]
    fn test_copy_new_file() {
        let dir = TempDir::new().unwrap();
        let e = entry(&dir, "b.txt");
        fs::write(&e.source_path, "brand new file").unwrap();

        let bytes = copy_entry(&e).unwrap();

        assert_eq!(bytes, 14);
        assert_eq!(fs::read(&e.dest_path).unwrap(), b"brand new file");
        assert!(staging_files(&dir).is_empty());
    }

    #[test]
    fn test_copy_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        let e = entry(&dir, "a.txt");
        fs::write(&e.source_path, "hi").unwrap();
        fs::write(&e.dest_path, "a much longer old destination body").unwrap();

        copy_entry(&e).unwrap();

        assert_eq!(fs::read_to_string(&e.dest_path).unwrap(), "hi");
    }

    #[test]
    fn test_copy_preserves_binary_content() {
        let dir = TempDir::new().unwrap();
        let e = entry(&dir, "blob.bin");
        let data: Vec<u8> = (0..=255u8).cycle().take(300_000).collect();
        fs::write(&e.source_path, &data).unwrap();

        let bytes = copy_entry(&e).unwrap();

        assert_eq!(bytes, data.len() as u64);
        assert_eq!(fs::read(&e.dest_path).unwrap(), data);
    }

    #[test]
    fn test_missing_source_is_copy_error_and_leaves_destination() {
        let dir = TempDir::new().unwrap();
        let e = entry(&dir, "gone.txt");
        fs::write(&e.dest_path, "keep me").unwrap();

        let err = copy_entry(&e).unwrap_err();

        assert!(matches!(err, SyncError::Copy { .. }));
        assert_eq!(fs::read_to_string(&e.dest_path).unwrap(), "keep me");
        assert!(staging_files(&dir).is_empty());
    }

    #[test]
    fn test_rename_failure_cleans_up_staging_file() {
        let dir = TempDir::new().unwrap();
        let e = entry(&dir, "clash");
        fs::write(&e.source_path, "file").unwrap();
        fs::create_dir(&e.dest_path).unwrap();
        fs::write(e.dest_path.join("inside"), "occupied").unwrap();

        let err = copy_entry(&e).unwrap_err();

        assert!(matches!(err, SyncError::Copy { .. }));
        assert!(staging_files(&dir).is_empty());
    }
}
