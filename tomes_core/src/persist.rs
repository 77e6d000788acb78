//! Atomic file replacement shared by the ledger and the collection.

use crate::error::{Error, Result};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Read a persisted file, treating a missing file as `None`.
///
/// Any other read failure makes the backing store unavailable.
pub(crate) fn read_if_exists(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::storage_unavailable(path, e.to_string())),
    }
}

/// Replace `path` with `content` unless it already holds exactly those bytes.
///
/// The new content is written to a temporary file next to the target and
/// renamed over it, so the previous version survives a crash mid-write.
/// Returns whether the file on disk changed.
pub(crate) fn write_if_changed(path: &Path, content: &[u8]) -> Result<bool> {
    match fs::read(path) {
        Ok(existing) if existing == content => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(Error::storage_unavailable(path, e.to_string())),
    }

    write_atomic(path, content).map_err(|e| Error::storage_unavailable(path, e.to_string()))?;
    Ok(true)
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(content)?;
    temp_file.flush()?;
    temp_file.as_file().sync_all()?;

    temp_file.persist(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_missing_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let result = read_if_exists(&temp_dir.path().join("absent.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_read_directory_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = read_if_exists(temp_dir.path()).unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable { .. }));
    }

    #[test]
    fn test_write_if_changed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("file.json");

        assert!(write_if_changed(&path, b"one").unwrap());
        assert_eq!(fs::read(&path).unwrap(), b"one");

        assert!(!write_if_changed(&path, b"one").unwrap());

        assert!(write_if_changed(&path, b"two").unwrap());
        assert_eq!(fs::read(&path).unwrap(), b"two");
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("file.json");
        write_if_changed(&path, b"content").unwrap();

        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("file.json")]);
    }

    #[test]
    fn test_write_over_directory_fails_and_keeps_it() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("occupied");
        fs::create_dir(&target).unwrap();

        let err = write_if_changed(&target, b"content").unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable { .. }));
        assert!(target.is_dir());
    }
}
