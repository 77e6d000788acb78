//! Ledger of every content hash ever imported.

use crate::error::{Error, Result};
use crate::hash::ContentHash;
use crate::persist;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Persisted set of previously imported content hashes.
///
/// Additions live in memory until [`HashLedger::save`] is called. The file
/// is a JSON array of hex digests, sorted so that saving an unchanged set
/// never rewrites the file.
#[derive(Debug)]
pub struct HashLedger {
    path: PathBuf,
    hashes: HashSet<ContentHash>,
}

impl HashLedger {
    /// Create an empty ledger backed by `path`. Nothing is read or written.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            hashes: HashSet::new(),
        }
    }

    /// Create a ledger backed by `path` and load it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut ledger = Self::new(path);
        ledger.load()?;
        Ok(ledger)
    }

    /// Replace the in-memory set with what is on disk.
    ///
    /// Unsaved additions are discarded. A missing file is an empty ledger.
    pub fn load(&mut self) -> Result<()> {
        let hashes = match persist::read_if_exists(&self.path)? {
            Some(content) => self.parse(&content)?,
            None => HashSet::new(),
        };
        tracing::debug!(path = %self.path.display(), count = hashes.len(), "loaded hash ledger");
        self.hashes = hashes;
        Ok(())
    }

    fn parse(&self, content: &str) -> Result<HashSet<ContentHash>> {
        if content.trim().is_empty() {
            return Ok(HashSet::new());
        }
        let hashes: Vec<ContentHash> = serde_json::from_str(content)
            .map_err(|e| Error::storage_unavailable(&self.path, e.to_string()))?;
        Ok(hashes.into_iter().collect())
    }

    /// Record a hash in memory. Returns whether it was not already known.
    pub fn add(&mut self, hash: ContentHash) -> bool {
        self.hashes.insert(hash)
    }

    /// Write the full set to disk atomically.
    ///
    /// Returns whether the file content changed.
    pub fn save(&self) -> Result<bool> {
        let mut sorted: Vec<&ContentHash> = self.hashes.iter().collect();
        sorted.sort();
        let content = serde_json::to_string_pretty(&sorted)
            .map_err(|e| Error::storage_unavailable(&self.path, e.to_string()))?;

        let changed = persist::write_if_changed(&self.path, content.as_bytes())?;
        if changed {
            tracing::debug!(path = %self.path.display(), count = sorted.len(), "saved hash ledger");
        }
        Ok(changed)
    }

    /// Whether the hash has been recorded.
    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.hashes.contains(hash)
    }

    /// Number of recorded hashes.
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Whether no hash has been recorded.
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_ledger() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = HashLedger::open(temp_dir.path().join(".hashes.json")).unwrap();
        assert!(ledger.is_empty());
        assert!(!temp_dir.path().join(".hashes.json").exists());
    }

    #[test]
    fn test_add_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = HashLedger::new(temp_dir.path().join("ledger"));
        let hash = ContentHash::hash_bytes(b"book");

        assert!(ledger.add(hash));
        assert!(!ledger.add(hash));
        assert_eq!(ledger.len(), 1);
        assert!(ledger.contains(&hash));
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger");
        let hash1 = ContentHash::hash_bytes(b"one");
        let hash2 = ContentHash::hash_bytes(b"two");

        let mut ledger = HashLedger::new(&path);
        ledger.add(hash1);
        ledger.add(hash2);
        assert!(ledger.save().unwrap());

        let reloaded = HashLedger::open(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains(&hash1));
        assert!(reloaded.contains(&hash2));
    }

    #[test]
    fn test_save_unchanged_reports_false() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger");

        let mut ledger = HashLedger::new(&path);
        ledger.add(ContentHash::hash_bytes(b"one"));
        assert!(ledger.save().unwrap());
        let before = fs::read(&path).unwrap();

        assert!(!ledger.save().unwrap());
        assert_eq!(fs::read(&path).unwrap(), before);

        ledger.add(ContentHash::hash_bytes(b"two"));
        assert!(ledger.save().unwrap());
    }

    #[test]
    fn test_file_is_human_readable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger");
        let hash = ContentHash::hash_bytes(b"one");

        let mut ledger = HashLedger::new(&path);
        ledger.add(hash);
        ledger.save().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains(&hash.to_hex()));
    }

    #[test]
    fn test_load_discards_unsaved_additions() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger");
        let saved = ContentHash::hash_bytes(b"saved");
        let unsaved = ContentHash::hash_bytes(b"unsaved");

        let mut ledger = HashLedger::new(&path);
        ledger.add(saved);
        ledger.save().unwrap();
        ledger.add(unsaved);

        ledger.load().unwrap();
        assert!(ledger.contains(&saved));
        assert!(!ledger.contains(&unsaved));
    }

    #[test]
    fn test_load_sees_out_of_band_changes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger");
        let hash = ContentHash::hash_bytes(b"elsewhere");

        let mut ledger = HashLedger::open(&path).unwrap();

        let mut other = HashLedger::new(&path);
        other.add(hash);
        other.save().unwrap();

        assert!(!ledger.contains(&hash));
        ledger.load().unwrap();
        assert!(ledger.contains(&hash));
    }

    #[test]
    fn test_corrupt_file_is_storage_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger");
        fs::write(&path, "this is not json").unwrap();

        let err = HashLedger::open(&path).unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_invalid_hash_in_file_is_storage_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger");
        fs::write(&path, r#"["abcd"]"#).unwrap();

        let err = HashLedger::open(&path).unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable { .. }));
    }
}
