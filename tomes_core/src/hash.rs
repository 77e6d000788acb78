//! Content fingerprints using BLAKE3.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Digest length of a [`ContentHash`].
pub const HASH_SIZE: usize = 32;

/// A 32-byte BLAKE3 digest of a file's byte content.
///
/// Equality is the only identity predicate the catalog relies on. The
/// derived ordering exists so the ledger can be written in a stable order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash([u8; HASH_SIZE]);

impl ContentHash {
    pub fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        ContentHash(bytes)
    }

    /// Parse the 64-character hex form written to the ledger.
    pub fn from_hex(text: &str) -> Result<Self> {
        let mut digest = [0u8; HASH_SIZE];
        hex::decode_to_slice(text, &mut digest).map_err(|e| {
            Error::invalid_hash(format!("{:?} is not a content hash: {}", text, e))
        })?;
        Ok(ContentHash(digest))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Fingerprint an in-memory buffer.
    pub fn hash_bytes(data: &[u8]) -> Self {
        ContentHash(blake3::hash(data).into())
    }

    /// Fingerprint everything a reader yields, without buffering it whole.
    pub fn hash_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut hasher = blake3::Hasher::new();
        io::copy(&mut reader, &mut hasher)?;
        Ok(ContentHash(hasher.finalize().into()))
    }

    /// Fingerprint a file on disk.
    pub fn hash_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::hash_reader(BufReader::new(file))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("ContentHash").field(&self.short()).finish()
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ContentHash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_digests() {
        assert_eq!(
            ContentHash::hash_bytes(b"hello world").to_hex(),
            "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
        );
        assert_eq!(ContentHash::hash_bytes(b"hello world").short(), "d74981ef");
        assert_eq!(ContentHash::hash_bytes(b"").to_hex().len(), HASH_SIZE * 2);
    }

    #[test]
    fn file_digest_matches_content() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("book.epub");
        std::fs::write(&path, b"not really a zip").unwrap();

        assert_eq!(
            ContentHash::hash_file(&path).unwrap(),
            ContentHash::hash_bytes(b"not really a zip")
        );
        assert!(ContentHash::hash_file(&temp_dir.path().join("nope.epub")).is_err());
    }

    #[test]
    fn rejects_malformed_hex() {
        let not_hex = "z".repeat(64);
        let too_long = "a".repeat(66);
        for bad in ["", "abcd", not_hex.as_str(), too_long.as_str()] {
            assert!(
                matches!(ContentHash::from_hex(bad), Err(Error::InvalidHash { .. })),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn serializes_as_hex_string() {
        let hash = ContentHash::hash_bytes(b"test");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash));
        assert_eq!(serde_json::from_str::<ContentHash>(&json).unwrap(), hash);
        assert!(serde_json::from_str::<ContentHash>("\"deadbeef\"").is_err());
    }

    proptest! {
        #[test]
        fn reader_and_buffer_agree(data in prop::collection::vec(any::<u8>(), 0..4096)) {
            let streamed = ContentHash::hash_reader(&data[..]).unwrap();
            prop_assert_eq!(streamed, ContentHash::hash_bytes(&data));
        }

        #[test]
        fn hex_form_parses_back(bytes in prop::array::uniform32(any::<u8>())) {
            let hash = ContentHash::from_bytes(bytes);
            prop_assert_eq!(ContentHash::from_hex(&hash.to_hex()).unwrap(), hash);
        }
    }
}
