//! Catalog entries and the collection that owns them.

use crate::error::{Error, Result};
use crate::hash::ContentHash;
use crate::persist;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Descriptive metadata for a logical work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    /// Normalized ISBN-13, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

impl Metadata {
    /// All authors joined the way they are compared and displayed.
    pub fn author(&self) -> String {
        self.authors.join(", ")
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.author(), self.title)?;
        if let Some(year) = &self.year {
            write!(f, " ({})", year)?;
        }
        if let Some(isbn) = &self.isbn {
            write!(f, " [ISBN {}]", isbn)?;
        }
        Ok(())
    }
}

/// One file linked to a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileVariant {
    pub path: PathBuf,
    pub hash: ContentHash,
    pub retail: bool,
}

impl FileVariant {
    /// Whether the linked file is still on disk.
    pub fn is_present(&self) -> bool {
        self.path.is_file()
    }
}

/// What linking a file to an entry did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// A variant with this hash was added.
    Added,
    /// A variant with this hash existed but its file was gone; the path was updated.
    Relinked,
    /// The entry already links this exact file content.
    Duplicate,
}

impl Link {
    /// Whether the entry gained content it did not have before.
    pub fn is_new_content(self) -> bool {
        !matches!(self, Link::Duplicate)
    }
}

/// A book in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u64,
    pub metadata: Metadata,
    #[serde(default)]
    pub files: Vec<FileVariant>,
}

impl CatalogEntry {
    /// Create an entry with no linked files.
    pub fn new(id: u64, metadata: Metadata) -> Self {
        Self {
            id,
            metadata,
            files: Vec::new(),
        }
    }

    /// Link a file variant, refusing content the entry already has.
    pub fn link_file(&mut self, path: &Path, hash: ContentHash, retail: bool) -> Link {
        if let Some(existing) = self.files.iter_mut().find(|f| f.hash == hash) {
            if existing.is_present() {
                return Link::Duplicate;
            }
            existing.path = path.to_path_buf();
            existing.retail = retail;
            return Link::Relinked;
        }
        self.files.push(FileVariant {
            path: path.to_path_buf(),
            hash,
            retail,
        });
        Link::Added
    }

    /// The linked variant with this hash, if any.
    pub fn variant(&self, hash: &ContentHash) -> Option<&FileVariant> {
        self.files.iter().find(|f| &f.hash == hash)
    }

    /// Whether a retail file is linked.
    pub fn has_retail(&self) -> bool {
        self.files.iter().any(|f| f.retail)
    }

    /// `ID - author - title`, for prompts and logs.
    pub fn short_string(&self) -> String {
        format!("{} - {} - {}", self.id, self.metadata.author(), self.metadata.title)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CollectionFile {
    #[serde(default)]
    last_id: u64,
    #[serde(default)]
    entries: Vec<CatalogEntry>,
}

/// All catalog entries in insertion order, persisted as one JSON document.
#[derive(Debug)]
pub struct Collection {
    path: PathBuf,
    entries: Vec<CatalogEntry>,
    last_id: u64,
}

impl Collection {
    /// Create an empty collection backed by `path`. Nothing is read or written.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            entries: Vec::new(),
            last_id: 0,
        }
    }

    /// Create a collection backed by `path` and load it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut collection = Self::new(path);
        collection.load()?;
        Ok(collection)
    }

    /// Replace the in-memory entries with what is on disk.
    ///
    /// A missing file is an empty collection.
    pub fn load(&mut self) -> Result<()> {
        let file = match persist::read_if_exists(&self.path)? {
            Some(content) if !content.trim().is_empty() => serde_json::from_str(&content)
                .map_err(|e| Error::storage_unavailable(&self.path, e.to_string()))?,
            _ => CollectionFile::default(),
        };

        let max_id = file.entries.iter().map(|e| e.id).max().unwrap_or(0);
        self.last_id = file.last_id.max(max_id);
        self.entries = file.entries;
        tracing::debug!(path = %self.path.display(), count = self.entries.len(), "loaded collection");
        Ok(())
    }

    /// Write every entry to disk atomically.
    ///
    /// Returns whether the file content changed.
    pub fn save(&self) -> Result<bool> {
        #[derive(Serialize)]
        struct CollectionFileRef<'a> {
            last_id: u64,
            entries: &'a [CatalogEntry],
        }

        let content = serde_json::to_string_pretty(&CollectionFileRef {
            last_id: self.last_id,
            entries: &self.entries,
        })
        .map_err(|e| Error::storage_unavailable(&self.path, e.to_string()))?;

        let changed = persist::write_if_changed(&self.path, content.as_bytes())?;
        if changed {
            tracing::debug!(path = %self.path.display(), count = self.entries.len(), "saved collection");
        }
        Ok(changed)
    }

    /// Reserve a fresh ID, strictly greater than any ID handed out or present.
    pub fn generate_id(&mut self) -> u64 {
        let max_present = self.entries.iter().map(|e| e.id).max().unwrap_or(0);
        self.last_id = self.last_id.max(max_present) + 1;
        self.last_id
    }

    /// Append an entry.
    pub fn add(&mut self, entry: CatalogEntry) {
        self.last_id = self.last_id.max(entry.id);
        self.entries.push(entry);
    }

    /// Look up an entry by ID.
    pub fn find_by_id(&self, id: u64) -> Result<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::entry_not_found(id))
    }

    /// Look up an entry by ID for modification.
    pub fn find_by_id_mut(&mut self, id: u64) -> Result<&mut CatalogEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::entry_not_found(id))
    }

    /// The entry that links a file with this hash, if any.
    pub fn find_by_hash(&self, hash: &ContentHash) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.variant(hash).is_some())
    }

    /// Whether an entry links a file with this hash that is still on disk.
    pub fn links_present_file(&self, hash: &ContentHash) -> bool {
        self.entries
            .iter()
            .filter_map(|e| e.variant(hash))
            .any(FileVariant::is_present)
    }

    /// Find the entry for the same logical work.
    ///
    /// Exact ISBN match first, then exact author and title. Nothing looser.
    pub fn find_by_metadata(&self, metadata: &Metadata) -> Option<&CatalogEntry> {
        if let Some(isbn) = &metadata.isbn
            && let Some(entry) = self
                .entries
                .iter()
                .find(|e| e.metadata.isbn.as_deref() == Some(isbn.as_str()))
        {
            return Some(entry);
        }

        let author = metadata.author();
        self.entries
            .iter()
            .find(|e| e.metadata.author() == author && e.metadata.title == metadata.title)
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
