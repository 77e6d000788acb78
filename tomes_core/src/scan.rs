//! Discovery and classification of import candidates.

use crate::catalog::Collection;
use crate::error::{Error, Result};
use crate::hash::ContentHash;
use crate::ledger::HashLedger;
use std::fs;
use std::path::{Path, PathBuf};

/// File extension recognized as an e-book.
pub const EPUB_EXTENSION: &str = "epub";

/// A file found in a source location, with its standing against the
/// ledger and the collection at scan time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCandidate {
    pub path: PathBuf,
    pub hash: ContentHash,
    /// The hash was found in the ledger.
    pub already_ledgered: bool,
    /// An entry links a file with this hash that is still on disk.
    pub present_in_collection: bool,
}

impl ImportCandidate {
    /// Hash a file and classify it.
    pub fn inspect(path: &Path, ledger: &HashLedger, collection: &Collection) -> Result<Self> {
        let hash = ContentHash::hash_file(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            hash,
            already_ledgered: ledger.contains(&hash),
            present_in_collection: collection.links_present_file(&hash),
        })
    }

    /// Never imported before.
    pub fn is_new(&self) -> bool {
        !self.already_ledgered
    }

    /// Imported before, but no longer linked from the collection.
    pub fn is_missing(&self) -> bool {
        self.already_ledgered && !self.present_in_collection
    }

    /// Worth offering for import.
    pub fn is_importable(&self) -> bool {
        self.is_new() || self.is_missing()
    }

    /// File name for prompts and logs.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Candidates found by a scan, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    items: Vec<ImportCandidate>,
    /// Files that were found but could not be hashed, with the reason.
    pub unreadable: Vec<(PathBuf, String)>,
}

impl Candidates {
    /// Wrap an already classified list.
    pub fn from_vec(items: Vec<ImportCandidate>) -> Self {
        Self {
            items,
            unreadable: Vec::new(),
        }
    }

    /// Append the results of another scan.
    pub fn extend(&mut self, other: Candidates) {
        self.items.extend(other.items);
        self.unreadable.extend(other.unreadable);
    }

    /// Candidates never imported before.
    pub fn new_candidates(&self) -> impl Iterator<Item = &ImportCandidate> {
        self.items.iter().filter(|c| c.is_new())
    }

    /// Candidates imported before and no longer in the collection.
    pub fn missing(&self) -> impl Iterator<Item = &ImportCandidate> {
        self.items.iter().filter(|c| c.is_missing())
    }

    /// Candidates worth offering for import.
    pub fn importable(&self) -> impl Iterator<Item = &ImportCandidate> {
        self.items.iter().filter(|c| c.is_importable())
    }

    /// Consume the scan, keeping only importable candidates.
    pub fn into_importable(self) -> Vec<ImportCandidate> {
        self.items.into_iter().filter(|c| c.is_importable()).collect()
    }

    /// All candidates, importable or not.
    pub fn all(&self) -> &[ImportCandidate] {
        &self.items
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing was found.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Whether the path carries the e-book extension, ignoring case.
pub fn is_epub(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(EPUB_EXTENSION))
}

/// Walk every source location and classify each e-book found.
///
/// Traversal is sorted by file name, so an unchanged tree always yields
/// the same candidates in the same order. A source that cannot be read is
/// a configuration error; nothing is modified.
pub fn scan(sources: &[PathBuf], ledger: &HashLedger, collection: &Collection) -> Result<Candidates> {
    let mut candidates = Candidates::default();
    for source in sources {
        candidates.extend(scan_source(source, ledger, collection)?);
    }
    Ok(candidates)
}

fn scan_source(source: &Path, ledger: &HashLedger, collection: &Collection) -> Result<Candidates> {
    let metadata =
        fs::metadata(source).map_err(|e| Error::configuration(source, e.to_string()))?;
    if !metadata.is_dir() {
        return Err(Error::configuration(source, "source is not a directory"));
    }

    let walker = ignore::WalkBuilder::new(source)
        .standard_filters(false)
        .follow_links(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut candidates = Candidates::default();
    for entry in walker {
        let entry = entry.map_err(|e| Error::configuration(source, e.to_string()))?;
        let path = entry.path();

        if !entry.file_type().is_some_and(|t| t.is_file()) || !is_epub(path) {
            continue;
        }

        match ImportCandidate::inspect(path, ledger, collection) {
            Ok(candidate) => {
                tracing::debug!(
                    path = %path.display(),
                    hash = %candidate.hash.short(),
                    new = candidate.is_new(),
                    missing = candidate.is_missing(),
                    "found candidate"
                );
                candidates.items.push(candidate);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not hash file");
                candidates.unreadable.push((path.to_path_buf(), e.to_string()));
            }
        }
    }

    Ok(candidates)
}
