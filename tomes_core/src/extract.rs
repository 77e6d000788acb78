//! EPUB metadata extraction using the `epub` crate.

use crate::catalog::Metadata;
use crate::error::{Error, Result};
use crate::interact::MetadataExtractor;
use crate::isbn::clean_isbn;
use std::io::Cursor;
use std::path::Path;

/// Reads Dublin Core metadata from the package document of an EPUB.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpubExtractor;

impl MetadataExtractor for EpubExtractor {
    fn read_metadata(&self, path: &Path) -> Result<Metadata> {
        let data = std::fs::read(path).map_err(|e| Error::extraction(path, e.to_string()))?;
        let doc = epub::doc::EpubDoc::from_reader(Cursor::new(data))
            .map_err(|e| Error::extraction(path, e.to_string()))?;

        let metadata = extract_epub_metadata(&doc);
        if metadata.title.is_empty() {
            return Err(Error::extraction(path, "no title in package metadata"));
        }
        if metadata.isbn.is_none() {
            tracing::debug!(path = %path.display(), "ISBN not found in epub");
        }
        Ok(metadata)
    }
}

fn extract_epub_metadata(doc: &epub::doc::EpubDoc<Cursor<Vec<u8>>>) -> Metadata {
    let field = |name: &str| {
        doc.mdata(name)
            .map(|m| m.value.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    Metadata {
        title: field("title").unwrap_or_default(),
        authors: field("creator").map(split_authors).unwrap_or_default(),
        isbn: field("identifier").and_then(|id| clean_isbn(&id).ok()),
        language: field("language"),
        year: field("date").and_then(|d| year_of(&d)),
    }
}

fn split_authors(creator: String) -> Vec<String> {
    creator
        .split('&')
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}

/// Leading four-digit year of a date such as `1845-01-01` or `1845`.
fn year_of(date: &str) -> Option<String> {
    let year: String = date.chars().take(4).collect();
    (year.len() == 4 && year.chars().all(|c| c.is_ascii_digit())).then_some(year)
}
