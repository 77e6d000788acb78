//! Command results as text for people or JSON for scripts.
//!
//! Results go to stdout, errors to stderr. Every JSON document carries
//! `success` and `result_code` so callers can branch without parsing text.

use anyhow::Result;
use serde::Serialize;
use std::io::{self, Write};
use tomes_core::{CatalogEntry, ContentHash, ImportCandidate, Outcome};

/// Result code for a successful command.
pub const RESULT_OK: u8 = 0;

/// Result code for a failed command.
pub const RESULT_ERROR: u8 = 1;

/// Result code for an import that committed nothing.
pub const RESULT_NOTHING_TO_IMPORT: u8 = 2;

/// Prints command results in the format picked on the command line.
pub struct OutputWriter {
    json: bool,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `data` as JSON, or the text built by `render` otherwise.
    pub fn emit<T: Serialize>(&self, data: &T, render: impl FnOnce() -> String) -> Result<()> {
        let mut stdout = io::stdout().lock();
        if self.json {
            serde_json::to_writer_pretty(&mut stdout, data)?;
            writeln!(stdout)?;
        } else {
            stdout.write_all(render().as_bytes())?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Report a failed command on stderr.
    pub fn emit_error(&self, error: &anyhow::Error, result_code: u8) {
        let mut stderr = io::stderr().lock();
        if self.json {
            let failure = ErrorOutput {
                success: false,
                result_code,
                error: format!("{:#}", error),
            };
            if serde_json::to_writer_pretty(&mut stderr, &failure).is_ok() {
                let _ = writeln!(stderr);
            }
        } else {
            let _ = writeln!(stderr, "Error: {:#}", error);
        }
    }
}

/// Body of a failed command in JSON mode.
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub success: bool,
    pub result_code: u8,
    pub error: String,
}

/// One processed candidate of an `import` command.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateResult {
    pub path: String,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CandidateResult {
    pub fn new(path: &std::path::Path, outcome: &Outcome) -> Self {
        let (label, id, reason) = match outcome {
            Outcome::Committed { id, created: true } => ("created", Some(*id), None),
            Outcome::Committed { id, created: false } => ("linked", Some(*id), None),
            Outcome::Declined => ("declined", None, None),
            Outcome::AlreadyLinked { id } => ("already-linked", Some(*id), None),
            Outcome::Failed { reason } => ("failed", None, Some(reason.clone())),
        };
        Self {
            path: path.display().to_string(),
            outcome: label,
            id,
            reason,
        }
    }
}

/// Output for `import` command.
#[derive(Debug, Serialize)]
pub struct ImportOutput {
    pub success: bool,
    pub result_code: u8,
    pub retail: bool,
    pub imported: usize,
    pub candidates: Vec<CandidateResult>,
}

/// Importable file for `list` command.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateInfo {
    pub path: String,
    pub hash: ContentHash,
    pub previously_imported: bool,
}

impl From<&ImportCandidate> for CandidateInfo {
    fn from(candidate: &ImportCandidate) -> Self {
        Self {
            path: candidate.path.display().to_string(),
            hash: candidate.hash,
            previously_imported: candidate.already_ledgered,
        }
    }
}

/// Output for `list` command.
#[derive(Debug, Serialize)]
pub struct ListOutput {
    pub success: bool,
    pub result_code: u8,
    pub retail: bool,
    pub importable: Vec<CandidateInfo>,
}

/// Linked file of a book for `info` command.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub path: String,
    pub hash: ContentHash,
    pub retail: bool,
    pub present: bool,
}

/// Book details for `info` command.
#[derive(Debug, Clone, Serialize)]
pub struct BookInfo {
    pub id: u64,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    pub files: Vec<FileInfo>,
}

impl From<&CatalogEntry> for BookInfo {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id,
            title: entry.metadata.title.clone(),
            authors: entry.metadata.authors.clone(),
            isbn: entry.metadata.isbn.clone(),
            language: entry.metadata.language.clone(),
            year: entry.metadata.year.clone(),
            files: entry
                .files
                .iter()
                .map(|f| FileInfo {
                    path: f.path.display().to_string(),
                    hash: f.hash,
                    retail: f.retail,
                    present: f.is_present(),
                })
                .collect(),
        }
    }
}

/// Library summary for `info` without an ID.
#[derive(Debug, Serialize)]
pub struct LibrarySummary {
    pub books: usize,
    pub retail_books: usize,
    pub known_hashes: usize,
}

/// Data variants for `info` command.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum InfoData {
    Library(LibrarySummary),
    Book(BookInfo),
}

/// Output for `info` command.
#[derive(Debug, Serialize)]
pub struct InfoOutput {
    pub success: bool,
    pub result_code: u8,
    #[serde(flatten)]
    pub data: InfoData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_candidate_result_labels() {
        let path = Path::new("/in/a.epub");

        let created = CandidateResult::new(path, &Outcome::Committed { id: 4, created: true });
        assert_eq!(created.outcome, "created");
        assert_eq!(created.id, Some(4));

        let failed = CandidateResult::new(
            path,
            &Outcome::Failed {
                reason: "bad zip".to_string(),
            },
        );
        assert_eq!(failed.outcome, "failed");
        assert_eq!(failed.reason.as_deref(), Some("bad zip"));

        let json = serde_json::to_value(CandidateResult::new(path, &Outcome::Declined)).unwrap();
        assert_eq!(json["outcome"], "declined");
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_info_output_is_tagged() {
        let output = InfoOutput {
            success: true,
            result_code: RESULT_OK,
            data: InfoData::Library(LibrarySummary {
                books: 2,
                retail_books: 1,
                known_hashes: 3,
            }),
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["type"], "Library");
        assert_eq!(json["books"], 2);
    }
}
