//! Collaborators the importer talks to: file readers and the operator.

use crate::catalog::Metadata;
use crate::error::Result;
use crate::isbn::clean_isbn;
use std::io;
use std::path::Path;

/// Number of rejected entries after which manual ISBN entry gives up.
pub const MAX_ISBN_ATTEMPTS: usize = 5;

/// Reads descriptive metadata out of an e-book file.
pub trait MetadataExtractor {
    /// Read the file's metadata.
    ///
    /// An ISBN that could not be found is reported as `isbn: None`, not as
    /// an error. Errors mean the file could not be read at all.
    fn read_metadata(&self, path: &Path) -> Result<Metadata>;
}

/// Blocking questions and notices for the operator.
pub trait Interaction {
    /// Ask a yes/no question.
    fn confirm(&mut self, prompt: &str) -> bool;

    /// Ask for one line of free text.
    fn prompt_line(&mut self, prompt: &str) -> io::Result<String>;

    /// Tell the operator something without expecting an answer.
    fn notify(&mut self, _message: &str) {}
}

/// Ask the operator for an ISBN until one validates and is confirmed.
///
/// Returns `Ok(None)` if they decline, or after more than
/// [`MAX_ISBN_ATTEMPTS`] invalid or unconfirmed entries. Only a failure to
/// read the answer is an error.
pub fn ask_for_isbn<U: Interaction + ?Sized>(ui: &mut U) -> io::Result<Option<String>> {
    if !ui.confirm("Do you want to enter an ISBN manually?") {
        return Ok(None);
    }

    let mut errors = 0;
    loop {
        let choice = ui.prompt_line("Enter ISBN: ")?;
        match clean_isbn(&choice) {
            Ok(isbn) => {
                if ui.confirm(&format!("Confirm: {}", isbn)) {
                    return Ok(Some(isbn));
                }
                ui.notify("Manual entry not confirmed, trying again.");
            }
            Err(e) => {
                tracing::debug!(error = %e, "rejected manual isbn");
                ui.notify("Warning: Invalid value.");
            }
        }

        errors += 1;
        if errors > MAX_ISBN_ATTEMPTS {
            ui.notify("Too many errors, continuing without ISBN.");
            return Ok(None);
        }
    }
}
