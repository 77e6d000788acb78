//! Import pipeline: scan sources, then resolve, confirm and commit each
//! importable candidate one at a time.
//!
//! Per candidate the importer reads metadata, asks for an ISBN when none
//! was found, resolves the candidate to an existing entry or a new one,
//! asks for confirmation and finally commits. A commit that adds content
//! saves the ledger and then the collection before the next candidate is
//! considered, so an interrupted batch resumes cleanly on the next run.

use crate::catalog::{CatalogEntry, Collection, Metadata};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::interact::{Interaction, MetadataExtractor, ask_for_isbn};
use crate::ledger::HashLedger;
use crate::scan::{self, Candidates, ImportCandidate, is_epub};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What happened to one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The file was linked to entry `id`, which was `created` for it or existed.
    Committed { id: u64, created: bool },
    /// The operator declined the import.
    Declined,
    /// Entry `id` already links this exact file.
    AlreadyLinked { id: u64 },
    /// The file could not be read or analyzed.
    Failed { reason: String },
}

impl Outcome {
    /// Whether the candidate was committed.
    pub fn is_committed(&self) -> bool {
        matches!(self, Outcome::Committed { .. })
    }
}

/// Per-candidate outcomes of a batch, in the order they were processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub outcomes: Vec<(PathBuf, Outcome)>,
}

impl ImportReport {
    fn record(&mut self, path: &Path, outcome: Outcome) {
        if outcome.is_committed() {
            self.imported += 1;
        }
        self.outcomes.push((path.to_path_buf(), outcome));
    }

    /// Candidates that were not committed, with their outcome.
    pub fn skipped(&self) -> impl Iterator<Item = &(PathBuf, Outcome)> {
        self.outcomes.iter().filter(|(_, o)| !o.is_committed())
    }

    /// Turn an empty batch into [`Error::NothingToImport`].
    pub fn require_imports(self) -> Result<Self> {
        if self.imported == 0 {
            Err(Error::NothingToImport)
        } else {
            Ok(self)
        }
    }
}

/// Where a candidate's metadata led.
enum Resolution {
    Existing(u64),
    New,
}

/// Drives imports against a ledger and a collection it owns.
pub struct Importer<E, U> {
    ledger: HashLedger,
    collection: Collection,
    extractor: E,
    ui: U,
}

impl<E: MetadataExtractor, U: Interaction> Importer<E, U> {
    /// Create an importer over already loaded state.
    pub fn new(ledger: HashLedger, collection: Collection, extractor: E, ui: U) -> Self {
        Self {
            ledger,
            collection,
            extractor,
            ui,
        }
    }

    /// Load the ledger and collection named by the configuration.
    pub fn open(config: &Config, extractor: E, ui: U) -> Result<Self> {
        let ledger = HashLedger::open(config.ledger_path())?;
        let collection = Collection::open(config.database_path())?;
        Ok(Self::new(ledger, collection, extractor, ui))
    }

    /// The hash ledger.
    pub fn ledger(&self) -> &HashLedger {
        &self.ledger
    }

    /// The collection.
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// The interaction collaborator.
    pub fn ui(&self) -> &U {
        &self.ui
    }

    /// Give back the owned state.
    pub fn into_parts(self) -> (HashLedger, Collection, E, U) {
        (self.ledger, self.collection, self.extractor, self.ui)
    }

    /// Scan source locations against freshly reloaded ledger contents.
    pub fn analyze_sources(&mut self, sources: &[PathBuf]) -> Result<Candidates> {
        self.ledger.load()?;
        let candidates = scan::scan(sources, &self.ledger, &self.collection)?;
        for (path, reason) in &candidates.unreadable {
            self.ui
                .notify(&format!("Could not read {}: {}", path.display(), reason));
        }
        Ok(candidates)
    }

    /// Import every importable e-book found in the source locations.
    ///
    /// Fails with [`Error::NothingToImport`] if no candidate was committed.
    pub fn import_from_sources(&mut self, sources: &[PathBuf], retail: bool) -> Result<ImportReport> {
        let kind = source_kind(retail);
        tracing::info!(sources = sources.len(), kind, "importing from sources");

        let candidates = self.analyze_sources(sources)?;
        let new = candidates.new_candidates().count();
        let missing = candidates.missing().count();
        self.ui.notify(&format!(
            "Found {} new epubs and {} epubs previously imported and now missing.",
            new, missing
        ));

        let importable = candidates.into_importable();
        self.run(&importable, retail)?.require_imports()
    }

    /// Import specific files.
    ///
    /// Paths that do not exist or are not e-books are reported and ignored.
    /// Fails with [`Error::NothingToImport`] if no candidate was committed.
    pub fn import_specific_paths(&mut self, paths: &[PathBuf], retail: bool) -> Result<ImportReport> {
        self.ledger.load()?;

        let mut importable = Vec::new();
        for path in paths {
            if !path.is_file() || !is_epub(path) {
                tracing::warn!(path = %path.display(), "not an existing epub file");
                self.ui
                    .notify(&format!("Ignoring {}: not an existing epub file", path.display()));
                continue;
            }
            match ImportCandidate::inspect(path, &self.ledger, &self.collection) {
                Ok(candidate) if candidate.is_importable() => importable.push(candidate),
                Ok(_) => {
                    self.ui
                        .notify(&format!("Ignoring {}: already in library", path.display()));
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not hash file");
                    self.ui
                        .notify(&format!("Could not read {}: {}", path.display(), e));
                }
            }
        }

        self.run(&importable, retail)?.require_imports()
    }

    /// Offer each candidate for import, in order.
    ///
    /// The ledger is reloaded first. Returns the report even when nothing
    /// was committed; a storage failure aborts the remaining batch.
    pub fn import_candidates(
        &mut self,
        candidates: &[ImportCandidate],
        retail: bool,
    ) -> Result<ImportReport> {
        self.ledger.load()?;
        self.run(candidates, retail)
    }

    fn run(&mut self, candidates: &[ImportCandidate], retail: bool) -> Result<ImportReport> {
        let started = Instant::now();
        let mut report = ImportReport::default();

        for (i, candidate) in candidates.iter().enumerate() {
            let mut intro = format!("Considering importable epub {}", candidate.file_name());
            if candidates.len() > 1 {
                intro.push_str(&format!(" ({} / {})", i + 1, candidates.len()));
            }
            self.ui.notify(&intro);

            let outcome = match self.import_one(candidate, retail) {
                Ok(outcome) => outcome,
                Err(e) if e.is_fatal() => {
                    tracing::error!(path = %candidate.path.display(), error = %e, "aborting import batch");
                    self.ui.notify(&format!(
                        "Aborting import at {}: {}",
                        candidate.path.display(),
                        e
                    ));
                    return Err(e);
                }
                Err(e) => Outcome::Failed {
                    reason: e.to_string(),
                },
            };

            match &outcome {
                Outcome::Committed { .. } => {}
                Outcome::Declined => {
                    tracing::debug!(path = %candidate.path.display(), "declined");
                    self.ui
                        .notify(&format!("Ignoring epub {}", candidate.file_name()));
                }
                Outcome::AlreadyLinked { id } => {
                    tracing::info!(path = %candidate.path.display(), id, "already linked");
                    self.ui.notify(&format!(
                        "Skipping {}: already linked to book ID {}",
                        candidate.file_name(),
                        id
                    ));
                }
                Outcome::Failed { reason } => {
                    tracing::warn!(path = %candidate.path.display(), %reason, "import failed");
                    self.ui.notify(&format!(
                        "Could not analyze and import {}: {}",
                        candidate.path.display(),
                        reason
                    ));
                }
            }
            report.record(&candidate.path, outcome);
        }

        tracing::info!(
            imported = report.imported,
            kind = source_kind(retail),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "import batch finished"
        );
        Ok(report)
    }

    fn import_one(&mut self, candidate: &ImportCandidate, retail: bool) -> Result<Outcome> {
        let path = &candidate.path;

        let mut metadata = match self.extractor.read_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                return Ok(Outcome::Failed {
                    reason: e.to_string(),
                });
            }
        };

        if metadata.isbn.is_none() {
            tracing::debug!(path = %path.display(), "identifier unknown");
            self.ui
                .notify(&format!("ISBN not found in {}", candidate.file_name()));
            match ask_for_isbn(&mut self.ui) {
                Ok(Some(isbn)) => metadata.isbn = Some(isbn),
                Ok(None) => self.ui.notify("Warning: ISBN still unknown."),
                Err(e) => {
                    tracing::warn!(error = %e, "could not read manual isbn");
                    self.ui.notify("Warning: ISBN still unknown.");
                }
            }
        }

        let resolution = match self.collection.find_by_metadata(&metadata) {
            Some(entry) => {
                if entry.variant(&candidate.hash).is_some_and(|v| v.is_present()) {
                    return Ok(Outcome::AlreadyLinked { id: entry.id });
                }
                Resolution::Existing(entry.id)
            }
            None => Resolution::New,
        };

        let prompt = self.confirmation_prompt(candidate, &metadata, &resolution)?;
        if !self.ui.confirm(&prompt) {
            return Ok(Outcome::Declined);
        }

        self.commit(candidate, metadata, resolution, retail)
    }

    fn confirmation_prompt(
        &self,
        candidate: &ImportCandidate,
        metadata: &Metadata,
        resolution: &Resolution,
    ) -> Result<String> {
        let mut prompt = format!("Found: {}.\n", metadata);
        match resolution {
            Resolution::Existing(id) => {
                let entry = self.collection.find_by_id(*id)?;
                prompt.push_str(&format!("Adding file to {}.\n", entry.short_string()));
            }
            Resolution::New => prompt.push_str("Creating new book.\n"),
        }
        if candidate.already_ledgered {
            prompt.push_str(
                "This epub has already been imported but is not in the current library. \
                 Confirm importing again?",
            );
        } else {
            prompt.push_str("Import?");
        }
        Ok(prompt)
    }

    fn commit(
        &mut self,
        candidate: &ImportCandidate,
        metadata: Metadata,
        resolution: Resolution,
        retail: bool,
    ) -> Result<Outcome> {
        let path = &candidate.path;

        let (id, created) = match resolution {
            Resolution::Existing(id) => {
                let entry = self.collection.find_by_id_mut(id)?;
                let link = entry.link_file(path, candidate.hash, retail);
                if !link.is_new_content() {
                    return Ok(Outcome::AlreadyLinked { id });
                }
                if entry.metadata.isbn.is_none() {
                    entry.metadata.isbn = metadata.isbn;
                }
                self.ui
                    .notify(&format!("Added epub to {}", entry.short_string()));
                (id, false)
            }
            Resolution::New => {
                let id = self.collection.generate_id();
                let mut entry = CatalogEntry::new(id, metadata);
                entry.link_file(path, candidate.hash, retail);
                self.ui
                    .notify(&format!("Added new epub {} with ID {}", entry.metadata, id));
                self.collection.add(entry);
                (id, true)
            }
        };

        // Ledger before collection.
        if !self.ledger.add(candidate.hash) {
            tracing::debug!(hash = %candidate.hash.short(), "hash already in ledger");
        }
        self.ledger.save()?;
        self.collection.save()?;

        tracing::info!(path = %path.display(), id, created, retail, "committed");
        Ok(Outcome::Committed { id, created })
    }
}

fn source_kind(retail: bool) -> &'static str {
    if retail { "retail" } else { "non-retail" }
}
