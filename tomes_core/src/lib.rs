//! # Tomes Core
//!
//! Import and deduplication pipeline for a personal e-book catalog.
//!
//! Every file is identified by the BLAKE3 hash of its content. A persisted
//! ledger remembers every hash ever imported, and the collection maps
//! catalog IDs to books and the retail/non-retail files linked to them.
//! Source directories can be rescanned on every run: files already linked
//! are never offered again, and files imported before but no longer linked
//! are reported as missing.
//!
//! ## Features
//!
//! - Content-addressed identity for e-book files
//! - Crash-safe, resumable imports: ledger then collection saved per book
//! - Resolution of new files to existing books by ISBN, then author and title
//! - Interactive confirmation and manual ISBN entry through a trait
//!
//! ## Example
//!
//! ```no_run
//! use tomes_core::{Config, EpubExtractor, Importer, Interaction};
//! use std::path::Path;
//!
//! struct AlwaysYes;
//!
//! impl Interaction for AlwaysYes {
//!     fn confirm(&mut self, _prompt: &str) -> bool {
//!         true
//!     }
//!     fn prompt_line(&mut self, _prompt: &str) -> std::io::Result<String> {
//!         Ok(String::new())
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(Path::new("tomes.toml"))?;
//! let mut importer = Importer::open(&config, EpubExtractor, AlwaysYes)?;
//!
//! let report = importer.import_from_sources(config.sources(true)?, true)?;
//! println!("Imported {} epubs", report.imported);
//! # Ok(())
//! # }
//! ```

mod catalog;
mod config;
mod error;
mod extract;
mod hash;
mod import;
mod interact;
mod isbn;
mod ledger;
mod persist;
mod scan;

pub use catalog::{CatalogEntry, Collection, FileVariant, Link, Metadata};
pub use config::Config;
pub use error::{Error, Result};
pub use extract::EpubExtractor;
pub use hash::{ContentHash, HASH_SIZE};
pub use import::{ImportReport, Importer, Outcome};
pub use interact::{Interaction, MAX_ISBN_ATTEMPTS, MetadataExtractor, ask_for_isbn};
pub use isbn::clean_isbn;
pub use ledger::HashLedger;
pub use scan::{Candidates, EPUB_EXTENSION, ImportCandidate, is_epub, scan};
