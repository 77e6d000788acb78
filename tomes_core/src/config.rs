//! Library configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default ledger file name, relative to the library root.
pub const DEFAULT_LEDGER_FILE: &str = ".hashes.json";

/// Default collection file name, relative to the library root.
pub const DEFAULT_DATABASE_FILE: &str = "tomes.json";

/// Where the catalog lives and where new books are picked up from.
///
/// ```toml
/// library_root = "/home/me/books"
/// retail_source = ["/home/me/downloads/retail"]
/// nonretail_source = ["/home/me/downloads/other"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub library_root: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_file: Option<PathBuf>,
    #[serde(default)]
    pub retail_source: Vec<PathBuf>,
    #[serde(default)]
    pub nonretail_source: Vec<PathBuf>,
}

impl Config {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(path, e.to_string()))?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::configuration(path, e.to_string()))
    }

    /// Path of the hash ledger.
    pub fn ledger_path(&self) -> PathBuf {
        self.resolve(self.ledger_file.as_deref(), DEFAULT_LEDGER_FILE)
    }

    /// Path of the collection database.
    pub fn database_path(&self) -> PathBuf {
        self.resolve(self.database_file.as_deref(), DEFAULT_DATABASE_FILE)
    }

    fn resolve(&self, configured: Option<&Path>, default: &str) -> PathBuf {
        match configured {
            Some(p) if p.is_absolute() => p.to_path_buf(),
            Some(p) => self.library_root.join(p),
            None => self.library_root.join(default),
        }
    }

    /// Source directories for retail or non-retail imports.
    ///
    /// An empty list is a configuration error.
    pub fn sources(&self, retail: bool) -> Result<&[PathBuf]> {
        let (sources, kind) = if retail {
            (&self.retail_source, "retail")
        } else {
            (&self.nonretail_source, "non-retail")
        };
        if sources.is_empty() {
            return Err(Error::configuration(
                &self.library_root,
                format!("no {} source found in configuration file", kind),
            ));
        }
        Ok(sources)
    }
}
