//! Fixtures shared by the import scenario tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tomes_core::{Collection, Error, HashLedger, Interaction, Metadata, MetadataExtractor, Result};

/// Interaction that replays scripted answers and records every prompt.
#[derive(Debug, Default)]
pub struct Scripted {
    confirms: VecDeque<bool>,
    lines: VecDeque<String>,
    pub prompts: Vec<String>,
    pub notices: Vec<String>,
}

impl Scripted {
    pub fn new(confirms: &[bool], lines: &[&str]) -> Self {
        Self {
            confirms: confirms.iter().copied().collect(),
            lines: lines.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Says yes to everything.
    pub fn yes(count: usize) -> Self {
        Self::new(&vec![true; count], &[])
    }

    /// Prompts that asked to confirm an import.
    pub fn import_prompts(&self) -> Vec<&String> {
        self.prompts.iter().filter(|p| p.starts_with("Found:")).collect()
    }
}

impl Interaction for Scripted {
    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_string());
        self.confirms.pop_front().unwrap_or(false)
    }

    fn prompt_line(&mut self, prompt: &str) -> io::Result<String> {
        self.prompts.push(prompt.to_string());
        self.lines
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more input"))
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

/// Extractor serving canned metadata keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct Canned(HashMap<String, Metadata>);

impl Canned {
    pub fn with(mut self, file: &str, author: &str, title: &str, isbn: Option<&str>) -> Self {
        self.0.insert(
            file.to_string(),
            Metadata {
                title: title.to_string(),
                authors: vec![author.to_string()],
                isbn: isbn.map(str::to_string),
                ..Metadata::default()
            },
        );
        self
    }
}

impl MetadataExtractor for Canned {
    fn read_metadata(&self, path: &Path) -> Result<Metadata> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.0
            .get(&name)
            .cloned()
            .ok_or_else(|| Error::extraction(path, "no metadata"))
    }
}

/// A library root with one source directory.
pub struct Library {
    pub temp_dir: TempDir,
    pub source: PathBuf,
}

impl Library {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("incoming");
        fs::create_dir(&source).unwrap();
        Self { temp_dir, source }
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.temp_dir.path().join(".hashes.json")
    }

    pub fn database_path(&self) -> PathBuf {
        self.temp_dir.path().join("tomes.json")
    }

    pub fn ledger(&self) -> HashLedger {
        HashLedger::open(self.ledger_path()).unwrap()
    }

    pub fn collection(&self) -> Collection {
        Collection::open(self.database_path()).unwrap()
    }

    /// Write a book into the source directory and return its path.
    pub fn book(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.source.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn sources(&self) -> Vec<PathBuf> {
        vec![self.source.clone()]
    }
}
