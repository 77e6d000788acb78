mod output;
mod terminal;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use output::{
    BookInfo, CandidateInfo, CandidateResult, ImportOutput, InfoData, InfoOutput, LibrarySummary,
    ListOutput, OutputWriter, RESULT_ERROR, RESULT_NOTHING_TO_IMPORT, RESULT_OK,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use terminal::Terminal;
use tomes_core::{Collection, Config, EpubExtractor, HashLedger, ImportReport, Importer};

/// Tomes - A personal e-book catalog
#[derive(Parser)]
#[command(name = "tomes")]
#[command(about = "Catalog e-books without importing the same file twice", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to TOMES_CONFIG env var or ./tomes.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log debug information to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceKind {
    Retail,
    Nonretail,
}

impl SourceKind {
    fn is_retail(self) -> bool {
        matches!(self, SourceKind::Retail)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Import e-books from the configured sources, or the given files
    Import {
        /// Tag imported files as retail or non-retail
        #[arg(value_enum)]
        kind: SourceKind,

        /// Specific files to import instead of scanning the sources
        paths: Vec<PathBuf>,
    },

    /// List e-books in the configured sources that could be imported
    List {
        #[arg(value_enum)]
        kind: SourceKind,
    },

    /// Show the library summary, or one book
    Info {
        /// Book ID
        id: Option<u64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = OutputWriter::new(cli.json);

    // Determine config path: CLI arg > TOMES_CONFIG env var > ./tomes.toml default
    let config_path = cli
        .config
        .or_else(|| std::env::var("TOMES_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./tomes.toml"));

    let result = match cli.command {
        Commands::Import { kind, paths } => cmd_import(&config_path, kind, paths, &output),
        Commands::List { kind } => cmd_list(&config_path, kind, &output),
        Commands::Info { id } => cmd_info(&config_path, id, &output),
    };

    match result {
        Ok(()) => ExitCode::from(RESULT_OK),
        Err(e) => {
            let code = result_code(&e);
            output.emit_error(&e, code);
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn result_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<tomes_core::Error>() {
        Some(tomes_core::Error::NothingToImport) => RESULT_NOTHING_TO_IMPORT,
        _ => RESULT_ERROR,
    }
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).with_context(|| format!("Failed to load configuration {}", path.display()))
}

fn cmd_import(
    config_path: &Path,
    kind: SourceKind,
    paths: Vec<PathBuf>,
    output: &OutputWriter,
) -> Result<()> {
    let config = load_config(config_path)?;
    let retail = kind.is_retail();
    let mut importer = Importer::open(&config, EpubExtractor, Terminal::stdin())
        .with_context(|| "Failed to open library")?;

    let report = if paths.is_empty() {
        let sources = config.sources(retail)?;
        importer
            .import_from_sources(sources, retail)
            .with_context(|| "Failed to import from sources")?
    } else {
        importer
            .import_specific_paths(&paths, retail)
            .with_context(|| "Failed to import files")?
    };

    write_import_report(output, &report, retail)
}

fn write_import_report(output: &OutputWriter, report: &ImportReport, retail: bool) -> Result<()> {
    let data = ImportOutput {
        success: true,
        result_code: RESULT_OK,
        retail,
        imported: report.imported,
        candidates: report
            .outcomes
            .iter()
            .map(|(path, outcome)| CandidateResult::new(path, outcome))
            .collect(),
    };

    output.emit(&data, || {
        let mut text = format!(
            "Imported {} {} epubs.\n",
            report.imported,
            if retail { "retail" } else { "non-retail" }
        );
        let skipped = report.skipped().count();
        if skipped > 0 {
            text.push_str(&format!("Skipped {}:\n", skipped));
            for (path, outcome) in report.skipped() {
                let result = CandidateResult::new(path, outcome);
                match result.reason {
                    Some(reason) => {
                        text.push_str(&format!(" - {} ({}: {})\n", result.path, result.outcome, reason))
                    }
                    None => text.push_str(&format!(" - {} ({})\n", result.path, result.outcome)),
                }
            }
        }
        text
    })
}

fn cmd_list(config_path: &Path, kind: SourceKind, output: &OutputWriter) -> Result<()> {
    let config = load_config(config_path)?;
    let retail = kind.is_retail();
    let sources = config.sources(retail)?;

    let mut importer = Importer::open(&config, EpubExtractor, Terminal::stdin())
        .with_context(|| "Failed to open library")?;
    let candidates = importer
        .analyze_sources(sources)
        .with_context(|| "Failed to scan sources")?;

    let importable: Vec<CandidateInfo> = candidates.importable().map(CandidateInfo::from).collect();
    let data = ListOutput {
        success: true,
        result_code: RESULT_OK,
        retail,
        importable: importable.clone(),
    };

    output.emit(&data, || {
        let kind = if retail { "retail" } else { "non-retail" };
        if importable.is_empty() {
            return "Nothing to import.\n".to_string();
        }
        let mut text = format!("Found {} {} epubs to import:\n", importable.len(), kind);
        for candidate in &importable {
            text.push_str(&format!(" - {}", candidate.path));
            if candidate.previously_imported {
                text.push_str(" (previously imported)");
            }
            text.push('\n');
        }
        text
    })
}

fn cmd_info(config_path: &Path, id: Option<u64>, output: &OutputWriter) -> Result<()> {
    let config = load_config(config_path)?;
    let collection = Collection::open(config.database_path())
        .with_context(|| format!("Failed to open {}", config.database_path().display()))?;

    let data = match id {
        Some(id) => {
            let entry = collection.find_by_id(id)?;
            InfoData::Book(BookInfo::from(entry))
        }
        None => {
            let ledger = HashLedger::open(config.ledger_path())
                .with_context(|| format!("Failed to open {}", config.ledger_path().display()))?;
            InfoData::Library(LibrarySummary {
                books: collection.len(),
                retail_books: collection.iter().filter(|e| e.has_retail()).count(),
                known_hashes: ledger.len(),
            })
        }
    };

    let output_data = InfoOutput {
        success: true,
        result_code: RESULT_OK,
        data,
    };

    output.emit(&output_data, || match &output_data.data {
        InfoData::Library(summary) => format!(
            "Books: {}\nWith retail epub: {}\nKnown epub hashes: {}\n",
            summary.books, summary.retail_books, summary.known_hashes
        ),
        InfoData::Book(book) => {
            let mut text = format!("ID: {}\nTitle: {}\nAuthors: {}\n", book.id, book.title, book.authors.join(", "));
            if let Some(isbn) = &book.isbn {
                text.push_str(&format!("ISBN: {}\n", isbn));
            }
            if let Some(year) = &book.year {
                text.push_str(&format!("Year: {}\n", year));
            }
            if let Some(language) = &book.language {
                text.push_str(&format!("Language: {}\n", language));
            }
            for file in &book.files {
                text.push_str(&format!(
                    "File: {} ({}{}) {}\n",
                    file.path,
                    if file.retail { "retail" } else { "non-retail" },
                    if file.present { "" } else { ", missing" },
                    file.hash
                ));
            }
            text
        }
    })
}
