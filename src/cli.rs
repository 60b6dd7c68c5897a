//! Clap adapter for the confsync binary.
//!
//! Compiled only with the `cli` Cargo feature (on by default). The module
//! parses flags, merges them with the optional TOML config file, and drives
//! the library: build the document, diff it against the storage, push, or
//! fetch. All reconciliation logic lives in the CLI-free core modules.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::{self, FileConfig};
use crate::diff::ChangeSet;
use crate::error::ConfsyncError;
use crate::render::render;
use crate::source;
use crate::storage::{Storage, StorageRegistry};
use crate::template;

const DEFAULT_TEMPLATE: &str = "template.yaml";
const DEFAULT_SOURCE: &str = "file://sources.json";
const DEFAULT_STORAGE: &str = "file://confsync.json";
const DEFAULT_IGNORE: &str = "_ignore";

/// Keep stored configuration in sync with a rendered template.
#[derive(Debug, Parser)]
#[command(name = "confsync", version)]
pub struct Cli {
    /// TOML config file supplying defaults for the flags below.
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Template file.
    #[arg(short = 't', long, global = true)]
    pub template: Option<PathBuf>,

    /// Value source: `key=value` or `file://values.json`. Repeatable.
    #[arg(short = 's', long = "source", global = true)]
    pub sources: Vec<String>,

    /// Storage spec: `file://service.json` or `memory:`.
    #[arg(long, global = true)]
    pub storage: Option<String>,

    /// Template document format (`json`, `yaml`). Defaults to the template
    /// file extension.
    #[arg(short = 'f', long, global = true)]
    pub format: Option<String>,

    /// Keys whose desired value equals this are left alone.
    #[arg(short = 'i', long, global = true)]
    pub ignore: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render the template and print the result.
    Build,
    /// Show the changes the storage needs to match the rendered template.
    Diff {
        /// Restrict to a single key.
        #[arg(short = 'k', long)]
        key: Option<String>,
        /// Disable colored output.
        #[arg(short = 'p', long)]
        plain: bool,
    },
    /// Show the changes, confirm, and apply them to the storage.
    Push {
        /// Restrict to a single key.
        #[arg(short = 'k', long)]
        key: Option<String>,
        /// Disable colored output.
        #[arg(short = 'p', long)]
        plain: bool,
        /// Apply without asking.
        #[arg(long)]
        force: bool,
        /// Skip template validation. Meant for importing from a backup.
        #[arg(short = 'n', long)]
        no_validation: bool,
        /// Save the current storage content to a file before applying.
        #[arg(short = 'b', long)]
        backup: bool,
    },
    /// Print the current storage content.
    Fetch,
}

/// Flag and config-file values resolved into one place. Flags win over the
/// file; the file wins over built-in defaults.
#[derive(Debug, PartialEq)]
pub struct Settings {
    pub template: PathBuf,
    pub sources: Vec<String>,
    pub storage: String,
    pub format: Option<String>,
    pub ignore: String,
}

impl Settings {
    pub fn resolve(cli: &Cli, file: &FileConfig) -> Self {
        let template = cli
            .template
            .clone()
            .or_else(|| file.template.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE));
        let sources = if !cli.sources.is_empty() {
            cli.sources.clone()
        } else if !file.sources.is_empty() {
            file.sources.clone()
        } else {
            vec![DEFAULT_SOURCE.to_string()]
        };
        let storage = cli
            .storage
            .clone()
            .or_else(|| file.storage.clone())
            .unwrap_or_else(|| DEFAULT_STORAGE.to_string());
        let format = cli.format.clone().or_else(|| file.format.clone());
        let ignore = cli
            .ignore
            .clone()
            .or_else(|| file.ignore.clone())
            .unwrap_or_else(|| DEFAULT_IGNORE.to_string());

        Self {
            template,
            sources,
            storage,
            format,
            ignore,
        }
    }

    /// Document format: explicit flag, then template file extension, then
    /// yaml.
    pub fn document_format(&self) -> String {
        if let Some(format) = &self.format {
            return format.clone();
        }
        match self.template.extension().and_then(|e| e.to_str()) {
            Some("json") => "json".to_string(),
            _ => "yaml".to_string(),
        }
    }
}

/// Entry point used by the binary.
pub fn run(cli: Cli) -> Result<(), ConfsyncError> {
    let file = match &cli.config {
        Some(path) => config::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(&cli, &file);
    let registry = StorageRegistry::with_defaults();

    match &cli.command {
        Command::Build => {
            let rendered = build_document(&settings, true)?;
            io::stdout()
                .write_all(&rendered)
                .map_err(|source| ConfsyncError::WriteError {
                    path: PathBuf::from("<stdout>"),
                    source,
                })?;
            Ok(())
        }
        Command::Diff { key, plain } => {
            let storage = registry.open(&settings.storage)?;
            let cs = changes(&settings, storage.as_ref(), key.as_deref(), true)?;
            println!("{}", describe(&cs, key.as_deref(), !plain));
            Ok(())
        }
        Command::Push {
            key,
            plain,
            force,
            no_validation,
            backup,
        } => {
            let mut storage = registry.open(&settings.storage)?;
            let cs = changes(&settings, storage.as_ref(), key.as_deref(), !no_validation)?;
            if cs.is_empty() {
                println!("{}", describe(&cs, key.as_deref(), !plain));
                return Ok(());
            }

            println!("The following changes will be applied:");
            println!("{}", describe(&cs, key.as_deref(), !plain));

            if !*force && !prompt("Continue [y/N]: ") {
                println!("Canceled");
                return Ok(());
            }

            if *backup {
                let filename = save_backup(storage.as_ref())?;
                println!("Backup has been saved as {filename}");
            }

            println!("Applying changes...");
            storage.apply(&cs)?;
            info!(changes = cs.len(), "changes applied");
            println!("Done.");
            Ok(())
        }
        Command::Fetch => {
            let storage = registry.open(&settings.storage)?;
            let format = settings
                .format
                .clone()
                .unwrap_or_else(|| storage.default_format().to_string());
            if !storage.format_is_valid(&format) {
                return Err(ConfsyncError::UnknownFormat(format));
            }
            println!("{}", storage.fetch(&format)?);
            Ok(())
        }
    }
}

fn build_document(settings: &Settings, validate: bool) -> Result<Vec<u8>, ConfsyncError> {
    let values: BTreeMap<String, String> = source::load(&settings.sources)?;
    let template = fs::read(&settings.template).map_err(|source| ConfsyncError::IoError {
        path: settings.template.clone(),
        source,
    })?;
    template::build(&template, &values, validate)
}

fn changes(
    settings: &Settings,
    storage: &dyn Storage,
    key: Option<&str>,
    validate: bool,
) -> Result<ChangeSet, ConfsyncError> {
    let rendered = build_document(settings, validate)?;
    storage.changes(
        &rendered,
        &settings.document_format(),
        key.unwrap_or(""),
        &settings.ignore,
    )
}

/// Human description of a changeset. The renderer yields an empty string for
/// an empty set; the friendly message lives here.
fn describe(cs: &ChangeSet, key: Option<&str>, pretty: bool) -> String {
    if cs.is_empty() {
        return match key {
            Some(key) if !key.is_empty() => format!("No changes for key {key}"),
            _ => "No changes".to_string(),
        };
    }
    // render() terminates every line; trim the trailing newline since the
    // caller prints with println.
    render(cs, pretty).trim_end_matches('\n').to_string()
}

fn prompt(question: &str) -> bool {
    print!("{question}");
    let _ = io::stdout().flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    answer.trim().eq_ignore_ascii_case("y")
}

/// Write the current storage content to `<unix-time>_backup.txt`.
fn save_backup(storage: &dyn Storage) -> Result<String, ConfsyncError> {
    let content = storage.fetch(storage.default_format())?;
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let filename = format!("{stamp}_backup.txt");
    fs::write(Path::new(&filename), content).map_err(|source| ConfsyncError::WriteError {
        path: PathBuf::from(&filename),
        source,
    })?;
    Ok(filename)
}
