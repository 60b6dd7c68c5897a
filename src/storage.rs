//! Storage backends and their registry.
//!
//! [`Storage`] is what the CLI talks to: fetch the current content, compute
//! the changes against a rendered document, apply them. Two shapes exist:
//!
//! - [`KvStorage`] — per-key reconciliation over any [`KvBackend`]; this is
//!   where the flatten/diff core does its work.
//! - [`FileStorage`] — a single opaque blob; the whole content either matches
//!   or it doesn't, so the changeset holds at most one entry.
//!
//! Backends are looked up through an explicit [`StorageRegistry`] value
//! constructed at startup; there is no global table.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::diff::{Change, ChangeSet, diff};
use crate::error::ConfsyncError;
use crate::flatten::{Format, flatten};
use crate::nested::{DisplayFormat, to_display_string, to_nested};
use crate::store::{self, KvBackend, MemoryKv};

/// A place where a service's configuration lives.
pub trait Storage {
    /// Current content, rendered in `format` for the operator.
    fn fetch(&self, format: &str) -> Result<String, ConfsyncError>;

    /// Format used by `fetch` when the caller doesn't pick one.
    fn default_format(&self) -> &'static str;

    fn format_is_valid(&self, format: &str) -> bool;

    /// Changes that would make this storage match the rendered document.
    fn changes(
        &self,
        rendered: &[u8],
        format: &str,
        key: &str,
        ignore: &str,
    ) -> Result<ChangeSet, ConfsyncError>;

    fn apply(&mut self, cs: &ChangeSet) -> Result<(), ConfsyncError>;
}

/// Per-key storage over a hierarchical KV backend.
pub struct KvStorage<B: KvBackend> {
    backend: B,
}

impl<B: KvBackend> KvStorage<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    fn current(&self) -> Result<BTreeMap<String, String>, ConfsyncError> {
        let pairs = self
            .backend
            .list()
            .map_err(|source| ConfsyncError::StoreList { source })?;
        Ok(pairs.into_iter().map(|p| (p.key, p.value)).collect())
    }
}

impl<B: KvBackend> Storage for KvStorage<B> {
    fn fetch(&self, format: &str) -> Result<String, ConfsyncError> {
        let pairs = self
            .backend
            .list()
            .map_err(|source| ConfsyncError::StoreList { source })?;
        let nested = to_nested(&pairs);
        Ok(to_display_string(
            &nested,
            DisplayFormat::parse_or_default(format),
        ))
    }

    fn default_format(&self) -> &'static str {
        "json"
    }

    fn format_is_valid(&self, format: &str) -> bool {
        matches!(format, "json" | "yaml" | "yml" | "jsonraw")
    }

    fn changes(
        &self,
        rendered: &[u8],
        format: &str,
        key: &str,
        ignore: &str,
    ) -> Result<ChangeSet, ConfsyncError> {
        let desired = flatten(rendered, format.parse::<Format>()?)?;
        let current = self.current()?;
        Ok(diff(&current, &desired, key, ignore))
    }

    fn apply(&mut self, cs: &ChangeSet) -> Result<(), ConfsyncError> {
        store::apply(cs, &mut self.backend)
    }
}

/// Whole-file storage. No structural diff: the content either matches the
/// rendered document byte for byte, or a single change replaces it.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<Vec<u8>, ConfsyncError> {
        fs::read(&self.path).map_err(|source| ConfsyncError::IoError {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, content: &[u8]) -> Result<(), ConfsyncError> {
        fs::write(&self.path, content).map_err(|source| ConfsyncError::WriteError {
            path: self.path.clone(),
            source,
        })
    }
}

impl Storage for FileStorage {
    fn fetch(&self, _format: &str) -> Result<String, ConfsyncError> {
        Ok(String::from_utf8_lossy(&self.read()?).into_owned())
    }

    fn default_format(&self) -> &'static str {
        "string"
    }

    fn format_is_valid(&self, _format: &str) -> bool {
        true
    }

    fn changes(
        &self,
        rendered: &[u8],
        _format: &str,
        _key: &str,
        _ignore: &str,
    ) -> Result<ChangeSet, ConfsyncError> {
        let current = self.read()?;
        if current == rendered {
            return Ok(ChangeSet::new());
        }
        Ok(ChangeSet::from(vec![Change::Update {
            key: self.path.display().to_string(),
            old: String::from_utf8_lossy(&current).into_owned(),
            new: String::from_utf8_lossy(rendered).into_owned(),
        }]))
    }

    fn apply(&mut self, cs: &ChangeSet) -> Result<(), ConfsyncError> {
        for change in cs {
            match change {
                Change::Add { new, .. } | Change::Update { new, .. } => {
                    self.write(new.as_bytes())?;
                }
                Change::Remove { .. } => self.write(b"")?,
            }
        }
        Ok(())
    }
}

type Constructor = Box<dyn Fn(&str) -> Result<Box<dyn Storage>, ConfsyncError>>;

/// Maps a storage scheme to its constructor. Built once at startup and
/// passed to whoever needs to open a storage.
pub struct StorageRegistry {
    constructors: BTreeMap<String, Constructor>,
}

impl StorageRegistry {
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registry with the built-in schemes: `file` and `memory`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("file", |rest| {
            Ok(Box::new(FileStorage::new(rest)) as Box<dyn Storage>)
        });
        registry.register("memory", |_rest| {
            Ok(Box::new(KvStorage::new(MemoryKv::new())) as Box<dyn Storage>)
        });
        registry
    }

    pub fn register<F>(&mut self, scheme: &str, constructor: F)
    where
        F: Fn(&str) -> Result<Box<dyn Storage>, ConfsyncError> + 'static,
    {
        self.constructors
            .insert(scheme.to_string(), Box::new(constructor));
    }

    /// Open a storage from a spec like `file://service.json` or `memory:`.
    /// A bare path with no scheme is treated as a file path; a colon only
    /// counts as a scheme delimiter when what precedes it looks like a
    /// scheme, so paths like `backups/2026:08/svc.json` stay file paths.
    pub fn open(&self, spec: &str) -> Result<Box<dyn Storage>, ConfsyncError> {
        let (scheme, rest) = match spec.split_once("://") {
            Some((scheme, rest)) => (scheme, rest),
            None => match spec.split_once(':') {
                Some((scheme, rest)) if is_scheme(scheme) => (scheme, rest),
                _ => ("file", spec),
            },
        };
        let constructor =
            self.constructors
                .get(scheme)
                .ok_or_else(|| ConfsyncError::UnknownScheme {
                    scheme: scheme.to_string(),
                })?;
        constructor(rest)
    }
}

fn is_scheme(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphanumeric())
}

impl Default for StorageRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
