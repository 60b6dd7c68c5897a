//! Value sources for template building.
//!
//! A source is a flat mapping of placeholder name to value. Sources come from
//! literal `key=value` specs or from JSON/YAML files, and multiple sources
//! merge into one mapping; the same key appearing in two sources is a hard
//! error, not a precedence rule.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::ConfsyncError;
use crate::flatten::{Format, decode};

/// Load and merge a list of source specs.
///
/// Each spec is either `key=value` or a file reference (`file://values.json`
/// or a bare path); the file format comes from the extension.
pub fn load(specs: &[String]) -> Result<BTreeMap<String, String>, ConfsyncError> {
    let mut sources = Vec::with_capacity(specs.len());
    for spec in specs {
        if let Some(path) = spec.strip_prefix("file://") {
            sources.push(from_file(Path::new(path))?);
        } else if spec.contains('=') {
            let (key, value) = parse_literal(spec)?;
            sources.push(BTreeMap::from([(key, value)]));
        } else {
            sources.push(from_file(Path::new(spec))?);
        }
    }
    merge(sources)
}

fn parse_literal(spec: &str) -> Result<(String, String), ConfsyncError> {
    match spec.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(ConfsyncError::InvalidSource {
            spec: spec.to_string(),
        }),
    }
}

/// Read a source file. Top-level values must be scalars; the file's job is
/// to name template placeholders, not to nest structure.
pub fn from_file(path: &Path) -> Result<BTreeMap<String, String>, ConfsyncError> {
    let format = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Format::Json,
        Some("yaml") | Some("yml") => Format::Yaml,
        other => {
            return Err(ConfsyncError::UnknownFormat(
                other.unwrap_or_default().to_string(),
            ));
        }
    };
    let data = fs::read(path).map_err(|source| ConfsyncError::IoError {
        path: path.to_path_buf(),
        source,
    })?;

    let root = decode(&data, format)?;
    let mut out = BTreeMap::new();
    for (key, node) in root {
        match node.scalar_string() {
            Some(value) => {
                out.insert(key, value);
            }
            None => return Err(ConfsyncError::UnsupportedValue { key }),
        }
    }
    Ok(out)
}

/// Merge sources into one mapping, rejecting duplicated keys. On error the
/// partial merge is discarded; callers never see a half-merged mapping.
pub fn merge(
    sources: Vec<BTreeMap<String, String>>,
) -> Result<BTreeMap<String, String>, ConfsyncError> {
    let mut merged = BTreeMap::new();
    for source in sources {
        for (key, value) in source {
            if merged.contains_key(&key) {
                return Err(ConfsyncError::DuplicateKey { key });
            }
            merged.insert(key, value);
        }
    }
    Ok(merged)
}
