//! Optional TOML config file for the CLI.
//!
//! Everything in it can also be given as a flag; flags win. Unknown keys are
//! rejected so a typo fails loudly instead of silently using defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfsyncError;

#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Template file path, relative to the config file's directory.
    pub template: Option<PathBuf>,
    /// Source specs (`key=value`, `file://values.json`). File paths are
    /// relative to the config file's directory.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Storage spec (`file://service.json`, `memory:`).
    pub storage: Option<String>,
    /// Template document format (`json`, `yaml`).
    pub format: Option<String>,
    /// Ignore-sentinel value.
    pub ignore: Option<String>,
}

impl FileConfig {
    /// Rewrites relative paths to be relative to `dir`, the config file's
    /// directory, so the file means the same thing from any CWD. Literal
    /// `key=value` sources and absolute paths pass through untouched.
    fn anchor(&mut self, dir: &Path) {
        if let Some(template) = self.template.take() {
            self.template = Some(anchor_path(dir, template));
        }
        for source in &mut self.sources {
            if let Some(rest) = source.strip_prefix("file://") {
                *source = format!("file://{}", anchor_path(dir, rest).display());
            } else if !source.contains('=') {
                *source = anchor_path(dir, source.as_str()).display().to_string();
            }
        }
    }
}

fn anchor_path(dir: &Path, path: impl Into<PathBuf>) -> PathBuf {
    let path = path.into();
    if path.is_relative() {
        dir.join(path)
    } else {
        path
    }
}

pub fn load(path: &Path) -> Result<FileConfig, ConfsyncError> {
    let content = fs::read_to_string(path).map_err(|source| ConfsyncError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: FileConfig =
        toml::from_str(&content).map_err(|source| ConfsyncError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;
    if let Some(dir) = path.parent() {
        config.anchor(dir);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn config_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn full_config_parses() {
        let file = config_file(
            r#"
            template = "service.yaml"
            sources = ["env=prod", "file://values.json"]
            storage = "file://service.json"
            format = "yaml"
            ignore = "_secret"
            "#,
        );
        let config = load(file.path()).unwrap();
        let dir = file.path().parent().unwrap();
        assert_eq!(config.template, Some(dir.join("service.yaml")));
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.storage.as_deref(), Some("file://service.json"));
        assert_eq!(config.format.as_deref(), Some("yaml"));
        assert_eq!(config.ignore.as_deref(), Some("_secret"));
    }

    #[test]
    fn partial_config_leaves_rest_unset() {
        let file = config_file(r#"template = "t.yaml""#);
        let config = load(file.path()).unwrap();
        assert!(config.storage.is_none());
        assert!(config.sources.is_empty());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let file = config_file("templte = \"typo.yaml\"\n");
        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, ConfsyncError::ParseError { .. }));
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("confsync.toml");
        std::fs::write(
            &path,
            r#"
            template = "service.yaml"
            sources = ["file://values.json", "extras.json", "env=prod"]
            "#,
        )
        .unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.template, Some(dir.path().join("service.yaml")));
        assert_eq!(
            config.sources[0],
            format!("file://{}", dir.path().join("values.json").display())
        );
        assert_eq!(
            config.sources[1],
            dir.path().join("extras.json").display().to_string()
        );
        assert_eq!(config.sources[2], "env=prod");
    }

    #[test]
    fn absolute_paths_stay_put() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("confsync.toml");
        std::fs::write(
            &path,
            r#"
            template = "/etc/confsync/service.yaml"
            sources = ["file:///etc/confsync/values.json"]
            "#,
        )
        .unwrap();

        let config = load(&path).unwrap();
        assert_eq!(
            config.template.as_deref(),
            Some(Path::new("/etc/confsync/service.yaml"))
        );
        assert_eq!(config.sources[0], "file:///etc/confsync/values.json");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load(Path::new("/nonexistent/confsync.toml")).unwrap_err();
        assert!(matches!(err, ConfsyncError::IoError { .. }));
    }
}
