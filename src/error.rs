use std::path::PathBuf;
use thiserror::Error;

/// Boxed error produced by a storage backend. Backends wrap whatever their
/// transport returns; confsync adds the call-site context.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ConfsyncError {
    #[error("parsing json failed: {0}")]
    JsonDecode(#[from] serde_json::Error),

    #[error("parsing yaml failed: {0}")]
    YamlDecode(#[from] serde_yaml::Error),

    #[error("unsupported document format '{0}' (expected json or yaml)")]
    UnknownFormat(String),

    #[error("value at '{key}' is not a string, number, bool, or map")]
    UnsupportedValue { key: String },

    #[error("map key under '{path}' is not a string")]
    NonStringKey { path: String },

    #[error("duplicated key '{key}' across value sources")]
    DuplicateKey { key: String },

    #[error("template references unknown value '{name}'")]
    MissingPlaceholder { name: String },

    #[error("unterminated placeholder starting at byte {offset}")]
    UnterminatedPlaceholder { offset: usize },

    #[error("invalid source spec '{spec}'")]
    InvalidSource { spec: String },

    #[error("unknown storage scheme '{scheme}'")]
    UnknownScheme { scheme: String },

    #[error("listing store content failed: {source}")]
    StoreList { source: BackendError },

    #[error("setting key '{key}' failed: {source}")]
    StorePut { key: String, source: BackendError },

    #[error("deleting key '{key}' failed: {source}")]
    StoreDelete { key: String, source: BackendError },

    #[error("failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
}
