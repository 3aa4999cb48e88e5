use std::path::PathBuf;
use thiserror::Error;

/// Raised when a currency code outside the supported set reaches the formatter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormattingError {
    #[error("unsupported currency code `{0}` (expected USD, MXN or EUR)")]
    UnsupportedCurrency(String),
}

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("invoice template error: {0}")]
    Template(#[from] tera::Error),
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("'typst' is not installed or not on PATH")]
    TypstMissing,
    #[error("typst compilation failed: {0}")]
    Compile(String),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine the settings directory")]
    NoConfigDir,
    #[error("failed to write settings to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}
