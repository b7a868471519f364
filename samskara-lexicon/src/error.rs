//! Errors the lexicon crate can produce.
//!
//! None of these are fatal to startup: the store degrades to
//! overlay-only operation on any of them. They exist so the caller (the
//! `samskara` driver) can log a precise warning and record the degradation
//! in the run summary, not so it can abort.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed overlay file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("malformed tabular store {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("tabular store {path} has unsupported schema version {found} (expected {expected})")]
    UnsupportedSchemaVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
}

pub type LexiconResult<T> = Result<T, LexiconError>;
