//! The three failure kinds, surfaced distinctly: input errors, data
//! errors, and the umbrella error the CLI maps to an exit code.
//!
//! Only [`InputError`] is meant to reach the process entry point and become
//! a non-zero exit code. [`DataError`] is always caught, logged as a
//! warning, and turned into a degraded-mode continuation. Per-segment
//! failures never become a [`SamskaraError`] at all — see `driver.rs`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("input file not found: {0}")]
    NotFound(PathBuf),

    #[error("could not read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8")]
    NotUtf8 { path: PathBuf },

    #[error("{path} contains no valid subtitle segments")]
    NoValidSegments { path: PathBuf },

    #[error("could not write {path}: {source}")]
    OutputUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("lexicon store unreachable: {0}")]
    LexiconUnreachable(String),

    #[error("malformed overlay record: {0}")]
    MalformedOverlay(String),

    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },
}

#[derive(Debug, Error)]
pub enum SamskaraError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Data(#[from] DataError),
}

pub type SamskaraResult<T> = Result<T, SamskaraError>;
