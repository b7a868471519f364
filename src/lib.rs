//! `samskara`: normalizes misrecognized Sanskrit/Hindi vocabulary in ASR
//! subtitle transcripts into canonical IAST.
//!
//! The pipeline, in order: [`script`] normalizes Devanagari to IAST and
//! cleans up whitespace/fillers; [`phrase`] replaces recognized prayers
//! and compound titles as atomic units; [`context`] classifies each
//! segment; the per-token word loop tries [`samskara_lexicon`], then
//! [`asr_patterns`], then [`fuzzy`]; [`capitalize`] restores the source's
//! capitalization pattern; [`driver`] orchestrates all of the above, and
//! [`metrics`] aggregates the result into a quality report.

pub mod asr_patterns;
pub mod cache;
pub mod capitalize;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod fuzzy;
pub mod lid;
pub mod metrics;
pub mod phrase;
pub mod script;
pub mod segment;
pub mod subtitle;

pub use config::Config;
pub use driver::{CorrectionDriver, Options, ProcessingResult};
pub use error::{DataError, InputError, SamskaraError, SamskaraResult};
pub use segment::{CorrectionRecord, MatchType, Segment};
