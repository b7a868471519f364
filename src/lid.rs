//! Optional per-segment language-identification metadata.
//!
//! Produced by a separate pipeline and supplied as a TOML file keyed by
//! segment number. Presence of this file for a given input automatically
//! enables LID-aware routing in `driver.rs`.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::DataError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Sa,
    Hi,
    Mixed,
    Unknown,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LidRecord {
    pub language: Language,
    pub language_confidence: f32,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub end_time: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Segment-number-keyed LID metadata for one input file.
#[derive(Clone, Debug, Default)]
pub struct LidMetadata {
    by_segment: HashMap<u32, LidRecord>,
}

#[derive(Deserialize)]
struct LidFile {
    #[serde(flatten)]
    segments: HashMap<String, LidRecord>,
}

impl LidMetadata {
    pub fn empty() -> LidMetadata {
        LidMetadata::default()
    }

    /// Loads LID metadata from a TOML file. Absence of the `--metadata`
    /// flag means this is never called; a malformed file is a data error
    /// and the caller degrades to no LID routing.
    pub fn load(path: &Path) -> Result<LidMetadata, DataError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DataError::LexiconUnreachable(format!("{}: {e}", path.display())))?;
        let file: LidFile = toml::from_str(&text)
            .map_err(|e| DataError::InvalidConfig {
                field: "metadata".to_string(),
                reason: e.to_string(),
            })?;
        let mut by_segment = HashMap::new();
        for (key, record) in file.segments {
            if let Ok(segment_number) = key.parse::<u32>() {
                by_segment.insert(segment_number, record);
            }
        }
        Ok(LidMetadata { by_segment })
    }

    pub fn get(&self, segment_id: u32) -> Option<&LidRecord> {
        self.by_segment.get(&segment_id)
    }
}
