//! Overlay files: small, process-local TOML tables of lexicon records that
//! supplement the on-disk tabular store.
//!
//! ```toml
//! [[entries]]
//! original_term = "jnana"
//! variations = ["gyana", "jnyana"]
//! transliteration = "jñāna"
//! category = "concept"
//! confidence = 0.92
//! is_compound = false
//! asr_common_error = true
//! asr_priority = true
//!
//! [[asr_corrections]]
//! original_term = "vasistha"
//! variations = ["vasishta", "wasistha"]
//! transliteration = "vāsiṣṭha"
//! category = "person"
//! confidence = 0.9
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::entry::{Category, DifficultyLevel, EntryFlags, FrequencyRating, LexiconEntry};
use crate::error::LexiconError;

/// One raw overlay record, as it appears in a TOML overlay file. Mirrors the
/// tabular store's columns, plus `asr_priority`.
#[derive(Clone, Debug, Deserialize)]
pub struct OverlayRecord {
    pub original_term: String,
    #[serde(default)]
    pub variations: Vec<String>,
    pub transliteration: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    #[serde(default)]
    pub context_clues: Vec<String>,
    #[serde(default)]
    pub is_compound: bool,
    #[serde(default)]
    pub asr_common_error: bool,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub frequency_rating: Option<String>,
    #[serde(default)]
    pub source_authority: Option<String>,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    /// Elevates this record above a store record of equal confidence.
    /// Ties are already broken in the overlay's favor by the
    /// store's merge rule (invariant 4); this flag documents the intent at
    /// the data level and is kept for round-tripping overlay files.
    #[serde(default)]
    pub asr_priority: bool,
}

fn default_confidence() -> f32 {
    0.75
}

/// A parsed overlay file: two optional tables of records.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OverlayFile {
    #[serde(default)]
    pub entries: Vec<OverlayRecord>,
    #[serde(default)]
    pub asr_corrections: Vec<OverlayRecord>,
}

impl OverlayFile {
    /// Loads and parses a single overlay TOML file.
    pub fn load(path: &Path) -> Result<OverlayFile, LexiconError> {
        let text = std::fs::read_to_string(path).map_err(|source| LexiconError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| LexiconError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// All records in this file, `entries` followed by `asr_corrections`.
    pub fn all_records(&self) -> impl Iterator<Item = &OverlayRecord> {
        self.entries.iter().chain(self.asr_corrections.iter())
    }
}

impl OverlayRecord {
    /// Converts this record into a [`LexiconEntry`], or `None` if a required
    /// field is malformed (logged by the caller, not here, since the caller
    /// knows the file path for the log message).
    pub fn into_entry(self) -> Option<LexiconEntry> {
        let category = match self.category.as_deref() {
            Some(raw) => raw.parse::<Category>().ok()?,
            None => Category::Other,
        };
        let frequency_rating = match self.frequency_rating.as_deref() {
            Some(raw) => raw.parse::<FrequencyRating>().ok()?,
            None => FrequencyRating::Medium,
        };
        let difficulty_level = match self.difficulty_level.as_deref() {
            Some(raw) => raw.parse::<DifficultyLevel>().ok()?,
            None => DifficultyLevel::Beginner,
        };
        let mut flags = EntryFlags::new();
        flags.set_is_compound(self.is_compound);
        flags.set_asr_common_error(self.asr_common_error);
        // Overlay records never set preserve_capitalization directly; that
        // flag is reserved for store-sourced entries that a maintainer has
        // deliberately curated (mantra fingerprints, proper nouns with a
        // fixed house style).
        Some(LexiconEntry {
            canonical: self.transliteration,
            variations: {
                let mut v = self.variations;
                v.push(self.original_term);
                v
            },
            category,
            confidence: self.confidence.clamp(0.0, 1.0),
            flags,
            error_type: self.error_type,
            context_clues: self.context_clues,
            frequency_rating,
            source_authority: self.source_authority,
            difficulty_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_overlay() {
        let toml_text = r#"
            [[entries]]
            original_term = "jnana"
            transliteration = "jñāna"
            category = "concept"
            confidence = 0.92
        "#;
        let file: OverlayFile = toml::from_str(toml_text).unwrap();
        assert_eq!(file.entries.len(), 1);
        let entry = file.entries[0].clone().into_entry().unwrap();
        assert_eq!(entry.canonical, "jñāna");
        assert!(entry.variations.contains(&"jnana".to_string()));
        assert_eq!(entry.category, Category::Concept);
    }

    #[test]
    fn defaults_missing_optional_fields() {
        let toml_text = r#"
            [[asr_corrections]]
            original_term = "vasistha"
            transliteration = "vāsiṣṭha"
        "#;
        let file: OverlayFile = toml::from_str(toml_text).unwrap();
        let entry = file.asr_corrections[0].clone().into_entry().unwrap();
        assert_eq!(entry.category, Category::Other);
        assert_eq!(entry.confidence, 0.75);
    }
}
