//! The lexicon's core record types.
//!
//! A [`LexiconEntry`] is immutable once built: every variation string is
//! itself a lookup key pointing back at the same entry (the store, not this
//! module, is responsible for expanding variations into secondary index
//! entries — see `samskara_lexicon::store`).

use modular_bitfield::prelude::*;
use serde::{Deserialize, Serialize};

/// The semantic category of a lexicon entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Deity,
    Person,
    Place,
    Scripture,
    Concept,
    Practice,
    Other,
}

impl Category {
    /// Returns whether this category counts as a "proper noun" for the
    /// proper-nouns view.
    pub fn is_proper_noun(&self) -> bool {
        matches!(self, Category::Deity | Category::Person | Category::Place)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deity" => Ok(Category::Deity),
            "person" => Ok(Category::Person),
            "place" => Ok(Category::Place),
            "scripture" => Ok(Category::Scripture),
            "concept" => Ok(Category::Concept),
            "practice" => Ok(Category::Practice),
            "other" | "" => Ok(Category::Other),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// How often a term is expected to appear in typical lecture material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyRating {
    High,
    Medium,
    Low,
}

impl std::str::FromStr for FrequencyRating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(FrequencyRating::High),
            "medium" => Ok(FrequencyRating::Medium),
            "low" | "" => Ok(FrequencyRating::Low),
            other => Err(format!("unknown frequency_rating: {other}")),
        }
    }
}

/// How advanced a student needs to be to recognize a term unaided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl std::str::FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beginner" | "" => Ok(DifficultyLevel::Beginner),
            "intermediate" => Ok(DifficultyLevel::Intermediate),
            "advanced" => Ok(DifficultyLevel::Advanced),
            other => Err(format!("unknown difficulty_level: {other}")),
        }
    }
}

/// Compact packed flags for a [`LexiconEntry`].
///
/// Packed with `modular_bitfield` rather than three `bool` fields so that
/// entries stay cheap to clone when the store holds hundreds of thousands of
/// them.
#[bitfield(bits = 8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntryFlags {
    pub is_compound: bool,
    pub asr_common_error: bool,
    pub preserve_capitalization: bool,
    #[skip]
    __: B5,
}

/// A single lexicon record: a canonical Sanskrit/Hindi term plus the
/// metadata the correction pipeline needs to decide whether, and how
/// confidently, to apply it.
#[derive(Clone, Debug, PartialEq)]
pub struct LexiconEntry {
    /// The desired output string. May contain IAST diacritics and spaces.
    pub canonical: String,
    /// Alternate surface forms. Each is also a lookup key for this entry.
    pub variations: Vec<String>,
    pub category: Category,
    /// Confidence in [0, 1] that this entry is the correct normalization.
    pub confidence: f32,
    pub flags: EntryFlags,
    /// Which ASR pattern (if any) produced this variation, for diagnostics.
    pub error_type: Option<String>,
    pub context_clues: Vec<String>,
    pub frequency_rating: FrequencyRating,
    pub source_authority: Option<String>,
    pub difficulty_level: DifficultyLevel,
}

impl LexiconEntry {
    /// Returns every string this entry should be indexed under: its
    /// canonical form's lowercase, plus each variation's lowercase.
    ///
    /// The canonical form itself is deliberately included: a segment may
    /// already contain the correct spelling, and it should still resolve to
    /// this entry (e.g. for capitalization/flag lookups) rather than miss.
    pub fn lookup_keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.variations.len() + 1);
        keys.push(self.canonical.to_lowercase());
        for v in &self.variations {
            keys.push(v.to_lowercase());
        }
        keys
    }
}
