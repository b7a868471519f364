//! The single TOML configuration file. Every field defaults, so the file
//! may be absent entirely (`Config::default()`).

use log::warn;
use serde::Deserialize;
use std::path::Path;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FuzzyMatchingConfig {
    pub enabled: bool,
    pub max_edit_distance: usize,
    pub min_confidence: f32,
}

impl Default for FuzzyMatchingConfig {
    fn default() -> Self {
        FuzzyMatchingConfig {
            enabled: true,
            max_edit_distance: 3,
            min_confidence: 0.6,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EnglishContextProcessingConfig {
    pub enable_lexicon_corrections: bool,
    pub threshold_increase: f32,
    pub max_threshold: f32,
    pub proper_nouns_only: bool,
}

impl Default for EnglishContextProcessingConfig {
    fn default() -> Self {
        EnglishContextProcessingConfig {
            enable_lexicon_corrections: false,
            threshold_increase: 0.15,
            max_threshold: 0.95,
            proper_nouns_only: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub devanagari_to_iast: bool,
    pub use_iast_diacritics: bool,
    pub enable_phrase_matcher: bool,
    pub fuzzy_matching: FuzzyMatchingConfig,
    pub english_context_processing: EnglishContextProcessingConfig,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        ProcessingConfig {
            devanagari_to_iast: true,
            use_iast_diacritics: true,
            enable_phrase_matcher: true,
            fuzzy_matching: FuzzyMatchingConfig::default(),
            english_context_processing: EnglishContextProcessingConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ContextThresholds {
    pub english_confidence: f32,
    pub sanskrit_confidence: f32,
    pub mixed_content: f32,
    pub whitelist_override: f32,
    pub diacritical_density_high: f32,
    pub diacritical_density_medium: f32,
    pub english_markers_required: u32,
}

impl Default for ContextThresholds {
    fn default() -> Self {
        ContextThresholds {
            english_confidence: 0.8,
            sanskrit_confidence: 0.6,
            mixed_content: 0.5,
            whitelist_override: 0.9,
            diacritical_density_high: 0.3,
            diacritical_density_medium: 0.1,
            english_markers_required: 2,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ContextMarkers {
    pub sanskrit_priority_terms: Vec<String>,
    pub english_function_words: Vec<String>,
    pub sanskrit_diacriticals: Vec<String>,
    pub sanskrit_sacred_terms: Vec<String>,
}

impl Default for ContextMarkers {
    fn default() -> Self {
        ContextMarkers {
            sanskrit_priority_terms: vec![
                "dharma", "karma", "yoga", "jñāna", "jnana", "brahman", "guru", "mantra",
                "yogavāsiṣṭha", "yogavasistha", "śivāśiṣṭha", "shivashistha", "gītā", "gita",
                "upaniṣad", "upanishad",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            english_function_words: vec![
                "the", "and", "is", "are", "was", "were", "be", "being", "been", "have", "has",
                "had", "do", "does", "did", "will", "would", "could", "should", "may", "might",
                "can", "a", "an", "or", "but", "in", "on", "at", "by", "to", "of", "with", "from",
                "about",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            sanskrit_diacriticals: vec![
                "ā", "ī", "ū", "ṛ", "ṝ", "ḷ", "ṅ", "ñ", "ṇ", "ṭ", "ḍ", "ś", "ṣ", "ḥ", "ṁ",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            sanskrit_sacred_terms: vec![
                "oṁ", "oṃ", "namaḥ", "namah", "śrī", "sri", "mahā", "maha", "bhagavad", "gītā",
                "gita", "rāmāyaṇa", "ramayana", "kṛṣṇa", "krishna", "rāma", "rama", "vedanta",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContextDetectionConfig {
    pub thresholds: ContextThresholds,
    pub markers: ContextMarkers,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CachingConfig {
    pub enabled: bool,
    pub max_corrections: usize,
    pub max_proper_nouns: usize,
    pub max_memory_mb: usize,
}

impl Default for CachingConfig {
    fn default() -> Self {
        CachingConfig {
            enabled: true,
            max_corrections: 10_000,
            max_proper_nouns: 5_000,
            max_memory_mb: 20,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct QaThresholds {
    pub high_confidence: f32,
    pub medium_confidence: f32,
    pub low_confidence: f32,
}

impl Default for QaThresholds {
    fn default() -> Self {
        QaThresholds {
            high_confidence: 0.9,
            medium_confidence: 0.7,
            low_confidence: 0.5,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    pub enabled: bool,
    pub thresholds: QaThresholds,
}

impl Default for QaConfig {
    fn default() -> Self {
        QaConfig {
            enabled: true,
            thresholds: QaThresholds::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub processing: ProcessingConfig,
    pub context_detection: ContextDetectionConfig,
    pub caching: CachingConfig,
    pub qa: QaConfig,
}

impl Config {
    /// Loads configuration from a TOML file. A missing file is not an
    /// error — the file may be absent entirely; a malformed file logs a
    /// warning and falls back to defaults.
    pub fn load(path: Option<&Path>) -> Config {
        let Some(path) = path else {
            return Config::default();
        };
        match std::fs::read_to_string(path) {
            Ok(text) => match toml::from_str(&text) {
                Ok(config) => config,
                Err(err) => {
                    warn!("invalid configuration in {}: {err}; using defaults", path.display());
                    Config::default()
                }
            },
            Err(err) => {
                warn!("could not read configuration {}: {err}; using defaults", path.display());
                Config::default()
            }
        }
    }
}
