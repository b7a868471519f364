//! The per-segment context classifier.
//!
//! A layered decision: the first layer with sufficient confidence wins.
//! Modeled as a tagged union rather than a struct with optional fields,
//! since the five outcomes carry genuinely different auxiliary data.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::cache::BoundedCache;
use crate::config::Config;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessingMode {
    Default,
    Aggressive,
    Conservative,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordTag {
    Sanskrit,
    English,
    Neutral,
}

#[derive(Clone, Debug)]
pub struct Span {
    pub start_token: usize,
    pub end_token: usize,
    pub tag: WordTag,
}

#[derive(Clone, Debug)]
pub enum ContextResult {
    English {
        confidence: f32,
        markers: Vec<String>,
    },
    Sanskrit {
        confidence: f32,
        markers: Vec<String>,
    },
    Mixed {
        confidence: f32,
        markers: Vec<String>,
        spans: Vec<Span>,
    },
    Invocation {
        confidence: f32,
        markers: Vec<String>,
        mode: ProcessingMode,
    },
    CorruptedSanskrit {
        confidence: f32,
        markers: Vec<String>,
    },
}

impl ContextResult {
    pub fn confidence(&self) -> f32 {
        match self {
            ContextResult::English { confidence, .. }
            | ContextResult::Sanskrit { confidence, .. }
            | ContextResult::Mixed { confidence, .. }
            | ContextResult::Invocation { confidence, .. }
            | ContextResult::CorruptedSanskrit { confidence, .. } => *confidence,
        }
    }

    pub fn is_english(&self) -> bool {
        matches!(self, ContextResult::English { .. })
    }

    pub fn is_sanskrit_like(&self) -> bool {
        matches!(
            self,
            ContextResult::Sanskrit { .. }
                | ContextResult::Invocation { .. }
                | ContextResult::CorruptedSanskrit { .. }
        )
    }
}

pub type ContextCache = BoundedCache<u64, ContextResult>;

pub fn new_cache(max_entries: usize, max_bytes: usize) -> ContextCache {
    BoundedCache::new(max_entries, max_bytes, |_, _| 256)
}

fn hash_text(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

lazy_static! {
    static ref INVOCATION_PATTERN: Regex =
        Regex::new(r"(?i)\bom[\s,]+.*\bnamah?\b").expect("invocation pattern is a fixed literal");
    static ref SCRIPTURE_COMMENTARY_PATTERN: Regex =
        Regex::new(r"(?i)\bchapter\s+\d+\s+entitled\b").expect("commentary pattern is a fixed literal");
    static ref CORRUPTED_VERSE_FRAGMENTS: Vec<Regex> = vec![
        Regex::new(r"(?i)p[uū]rna\W*m?adah").expect("verse fragment pattern is a fixed literal"),
        Regex::new(r"(?i)p[uū]rna\W*m?idam").expect("verse fragment pattern is a fixed literal"),
    ];
    static ref PROGRESSIVE_SUFFIX: Regex =
        Regex::new(r"(?i)\b\w+ing\b").expect("progressive pattern is a fixed literal");
    static ref PAST_SUFFIX: Regex =
        Regex::new(r"(?i)\b\w+ed\b").expect("past pattern is a fixed literal");
    static ref MODAL_PATTERN: Regex =
        Regex::new(r"(?i)\b(was|were|is|are)\b").expect("modal pattern is a fixed literal");
    static ref PRONOUN_MODAL_PATTERN: Regex =
        Regex::new(r"(?i)\b(he|she|it|they|we|i|you)\s+(was|were|is|are|will|would|can|could)\b")
            .expect("pronoun-modal pattern is a fixed literal");
    static ref SANSKRIT_INFLECTION_SUFFIX: Regex =
        Regex::new(r"(?i)\w+(am|aḥ|āya|asya|ena|ābhyām|ānām)\b")
            .expect("inflection pattern is a fixed literal");
}

fn word_tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| !w.is_empty())
        .collect()
}

fn diacritical_density(text: &str, diacriticals: &[String]) -> f32 {
    let alpha_chars: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    if alpha_chars.is_empty() {
        return 0.0;
    }
    let diacritic_set: std::collections::HashSet<char> =
        diacriticals.iter().filter_map(|s| s.chars().next()).collect();
    let count = alpha_chars.iter().filter(|c| diacritic_set.contains(c)).count();
    count as f32 / alpha_chars.len() as f32
}

fn contains_any_word(text_lower: &str, terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .filter(|term| {
            let pattern = format!(r"\b{}\b", regex::escape(&term.to_lowercase()));
            Regex::new(&pattern).map(|re| re.is_match(text_lower)).unwrap_or(false)
        })
        .cloned()
        .collect()
}

fn whitelist_override(text: &str, text_lower: &str, config: &Config) -> Option<ContextResult> {
    let hits = contains_any_word(text_lower, &config.context_detection.markers.sanskrit_priority_terms);
    if hits.is_empty() {
        return None;
    }

    let english_word_hits = contains_any_word(text_lower, &config.context_detection.markers.english_function_words);
    let sanskrit_ratio = sanskrit_word_ratio(text, config);
    let has_verse_indicator = INVOCATION_PATTERN.is_match(text) || SCRIPTURE_COMMENTARY_PATTERN.is_match(text);
    let strong_counter_evidence = sanskrit_ratio < 0.2
        && english_word_hits.len() as u32 >= config.context_detection.thresholds.english_markers_required
        && !has_verse_indicator;

    if strong_counter_evidence {
        return None;
    }

    Some(ContextResult::Sanskrit {
        confidence: config.context_detection.thresholds.whitelist_override,
        markers: hits,
    })
}

fn specialized_content(text: &str) -> Option<ContextResult> {
    if INVOCATION_PATTERN.is_match(text) {
        return Some(ContextResult::Invocation {
            confidence: 0.85,
            markers: vec!["invocation-shape".to_string()],
            mode: ProcessingMode::Aggressive,
        });
    }
    for fragment in CORRUPTED_VERSE_FRAGMENTS.iter() {
        if fragment.is_match(text) {
            return Some(ContextResult::CorruptedSanskrit {
                confidence: 0.75,
                markers: vec!["corrupted-verse-fragment".to_string()],
            });
        }
    }
    if SCRIPTURE_COMMENTARY_PATTERN.is_match(text) {
        return Some(ContextResult::Sanskrit {
            confidence: 0.65,
            markers: vec!["scripture-commentary-shape".to_string()],
        });
    }
    None
}

fn pure_english_gate(text: &str, text_lower: &str, config: &Config) -> Option<ContextResult> {
    let mut markers = Vec::new();
    let mut score = 0.0f32;

    let ascii_ratio = {
        let total = text.chars().filter(|c| !c.is_whitespace()).count().max(1);
        let ascii = text.chars().filter(|c| c.is_ascii_alphanumeric()).count();
        ascii as f32 / total as f32
    };
    if ascii_ratio > 0.9 {
        score += 0.3;
        markers.push("pure-ascii".to_string());
    }

    let function_hits = contains_any_word(text_lower, &config.context_detection.markers.english_function_words);
    if !function_hits.is_empty() {
        score += (function_hits.len() as f32 * 0.08).min(0.3);
        markers.push(format!("english-function-words:{}", function_hits.len()));
    }

    if MODAL_PATTERN.is_match(text) {
        score += 0.1;
        markers.push("modal-verb".to_string());
    }
    if PROGRESSIVE_SUFFIX.is_match(text) {
        score += 0.1;
        markers.push("progressive-suffix".to_string());
    }
    if PAST_SUFFIX.is_match(text) {
        score += 0.1;
        markers.push("past-suffix".to_string());
    }
    if PRONOUN_MODAL_PATTERN.is_match(text) {
        score += 0.1;
        markers.push("pronoun-modal".to_string());
    }

    if score > config.context_detection.thresholds.english_confidence {
        Some(ContextResult::English {
            confidence: score.min(1.0),
            markers,
        })
    } else {
        None
    }
}

fn pure_sanskrit_gate(text: &str, config: &Config) -> Option<ContextResult> {
    let mut markers = Vec::new();
    let mut score = 0.0f32;

    let density = diacritical_density(text, &config.context_detection.markers.sanskrit_diacriticals);
    if density >= config.context_detection.thresholds.diacritical_density_high {
        score += 0.4;
        markers.push("high-diacritical-density".to_string());
    } else if density >= config.context_detection.thresholds.diacritical_density_medium {
        score += 0.2;
        markers.push("medium-diacritical-density".to_string());
    }

    let text_lower = text.to_lowercase();
    let sacred_hits = contains_any_word(&text_lower, &config.context_detection.markers.sanskrit_sacred_terms);
    if !sacred_hits.is_empty() {
        score += 0.25;
        markers.push(format!("sacred-terms:{}", sacred_hits.len()));
    }

    if SANSKRIT_INFLECTION_SUFFIX.is_match(text) {
        score += 0.2;
        markers.push("inflectional-suffix".to_string());
    }

    if score > config.context_detection.thresholds.sanskrit_confidence {
        Some(ContextResult::Sanskrit {
            confidence: score.min(1.0),
            markers,
        })
    } else {
        None
    }
}

fn single_word_shortcut(text: &str, config: &Config) -> Option<ContextResult> {
    let tokens = word_tokens(text);
    if tokens.len() != 1 {
        return None;
    }
    let word = &tokens[0];
    let word_lower = word.to_lowercase();
    let is_sacred = config
        .context_detection
        .markers
        .sanskrit_sacred_terms
        .iter()
        .any(|t| t.eq_ignore_ascii_case(&word_lower));
    let is_priority = config
        .context_detection
        .markers
        .sanskrit_priority_terms
        .iter()
        .any(|t| t.eq_ignore_ascii_case(&word_lower));
    let has_diacritical = diacritical_density(word, &config.context_detection.markers.sanskrit_diacriticals) > 0.0;

    if is_sacred || is_priority || has_diacritical {
        Some(ContextResult::Sanskrit {
            confidence: 0.65,
            markers: vec!["single-word-shortcut".to_string()],
        })
    } else {
        None
    }
}

fn sanskrit_word_ratio(text: &str, config: &Config) -> f32 {
    let tokens = word_tokens(text);
    if tokens.is_empty() {
        return 0.0;
    }
    let sanskrit_like = tokens.iter().filter(|w| tag_word(w, config) == WordTag::Sanskrit).count();
    sanskrit_like as f32 / tokens.len() as f32
}

fn tag_word(word: &str, config: &Config) -> WordTag {
    let lower = word.to_lowercase();
    if config
        .context_detection
        .markers
        .english_function_words
        .iter()
        .any(|w| w.eq_ignore_ascii_case(&lower))
    {
        return WordTag::English;
    }
    let has_diacritical = diacritical_density(word, &config.context_detection.markers.sanskrit_diacriticals) > 0.0;
    let is_sacred_or_priority = config
        .context_detection
        .markers
        .sanskrit_sacred_terms
        .iter()
        .chain(config.context_detection.markers.sanskrit_priority_terms.iter())
        .any(|w| w.eq_ignore_ascii_case(&lower));
    if has_diacritical || is_sacred_or_priority {
        WordTag::Sanskrit
    } else if lower.chars().all(|c| c.is_ascii_alphanumeric() || !c.is_alphabetic()) {
        WordTag::Neutral
    } else {
        WordTag::Sanskrit
    }
}

fn mixed_content_analysis(text: &str, config: &Config) -> ContextResult {
    let tokens = word_tokens(text);
    let tags: Vec<WordTag> = tokens.iter().map(|w| tag_word(w, config)).collect();

    let mut spans = Vec::new();
    let mut i = 0;
    while i < tags.len() {
        if tags[i] == WordTag::Sanskrit {
            let start = i;
            while i < tags.len() && tags[i] == WordTag::Sanskrit {
                i += 1;
            }
            spans.push(Span { start_token: start, end_token: i - 1, tag: WordTag::Sanskrit });
        } else {
            i += 1;
        }
    }

    let sanskrit_count = tags.iter().filter(|t| **t == WordTag::Sanskrit).count();
    let english_count = tags.iter().filter(|t| **t == WordTag::English).count();
    let total = tags.len().max(1) as f32;
    let sanskrit_ratio = sanskrit_count as f32 / total;
    let english_ratio = english_count as f32 / total;

    let markers = vec![format!("sanskrit-ratio:{sanskrit_ratio:.2}"), format!("english-ratio:{english_ratio:.2}")];

    if sanskrit_ratio > 0.15 && english_ratio > 0.15 {
        ContextResult::Mixed {
            confidence: (sanskrit_ratio + english_ratio).min(1.0) / 2.0 + 0.3,
            markers,
            spans,
        }
    } else if sanskrit_ratio >= english_ratio {
        ContextResult::Sanskrit {
            confidence: config.context_detection.thresholds.mixed_content.max(sanskrit_ratio),
            markers,
        }
    } else {
        ContextResult::English {
            confidence: config.context_detection.thresholds.mixed_content.max(english_ratio),
            markers,
        }
    }
}

/// Classifies `text`, consulting and populating `cache` keyed by a
/// non-cryptographic hash of the text (matching the Python source's
/// `hash(text)` memo-key strategy).
pub fn classify(text: &str, config: &Config, cache: &mut ContextCache) -> ContextResult {
    let key = hash_text(text);
    if let Some(hit) = cache.get(&key) {
        return hit.clone();
    }

    let text_lower = text.to_lowercase();
    let result = whitelist_override(text, &text_lower, config)
        .or_else(|| specialized_content(text))
        .or_else(|| pure_english_gate(text, &text_lower, config))
        .or_else(|| pure_sanskrit_gate(text, config))
        .or_else(|| single_word_shortcut(text, config))
        .unwrap_or_else(|| mixed_content_analysis(text, config));

    cache.insert(key, result.clone());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_english_sentence_classifies_english() {
        let config = Config::default();
        let mut cache = new_cache(100, 100_000);
        let result = classify("He was treading carefully through the forest", &config, &mut cache);
        assert!(result.is_english());
    }

    #[test]
    fn whitelist_override_flips_short_utterance_to_sanskrit() {
        let config = Config::default();
        let mut cache = new_cache(100, 100_000);
        let result = classify("That's called jnana", &config, &mut cache);
        assert!(result.is_sanskrit_like());
    }

    #[test]
    fn invocation_shape_is_detected() {
        let config = Config::default();
        let mut cache = new_cache(100, 100_000);
        let result = classify("Om bhur bhuvah svah, tat savitur namah", &config, &mut cache);
        assert!(matches!(result, ContextResult::Invocation { .. }));
    }

    #[test]
    fn classification_is_memoized() {
        let config = Config::default();
        let mut cache = new_cache(100, 100_000);
        let text = "He was treading carefully through the forest";
        classify(text, &config, &mut cache);
        assert_eq!(cache.len(), 1);
        classify(text, &config, &mut cache);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn confidence_always_in_bounds() {
        let config = Config::default();
        let mut cache = new_cache(100, 100_000);
        for text in ["dharma", "the forest", "śivāya namaḥ", "a mixed dharma sentence here"] {
            let result = classify(text, &config, &mut cache);
            assert!(result.confidence() >= 0.0 && result.confidence() <= 1.0);
        }
    }
}
