//! Bounded, phonetic-weighted edit distance.
//!
//! Candidate selection is the caller's responsibility (`driver.rs`); this
//! module only scores a token against a supplied candidate set and
//! memoizes the result.

use crate::cache::BoundedCache;
use samskara_lexicon::blocklist::is_protected;

#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    pub text: String,
    pub confidence: f32,
    pub distance: f32,
    pub phonetic: bool,
}

pub type FuzzyCache = BoundedCache<(String, String), Option<MatchResult>>;

pub fn new_cache(max_entries: usize, max_bytes: usize) -> FuzzyCache {
    BoundedCache::new(max_entries, max_bytes, |(a, b), _| a.len() + b.len() + 64)
}

/// Sanskrit-aware phonetic equivalence classes. Membership in
/// the same class costs a small substitution penalty instead of the full
/// mismatch cost.
const PHONETIC_CLASSES: &[&[char]] = &[
    &['s', 'ś', 'ṣ'],
    &['n', 'ṇ', 'ṅ', 'ñ'],
    &['t', 'ṭ'],
    &['a', 'ā'],
    &['v', 'w'],
];

fn phonetic_class_of(c: char) -> Option<usize> {
    PHONETIC_CLASSES.iter().position(|class| class.contains(&c))
}

fn same_phonetic_class(a: char, b: char) -> bool {
    match (phonetic_class_of(a), phonetic_class_of(b)) {
        (Some(ca), Some(cb)) => ca == cb,
        _ => false,
    }
}

/// First letters to also try as candidate buckets when the token begins
/// with a letter that commonly stands in for a diacritical consonant in
/// ASR output: candidates are selected by first letter, with phonetic
/// fallbacks.
pub fn phonetic_first_letter_fallbacks(c: char) -> Vec<char> {
    match c {
        's' => vec!['ś', 'ṣ'],
        'n' => vec!['ṇ', 'ṅ', 'ñ'],
        't' => vec!['ṭ'],
        'a' => vec!['ā'],
        'v' => vec!['w'],
        _ => Vec::new(),
    }
}

fn substitution_cost(a: char, b: char) -> f32 {
    if a == b {
        0.0
    } else if same_phonetic_class(a, b) {
        0.2
    } else {
        1.0
    }
}

/// Banded single-row DP: computes the weighted edit distance between
/// `source` and `target`, aborting early if the running minimum in the
/// current row already exceeds `max_distance`. Returns `None` if the
/// distance provably exceeds `max_distance`.
fn banded_distance(source: &[char], target: &[char], max_distance: usize) -> Option<f32> {
    if source.len().abs_diff(target.len()) > max_distance {
        return None;
    }
    let width = target.len();
    let mut previous_row: Vec<f32> = (0..=width).map(|j| j as f32).collect();
    let mut current_row = vec![0.0f32; width + 1];

    for (i, &sc) in source.iter().enumerate() {
        current_row[0] = (i + 1) as f32;
        let lower = (i + 1).saturating_sub(max_distance);
        let upper = (i + 1 + max_distance).min(width);
        let mut row_min = current_row[0];

        for j in 1..=width {
            if j < lower || j > upper {
                current_row[j] = max_distance as f32 + 1.0;
                continue;
            }
            let tc = target[j - 1];
            let sub_cost = substitution_cost(sc, tc);
            let deletion = previous_row[j] + 1.0;
            let insertion = current_row[j - 1] + 1.0;
            let substitution = previous_row[j - 1] + sub_cost;
            current_row[j] = deletion.min(insertion).min(substitution);
            row_min = row_min.min(current_row[j]);
        }

        if row_min > max_distance as f32 {
            return None;
        }
        std::mem::swap(&mut previous_row, &mut current_row);
    }

    let distance = previous_row[width];
    if distance > max_distance as f32 {
        None
    } else {
        Some(distance)
    }
}

fn confidence_from_distance(token: &str, candidate: &str, distance: f32, phonetic: bool) -> f32 {
    let max_len = token.chars().count().max(candidate.chars().count()).max(1) as f32;
    let mut confidence = 1.0 - distance / max_len;

    let token_lower = token.to_lowercase();
    let candidate_lower = candidate.to_lowercase();
    if !token_lower.is_empty() && !candidate_lower.is_empty() {
        let t: Vec<char> = token_lower.chars().collect();
        let c: Vec<char> = candidate_lower.chars().collect();
        if t.first() == c.first() {
            confidence += 0.05;
        }
        if t.last() == c.last() {
            confidence += 0.05;
        }
        let t_set: std::collections::HashSet<char> = t.iter().copied().collect();
        let c_set: std::collections::HashSet<char> = c.iter().copied().collect();
        let overlap = t_set.intersection(&c_set).count() as f32;
        let union = t_set.union(&c_set).count().max(1) as f32;
        confidence += 0.1 * (overlap / union);
    }

    if phonetic {
        confidence -= 0.05;
    }

    confidence.clamp(0.0, 1.0)
}

/// Scores `token` against every candidate, returning the best match above
/// `min_confidence`, or `None` if the token is protected or nothing
/// qualifies. Memoizes per `(token, candidate)` pair.
pub fn best_match(
    token: &str,
    candidates: &[&str],
    max_distance: usize,
    min_confidence: f32,
    cache: &mut FuzzyCache,
) -> Option<MatchResult> {
    let lowered = token.to_lowercase();
    if is_protected(&lowered) {
        return None;
    }

    let source: Vec<char> = lowered.chars().collect();
    let mut best: Option<MatchResult> = None;

    for candidate in candidates {
        let candidate_lower = candidate.to_lowercase();
        if is_protected(&candidate_lower) {
            continue;
        }
        let cache_key = (lowered.clone(), candidate_lower.clone());
        let scored = if let Some(hit) = cache.get(&cache_key) {
            hit.clone()
        } else {
            let target: Vec<char> = candidate_lower.chars().collect();
            let scored = banded_distance(&source, &target, max_distance).map(|distance| {
                let phonetic = distance > 0.0 && distance.fract() != 0.0;
                let confidence = confidence_from_distance(&lowered, &candidate_lower, distance, phonetic);
                MatchResult {
                    text: (*candidate).to_string(),
                    confidence,
                    distance,
                    phonetic,
                }
            });
            cache.insert(cache_key, scored.clone());
            scored
        };

        if let Some(result) = scored {
            if result.confidence >= min_confidence
                && best.as_ref().map_or(true, |b| result.confidence > b.confidence)
            {
                best = Some(result);
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_has_zero_distance_and_max_confidence() {
        let mut cache = new_cache(100, 100_000);
        let result = best_match("dharma", &["dharma"], 3, 0.5, &mut cache).unwrap();
        assert_eq!(result.distance, 0.0);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn phonetic_substitution_costs_less_than_mismatch() {
        assert!(substitution_cost('s', 'ś') < substitution_cost('s', 'k'));
    }

    #[test]
    fn candidates_beyond_max_distance_are_skipped() {
        let source: Vec<char> = "a".chars().collect();
        let target: Vec<char> = "abcdefgh".chars().collect();
        assert!(banded_distance(&source, &target, 2).is_none());
    }

    #[test]
    fn blocklisted_token_never_matched() {
        let mut cache = new_cache(100, 100_000);
        assert!(best_match("again", &["advaita"], 3, 0.1, &mut cache).is_none());
    }

    #[test]
    fn fuzzy_result_never_exceeds_max_distance() {
        let mut cache = new_cache(100, 100_000);
        let result = best_match("krishnaa", &["krishna"], 1, 0.1, &mut cache).unwrap();
        assert!(result.distance <= 1.0);
    }
}
