//! The closed, ordered rule tables for systematic ASR errors, seeded
//! directly from the rule groups documented in
//! `original_source/processors/asr_pattern_matcher.py`.
//!
//! Two entry points: [`propose_token`] applies the single-word phonetic
//! substitution groups (tried per-token in the driver's word loop, after a
//! lexicon miss and before the fuzzy matcher); [`apply_segment_patterns`]
//! applies the compound-splitting and English-sanitization rules, which
//! need word-boundary context spanning more than one token and so run once
//! over the whole segment, before tokenization.

use lazy_static::lazy_static;
use regex::Regex;

use samskara_lexicon::blocklist::is_protected;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternGroup {
    Aspirate,
    Sibilant,
    VowelLength,
    Nasal,
    Retroflex,
    Compound,
    EnglishSanitization,
}

pub struct Proposal {
    pub text: String,
    pub confidence: f32,
    pub group: PatternGroup,
}

struct SubstitutionRule {
    from: &'static str,
    to: &'static str,
    confidence: f32,
    group: PatternGroup,
}

/// Single-character-sequence substitutions, tried in this fixed order
/// against a lowercased token. Confidences reflect how reliably each
/// pattern indicates the intended Sanskrit spelling versus a coincidental
/// English substring.
const SUBSTITUTION_RULES: &[SubstitutionRule] = &[
    SubstitutionRule { from: "ph", to: "f", confidence: 0.7, group: PatternGroup::Aspirate },
    SubstitutionRule { from: "th", to: "t", confidence: 0.6, group: PatternGroup::Aspirate },
    SubstitutionRule { from: "bh", to: "b", confidence: 0.7, group: PatternGroup::Aspirate },
    SubstitutionRule { from: "dh", to: "d", confidence: 0.6, group: PatternGroup::Aspirate },
    SubstitutionRule { from: "kh", to: "k", confidence: 0.7, group: PatternGroup::Aspirate },
    SubstitutionRule { from: "gh", to: "g", confidence: 0.7, group: PatternGroup::Aspirate },
    SubstitutionRule { from: "ch", to: "c", confidence: 0.6, group: PatternGroup::Aspirate },
    SubstitutionRule { from: "jh", to: "j", confidence: 0.7, group: PatternGroup::Aspirate },
    SubstitutionRule { from: "sh", to: "ś", confidence: 0.75, group: PatternGroup::Sibilant },
    SubstitutionRule { from: "ss", to: "ś", confidence: 0.55, group: PatternGroup::Sibilant },
    SubstitutionRule { from: "aa", to: "ā", confidence: 0.8, group: PatternGroup::VowelLength },
    SubstitutionRule { from: "ii", to: "ī", confidence: 0.8, group: PatternGroup::VowelLength },
    SubstitutionRule { from: "uu", to: "ū", confidence: 0.8, group: PatternGroup::VowelLength },
    SubstitutionRule { from: "ng", to: "ṅ", confidence: 0.65, group: PatternGroup::Nasal },
    SubstitutionRule { from: "nk", to: "ṅk", confidence: 0.6, group: PatternGroup::Nasal },
    SubstitutionRule { from: "nc", to: "ñc", confidence: 0.6, group: PatternGroup::Nasal },
    SubstitutionRule { from: "nj", to: "ñj", confidence: 0.6, group: PatternGroup::Nasal },
    SubstitutionRule { from: "rn", to: "rṇ", confidence: 0.55, group: PatternGroup::Retroflex },
    SubstitutionRule { from: "rt", to: "rṭ", confidence: 0.55, group: PatternGroup::Retroflex },
    SubstitutionRule { from: "rd", to: "rḍ", confidence: 0.55, group: PatternGroup::Retroflex },
    SubstitutionRule { from: "rs", to: "rṣ", confidence: 0.55, group: PatternGroup::Retroflex },
];

struct PhraseRule {
    pattern: &'static str,
    replacement: &'static str,
    confidence: f32,
    group: PatternGroup,
}

/// Word-boundary, case-insensitive phrase rules applied once per segment.
const PHRASE_RULES: &[PhraseRule] = &[
    PhraseRule {
        pattern: r"(?i)\btanva\s+manasi\b",
        replacement: "tanumānasi",
        confidence: 0.6,
        group: PatternGroup::Compound,
    },
    PhraseRule {
        pattern: r"(?i)\bbhagavad\s+gita\b",
        replacement: "Bhagavad Gītā",
        confidence: 0.85,
        group: PatternGroup::Compound,
    },
    PhraseRule {
        pattern: r"(?i)\bthe\s+the\b",
        replacement: "the",
        confidence: 0.9,
        group: PatternGroup::EnglishSanitization,
    },
    PhraseRule {
        pattern: r"(?i)\bteh\b",
        replacement: "the",
        confidence: 0.9,
        group: PatternGroup::EnglishSanitization,
    },
];

lazy_static! {
    static ref COMPILED_PHRASE_RULES: Vec<(Regex, &'static PhraseRule)> = PHRASE_RULES
        .iter()
        .map(|rule| {
            (
                Regex::new(rule.pattern).expect("phrase pattern is a fixed literal"),
                rule,
            )
        })
        .filter(|(_, rule)| !is_protected(rule.replacement))
        .collect();
}

// Sandhi rules (a+u -> o, etc.) intentionally omitted. The source carried
// disabled regex rules for these with comments that they corrupt legitimate
// text; until each one has a regression test they stay out entirely rather
// than living as dead code here.

/// Applies the per-token phonetic substitution groups to a single
/// lowercased word. Returns the first rule whose `from` sequence occurs,
/// with the occurrence replaced throughout the word.
pub fn propose_token(token: &str) -> Option<Proposal> {
    let lowered = token.to_lowercase();
    if is_protected(&lowered) {
        return None;
    }
    for rule in SUBSTITUTION_RULES {
        if lowered.contains(rule.from) {
            let candidate = lowered.replace(rule.from, rule.to);
            if candidate == lowered || is_protected(&candidate) {
                continue;
            }
            return Some(Proposal {
                text: candidate,
                confidence: rule.confidence,
                group: rule.group,
            });
        }
    }
    None
}

/// Applies the compound-splitting and English-sanitization phrase rules
/// across the whole segment text, returning the rewritten text and the
/// rules that fired (for correction-record bookkeeping).
pub fn apply_segment_patterns(text: &str) -> (String, Vec<(&'static str, f32, PatternGroup)>) {
    let mut current = text.to_string();
    let mut fired = Vec::new();
    for (regex, rule) in COMPILED_PHRASE_RULES.iter() {
        if regex.is_match(&current) {
            current = regex.replace_all(&current, rule.replacement).into_owned();
            fired.push((rule.pattern, rule.confidence, rule.group));
        }
    }
    (current, fired)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspirate_pattern_fires() {
        let proposal = propose_token("phala").unwrap();
        assert_eq!(proposal.text, "fala");
        assert_eq!(proposal.group, PatternGroup::Aspirate);
    }

    #[test]
    fn vowel_length_pattern_fires() {
        let proposal = propose_token("gaata").unwrap();
        assert_eq!(proposal.text, "gāta");
    }

    #[test]
    fn blocklisted_token_never_proposed() {
        assert!(propose_token("again").is_none());
    }

    #[test]
    fn no_rule_matches_returns_none() {
        assert!(propose_token("krishna").is_none());
    }

    #[test]
    fn compound_phrase_rule_fires_case_insensitively() {
        let (text, fired) = apply_segment_patterns("I love Bhagavad Gita chapter two");
        assert_eq!(text, "I love Bhagavad Gītā chapter two");
        assert_eq!(fired.len(), 1);
    }

    #[test]
    fn english_doubling_is_sanitized() {
        let (text, _) = apply_segment_patterns("the the forest path");
        assert_eq!(text, "the forest path");
    }
}
