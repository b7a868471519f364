//! The consolidated English blocklist.
//!
//! Part of the data model, not configuration: no lexicon entry,
//! fuzzy match, or ASR pattern may ever produce one of these words as a
//! correction, regardless of how similar the surface form looks to a
//! Sanskrit term. The source project carried two slightly different
//! blocklists (one in the hybrid lexicon loader, one in the fuzzy matcher);
//! this crate keeps a single consolidated list instead.

use lazy_static::lazy_static;
use std::collections::HashSet;

lazy_static! {
    static ref BLOCKLIST: HashSet<&'static str> = {
        let mut set = HashSet::new();
        for word in HIGH_FREQUENCY_FUNCTION_WORDS {
            set.insert(*word);
        }
        for word in SHORT_COLLISION_WORDS {
            set.insert(*word);
        }
        for word in OBSERVED_COLLISION_WORDS {
            set.insert(*word);
        }
        set
    };
}

/// High-frequency English function words.
const HIGH_FREQUENCY_FUNCTION_WORDS: &[&str] = &[
    "and", "the", "for", "are", "but", "not", "you", "all", "can", "had", "was", "one", "our",
    "out", "day", "get", "has", "him", "his", "how", "may", "new", "now", "old", "see", "two",
    "way", "who", "boy", "did", "its", "let", "put", "say", "she", "too", "use", "run", "big",
    "end", "why", "win", "yes", "yet", "cut", "cup", "fun", "gun", "hot", "job", "lot", "met",
    "net", "pen", "red", "sun", "top", "try", "will", "there", "when", "some", "what", "well",
    "read", "four", "tell", "comes", "makes", "mind", "know", "know", "where", "place", "some",
];

/// Short English words that are one edit away from a common Sanskrit term
/// and would otherwise collide with it (e.g. "mat" vs. "mata", "pad" vs.
/// "pada"). Grounded in the source project's `ENGLISH_BLOCKLIST`.
const SHORT_COLLISION_WORDS: &[&str] = &[
    "pad", "man", "car", "mat", "rat", "ram", "pan", "tan", "van", "ban", "can", "dam", "fan",
    "jam", "lag", "mad", "nag", "rag", "sag", "tag", "wag", "bag", "gag", "hag", "bat", "cat",
    "fat", "hat", "pat", "sat", "bad", "dad", "had", "lad", "sad", "tar", "war", "far", "bar",
    "jar", "lab", "cab", "tab", "dab", "gab", "nab", "pal", "gal", "sal",
];

/// Specific English words observed in production to collide with short
/// Sanskrit terms once a suffix or fuzzy match is applied (e.g. "again" was
/// being fuzzy-corrected to "advaita").
const OBSERVED_COLLISION_WORDS: &[&str] = &[
    "again",
    "treading",
    "reading",
    "leading",
    "heading",
    "spreading",
    "breeding",
    "agitated",
    "meditated",
    "dedicated",
    "activated",
    "created",
    "related",
    "seated",
    "treated",
    "heated",
    "repeated",
    "completed",
    "defeated",
    "worship",
    "business",
    "success",
    "given",
    "extension",
    "whole",
    "neither",
    "respect",
    "courteous",
    "gesture",
    "realized",
    "surrender",
    "looking",
    "thinking",
    "feeling",
    "asking",
    "explained",
    "carrying",
    "powerful",
    "mystical",
    "meanings",
    "concluding",
    "stage",
    "grief",
    "trees",
    "plants",
    "different",
    "sympathy",
    "surprised",
    "supposed",
    "incarnation",
    "questioned",
    "grieving",
    "family",
    "loss",
    "little",
    "insane",
    "extent",
    "leaves",
    "exaggerating",
    "subtle",
    "meaning",
    "behind",
    "tells",
    "experience",
    "pretended",
    "herself",
    "message",
    "conquered",
    "backed",
    "certain",
    "authenticated",
    "fear",
    "bigger",
    "easily",
    "guru",
    "devotees",
    "delay",
    "forest",
    "carefully",
    "through",
    "together",
    "session",
    "meditation",
];

/// English derivational suffixes that, when attached to a plausible English
/// stem, mark a token as English even if an unsuffixed variant would match a
/// Sanskrit lexicon entry. Order matters: longer suffixes are checked first
/// so `"-tion"` is not shadowed by `"-ion"`-style partial matches.
const ENGLISH_SUFFIXES: &[&str] = &["tion", "sion", "ing", "est", "ly", "ed", "er"];

/// Returns whether `word` (any casing) is on the consolidated blocklist.
pub fn is_blocklisted(word: &str) -> bool {
    BLOCKLIST.contains(word.to_lowercase().as_str())
}

/// Returns whether `word` looks like an English word formed by attaching a
/// common derivational suffix to an English stem. This is a coarse
/// heuristic, not a morphological analyzer: it only guards against the
/// specific class of ASR-pattern/fuzzy-match false positives the source
/// project observed (`"looking"`, `"powerful"`, `"meanings"`, etc.).
pub fn has_english_suffix(word: &str) -> bool {
    let lower = word.to_lowercase();
    // Short words are exempt: "ram" ends in no listed suffix, but a 3-4
    // letter word ending in "er"/"ly" (e.g. "per", "sly") is too ambiguous
    // to gate on suffix shape alone; the fixed collision lists above cover
    // those cases instead.
    if lower.chars().count() < 5 {
        return false;
    }
    ENGLISH_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// The hard precondition fuzzy matching and ASR pattern rewriting must
/// check before proposing *any* correction: blocklisted word, or an
/// English-suffixed form.
pub fn is_protected(word: &str) -> bool {
    is_blocklisted(word) || has_english_suffix(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocklist_is_case_insensitive() {
        assert!(is_blocklisted("Again"));
        assert!(is_blocklisted("AGAIN"));
        assert!(is_blocklisted("again"));
    }

    #[test]
    fn blocklist_rejects_unrelated_words() {
        assert!(!is_blocklisted("dharma"));
        assert!(!is_blocklisted("kṛṣṇa"));
    }

    #[test]
    fn suffix_guard_flags_ing_forms() {
        assert!(has_english_suffix("looking"));
        assert!(has_english_suffix("powerful".to_string() + "ly"));
    }

    #[test]
    fn suffix_guard_does_not_flag_short_words() {
        assert!(!has_english_suffix("per"));
        assert!(!has_english_suffix("sly"));
    }

    #[test]
    fn suffix_guard_does_not_flag_sanskrit_terms() {
        assert!(!has_english_suffix("vāsiṣṭha"));
        assert!(!has_english_suffix("upaniṣad"));
    }
}
