//! Devanagari→IAST transliteration plus whitespace/filler cleanup. Runs
//! first in the driver pipeline so everything downstream only ever sees
//! romanized text.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

const DEVANAGARI_START: u32 = 0x0900;
const DEVANAGARI_END: u32 = 0x097F;

lazy_static! {
    static ref INDEPENDENT_VOWELS: HashMap<char, &'static str> = {
        let mut m = HashMap::new();
        m.insert('अ', "a");
        m.insert('आ', "ā");
        m.insert('इ', "i");
        m.insert('ई', "ī");
        m.insert('उ', "u");
        m.insert('ऊ', "ū");
        m.insert('ऋ', "ṛ");
        m.insert('ॠ', "ṝ");
        m.insert('ऌ', "ḷ");
        m.insert('ॡ', "ḹ");
        m.insert('ए', "e");
        m.insert('ऐ', "ai");
        m.insert('ओ', "o");
        m.insert('औ', "au");
        m
    };

    static ref CONSONANTS: HashMap<char, &'static str> = {
        let mut m = HashMap::new();
        m.insert('क', "k");
        m.insert('ख', "kh");
        m.insert('ग', "g");
        m.insert('घ', "gh");
        m.insert('ङ', "ṅ");
        m.insert('च', "c");
        m.insert('छ', "ch");
        m.insert('ज', "j");
        m.insert('झ', "jh");
        m.insert('ञ', "ñ");
        m.insert('ट', "ṭ");
        m.insert('ठ', "ṭh");
        m.insert('ड', "ḍ");
        m.insert('ढ', "ḍh");
        m.insert('ण', "ṇ");
        m.insert('त', "t");
        m.insert('थ', "th");
        m.insert('द', "d");
        m.insert('ध', "dh");
        m.insert('न', "n");
        m.insert('प', "p");
        m.insert('फ', "ph");
        m.insert('ब', "b");
        m.insert('भ', "bh");
        m.insert('म', "m");
        m.insert('य', "y");
        m.insert('र', "r");
        m.insert('ल', "l");
        m.insert('व', "v");
        m.insert('श', "ś");
        m.insert('ष', "ṣ");
        m.insert('स', "s");
        m.insert('ह', "h");
        m.insert('ळ', "ḷ");
        m
    };

    static ref MATRAS: HashMap<char, &'static str> = {
        let mut m = HashMap::new();
        m.insert('ा', "ā");
        m.insert('ि', "i");
        m.insert('ी', "ī");
        m.insert('ु', "u");
        m.insert('ू', "ū");
        m.insert('ृ', "ṛ");
        m.insert('ॄ', "ṝ");
        m.insert('ॢ', "ḷ");
        m.insert('ॣ', "ḹ");
        m.insert('े', "e");
        m.insert('ै', "ai");
        m.insert('ो', "o");
        m.insert('ौ', "au");
        m
    };

    static ref MISC: HashMap<char, &'static str> = {
        let mut m = HashMap::new();
        m.insert('ं', "ṃ");
        m.insert('ः', "ḥ");
        m.insert('ँ', "m̐");
        m.insert('ॐ', "oṃ");
        m.insert('।', ".");
        m.insert('॥', "..");
        m
    };

    static ref DIGITS: HashMap<char, char> = {
        let mut m = HashMap::new();
        for (i, d) in "०१२३४५६७८९".chars().enumerate() {
            m.insert(d, char::from_digit(i as u32, 10).unwrap());
        }
        m
    };

    static ref FILLER_WORDS: Regex =
        Regex::new(r"(?i)\b(um|uh|er|ah)\b").expect("filler-word pattern is a fixed literal");
}

const VIRAMA: char = '्';

/// True if `text` contains any codepoint in the Devanagari block.
pub fn has_devanagari(text: &str) -> bool {
    text.chars()
        .any(|c| (c as u32) >= DEVANAGARI_START && (c as u32) <= DEVANAGARI_END)
}

/// Transliterates Devanagari to IAST, passing non-Devanagari codepoints
/// through unchanged. Consonants carry an implicit "a" unless followed by
/// a vowel sign (matra) or a virama.
pub fn transliterate_devanagari(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if let Some(roman) = CONSONANTS.get(&c) {
            out.push_str(roman);
            match chars.get(i + 1) {
                Some(next) if *next == VIRAMA => {
                    i += 1;
                }
                Some(next) if MATRAS.contains_key(next) => {
                    out.push_str(MATRAS[next]);
                    i += 1;
                }
                _ => out.push('a'),
            }
        } else if let Some(roman) = INDEPENDENT_VOWELS.get(&c) {
            out.push_str(roman);
        } else if let Some(roman) = MISC.get(&c) {
            out.push_str(roman);
        } else if let Some(digit) = DIGITS.get(&c) {
            out.push(*digit);
        } else if c == VIRAMA {
            // Stray virama with no preceding consonant: drop silently.
        } else {
            out.push(c);
        }
        i += 1;
    }
    out
}

/// Collapses runs of spaces/tabs to one space (newlines preserved) and
/// removes whole-word hesitation fillers (`um, uh, er, ah`).
pub fn clean_whitespace_and_fillers(text: &str) -> String {
    let without_fillers = FILLER_WORDS.replace_all(text, "");
    without_fillers
        .lines()
        .map(collapse_spaces_tabs)
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_spaces_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut last_was_space = false;
    for c in line.chars() {
        if c == ' ' || c == '\t' {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

/// Component A's full entry point: transliterate if needed, then clean
/// up whitespace and fillers. Deterministic and idempotent.
pub fn normalize(text: &str) -> String {
    let romanized = if has_devanagari(text) {
        transliterate_devanagari(text)
    } else {
        text.to_string()
    };
    clean_whitespace_and_fillers(&romanized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_devanagari_presence() {
        assert!(has_devanagari("धर्म"));
        assert!(!has_devanagari("dharma"));
    }

    #[test]
    fn transliterates_simple_word() {
        assert_eq!(transliterate_devanagari("धर्म"), "dharma");
    }

    #[test]
    fn transliterates_with_matra() {
        assert_eq!(transliterate_devanagari("गीता"), "gītā");
    }

    #[test]
    fn collapses_internal_whitespace_preserves_newlines() {
        let text = "hello    world\nsecond   line";
        assert_eq!(clean_whitespace_and_fillers(text), "hello world\nsecond line");
    }

    #[test]
    fn removes_whole_word_fillers_only() {
        assert_eq!(clean_whitespace_and_fillers("um this is ahimsa"), "this is ahimsa");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("धर्म   um karma");
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }
}
