//! Capitalization preserver. Pure string transformation; no state, no I/O.

use samskara_lexicon::EntryFlags;

/// Adjusts `correction`'s capitalization to match `original`'s pattern.
/// Only whitespace word boundaries are considered; diacritics count as
/// ordinary letters for case purposes.
pub fn preserve_capitalization(original: &str, correction: &str, flags: EntryFlags) -> String {
    if flags.preserve_capitalization() {
        return correction.to_string();
    }
    if is_all_upper(original) {
        return correction.to_uppercase();
    }
    if is_title_case(original) {
        return title_case(correction);
    }
    correction.to_string()
}

fn is_all_upper(word: &str) -> bool {
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

fn is_title_case(word: &str) -> bool {
    word.split_whitespace().all(|piece| {
        let mut chars = piece.chars().filter(|c| c.is_alphabetic());
        match chars.next() {
            Some(first) => first.is_uppercase(),
            None => true,
        }
    }) && word.chars().any(|c| c.is_alphabetic())
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|piece| {
            let mut chars = piece.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserve_flag_wins_regardless_of_original_case() {
        let mut flags = EntryFlags::new();
        flags.set_preserve_capitalization(true);
        assert_eq!(preserve_capitalization("KRISHNA", "Kṛṣṇa", flags), "Kṛṣṇa");
    }

    #[test]
    fn all_upper_original_upper_cases_correction() {
        let flags = EntryFlags::new();
        assert_eq!(preserve_capitalization("KRISHNA", "kṛṣṇa", flags), "KṚṢṆA");
    }

    #[test]
    fn title_case_original_title_cases_each_word() {
        let flags = EntryFlags::new();
        assert_eq!(preserve_capitalization("Yoga Vasistha", "yoga vāsiṣṭha", flags), "Yoga Vāsiṣṭha");
    }

    #[test]
    fn lower_case_original_leaves_correction_unchanged() {
        let flags = EntryFlags::new();
        assert_eq!(preserve_capitalization("krishna", "kṛṣṇa", flags), "kṛṣṇa");
    }

    #[test]
    fn single_letter_upper_is_not_treated_as_all_upper() {
        let flags = EntryFlags::new();
        assert_eq!(preserve_capitalization("I", "yaha", flags), "yaha");
    }
}
