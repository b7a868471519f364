//! The correction driver. Orchestrates every other component into a single
//! deterministic per-segment transform, and exposes the pure `process_file`
//! entry point for whole-file processing.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{debug, info, warn};
use samskara_lexicon::Store;

use crate::asr_patterns;
use crate::capitalize;
use crate::config::Config;
use crate::context::{self, ContextCache, ContextResult, ProcessingMode};
use crate::error::{InputError, SamskaraResult};
use crate::fuzzy::{self, FuzzyCache};
use crate::lid::{Language, LidMetadata, LidRecord};
use crate::metrics::Reporter;
use crate::phrase;
use crate::script;
use crate::segment::{CorrectionRecord, MatchType, Segment};
use crate::subtitle;

/// Per-file inputs that vary from run to run. `Config` lives on the
/// [`CorrectionDriver`] itself; `Options` carries the inputs that vary
/// per-file rather than per-process.
#[derive(Default)]
pub struct Options {
    pub lid: LidMetadata,
}

#[derive(Debug, Default)]
pub struct ProcessingResult {
    pub segments_processed: usize,
    pub corrections: Vec<CorrectionRecord>,
    pub warnings: Vec<String>,
    pub cancelled: bool,
}

struct Proposal {
    text: String,
    confidence: f32,
    match_type: MatchType,
}

/// Aggressive mode (high-confidence Sanskrit LID) relaxes the mantra
/// fingerprint bar for a second phrase-matching pass over text the first,
/// default-threshold pass left untouched.
const AGGRESSIVE_MANTRA_THRESHOLD: f32 = 0.5;

/// Aggressive mode also relaxes the context classifier's English gate by
/// this much, so a segment LID already flagged as Sanskrit is less likely
/// to get bounced back out as English before token-level correction runs.
const AGGRESSIVE_ENGLISH_THRESHOLD_DISCOUNT: f32 = 0.3;

/// The shape every per-token matcher shares, so new match phases can be
/// added without touching the dispatch loop in [`CorrectionDriver`].
trait WordMatcher {
    fn propose(&mut self, token: &str, ctx: &TokenContext) -> Option<Proposal>;
    fn phase(&self) -> &'static str;
}

struct TokenContext<'a> {
    store: &'a Store,
    config: &'a Config,
    context: &'a ContextResult,
    confidence_floor_override: Option<f32>,
}

struct LexiconMatcher;

impl WordMatcher for LexiconMatcher {
    fn propose(&mut self, token: &str, ctx: &TokenContext) -> Option<Proposal> {
        let lowered = token.to_lowercase();
        let entry = if ctx.context.is_english() {
            let proper_noun = ctx.store.proper_nouns_view().lookup(&lowered);
            if proper_noun.is_some() {
                proper_noun
            } else if ctx.config.processing.english_context_processing.enable_lexicon_corrections {
                ctx.store.corrections_view().lookup(&lowered)
            } else {
                None
            }
        } else {
            ctx.store.corrections_view().lookup(&lowered)
        }?;

        let mut confidence = entry.confidence;
        if ctx.context.is_english() {
            let bump = ctx.config.processing.english_context_processing.threshold_increase;
            let cap = ctx.config.processing.english_context_processing.max_threshold;
            confidence = (confidence + bump).min(cap);
        }
        if let Some(floor) = ctx.confidence_floor_override {
            if confidence < floor {
                return None;
            }
        }

        let match_type = if entry.category.is_proper_noun() {
            MatchType::ProperNoun
        } else if lowered == entry.canonical.to_lowercase() {
            MatchType::Exact
        } else {
            MatchType::CaseInsensitive
        };

        Some(Proposal {
            text: entry.canonical.clone(),
            confidence,
            match_type,
        })
    }

    fn phase(&self) -> &'static str {
        "lexicon"
    }
}

struct PatternMatcher;

impl WordMatcher for PatternMatcher {
    fn propose(&mut self, token: &str, _ctx: &TokenContext) -> Option<Proposal> {
        let proposal = asr_patterns::propose_token(token)?;
        Some(Proposal {
            text: proposal.text,
            confidence: proposal.confidence,
            match_type: MatchType::Pattern,
        })
    }

    fn phase(&self) -> &'static str {
        "pattern"
    }
}

struct FuzzyWordMatcher {
    cache: FuzzyCache,
    max_edit_distance: usize,
    min_confidence: f32,
}

impl WordMatcher for FuzzyWordMatcher {
    fn propose(&mut self, token: &str, ctx: &TokenContext) -> Option<Proposal> {
        if token.chars().count() <= 3 {
            return None;
        }
        let first = token.to_lowercase().chars().next()?;
        let mut letters = vec![first];
        letters.extend(fuzzy::phonetic_first_letter_fallbacks(first));
        let candidate_entries = ctx.store.candidates_by_first_letters(&letters, 3, 50);
        let candidates: Vec<&str> = candidate_entries.iter().map(|(key, _)| *key).collect();

        let min_confidence = ctx.confidence_floor_override.unwrap_or(self.min_confidence);
        let result = fuzzy::best_match(token, &candidates, self.max_edit_distance, min_confidence, &mut self.cache)?;
        Some(Proposal {
            text: result.text,
            confidence: result.confidence,
            match_type: if result.phonetic { MatchType::Phonetic } else { MatchType::Fuzzy },
        })
    }

    fn phase(&self) -> &'static str {
        "fuzzy"
    }
}

struct Token {
    prefix: String,
    core: String,
    suffix: String,
}

fn split_token(raw: &str) -> Token {
    let chars: Vec<char> = raw.chars().collect();
    let mut start = 0;
    while start < chars.len() && !chars[start].is_alphanumeric() {
        start += 1;
    }
    let mut end = chars.len();
    while end > start && !chars[end - 1].is_alphanumeric() {
        end -= 1;
    }
    let mut core_end = end;
    if end >= start + 2 {
        let apostrophe = chars[end - 2];
        let letter = chars[end - 1];
        if (apostrophe == '\'' || apostrophe == '\u{2019}') && (letter == 's' || letter == 'S') {
            core_end = end - 2;
        }
    }
    Token {
        prefix: chars[..start].iter().collect(),
        core: chars[start..core_end].iter().collect(),
        suffix: chars[core_end..].iter().collect(),
    }
}

/// The per-segment correction pipeline: normalize, attempt a phrase match,
/// apply any LID override, classify context, correct token by token, clean
/// up, and post-process.
pub struct CorrectionDriver {
    store: Store,
    config: Config,
    context_cache: ContextCache,
    matchers: Vec<Box<dyn WordMatcher>>,
}

impl CorrectionDriver {
    pub fn new(store: Store, config: Config) -> CorrectionDriver {
        let fuzzy_cache = fuzzy::new_cache(
            config.caching.max_corrections,
            config.caching.max_memory_mb * 1024 * 1024 / 2,
        );
        let context_cache = context::new_cache(
            config.caching.max_proper_nouns,
            config.caching.max_memory_mb * 1024 * 1024 / 2,
        );
        let matchers: Vec<Box<dyn WordMatcher>> = vec![
            Box::new(LexiconMatcher),
            Box::new(PatternMatcher),
            Box::new(FuzzyWordMatcher {
                cache: fuzzy_cache,
                max_edit_distance: config.processing.fuzzy_matching.max_edit_distance,
                min_confidence: config.processing.fuzzy_matching.min_confidence,
            }),
        ];
        CorrectionDriver {
            store,
            config,
            context_cache,
            matchers,
        }
    }

    pub fn process_segment(&mut self, segment: &Segment, lid: Option<&LidRecord>) -> (Segment, Vec<CorrectionRecord>) {
        let mut records = Vec::new();
        let start = Instant::now();

        // Step 1: normalize.
        let script_normalized = script::normalize(&segment.text);

        // Step 1b: segment-wide compound/English-sanitization patterns,
        // applied once before tokenization since they need word-boundary
        // context spanning more than one token.
        let (normalized, fired_patterns) = asr_patterns::apply_segment_patterns(&script_normalized);
        for (pattern, confidence, _group) in &fired_patterns {
            records.push(CorrectionRecord::new(
                segment.id,
                "pattern",
                &script_normalized,
                &normalized,
                MatchType::Pattern,
                *confidence,
                start.elapsed(),
            ));
            debug!("segment {} matched segment-wide pattern {}", segment.id, pattern);
        }

        // Step 2: phrase/mantra attempt.
        let phrase_match = if self.config.processing.enable_phrase_matcher {
            phrase::match_phrase(&normalized, &self.store)
        } else {
            phrase::PhraseMatch {
                text: normalized.clone(),
                replaced: false,
                reference: None,
            }
        };
        if phrase_match.replaced {
            records.push(CorrectionRecord::new(
                segment.id,
                "phrase",
                &normalized,
                &phrase_match.text,
                MatchType::Phrase,
                0.95,
                start.elapsed(),
            ));
            // A mantra match (`reference` set) replaces the entire segment
            // verbatim, so no further component may touch it. A
            // compound-title match only replaces one phrase within the
            // segment; the remaining tokens still go through the normal
            // word-level pipeline (e.g. "Yoga Vasistha" phrase-matches while
            // "Utpati Prakarana" resolves through per-token lexicon lookups).
            if phrase_match.reference.is_some() {
                return (segment.with_text(phrase_match.text), records);
            }
        }
        let mut normalized = phrase_match.text;

        // Step 3: LID override.
        let mut aggressive = false;
        let mut conservative = false;
        let mut confidence_floor_override = None;
        if let Some(record) = lid {
            match (record.language, record.language_confidence) {
                (Language::En, conf) if conf > 0.3 => {
                    records.push(CorrectionRecord::new(
                        segment.id,
                        "lid",
                        &normalized,
                        &normalized,
                        MatchType::Exact,
                        conf,
                        start.elapsed(),
                    ));
                    return (segment.with_text(normalized), records);
                }
                (Language::Sa, conf) if conf > 0.3 => aggressive = true,
                (Language::Hi, conf) if conf > 0.25 => conservative = true,
                (Language::Mixed, _) => conservative = true,
                _ => {}
            }
        }
        if conservative {
            confidence_floor_override = Some(self.config.qa.thresholds.medium_confidence);
        }

        // Step 3b: aggressive mode re-runs the phrase matcher at a lower
        // mantra threshold (the default-threshold attempt in step 2 already
        // ran against this text and missed), and straightens ALL-CAPS
        // prayer text before context classification sees it.
        if aggressive {
            if self.config.processing.enable_phrase_matcher && !phrase_match.replaced {
                let retry = phrase::match_phrase_with_threshold(&normalized, &self.store, AGGRESSIVE_MANTRA_THRESHOLD);
                if retry.replaced && retry.reference.is_some() {
                    records.push(CorrectionRecord::new(
                        segment.id,
                        "phrase",
                        &normalized,
                        &retry.text,
                        MatchType::Phrase,
                        0.8,
                        start.elapsed(),
                    ));
                    return (segment.with_text(retry.text), records);
                }
            }
            if is_all_caps(&normalized) {
                normalized = titlecase_every_word(&normalized);
            }
        }

        // Step 4: context classify. Aggressive mode relaxes the English gate
        // so a segment LID already flagged as Sanskrit is less likely to be
        // reclassified as English before it reaches the token-level pass.
        let context = if aggressive {
            let mut relaxed = self.config.clone();
            relaxed.context_detection.thresholds.english_confidence =
                (relaxed.context_detection.thresholds.english_confidence - AGGRESSIVE_ENGLISH_THRESHOLD_DISCOUNT).max(0.0);
            context::classify(&normalized, &relaxed, &mut self.context_cache)
        } else {
            context::classify(&normalized, &self.config, &mut self.context_cache)
        };
        if context.is_english() && !aggressive {
            records.push(CorrectionRecord::new(
                segment.id,
                "context",
                &normalized,
                &normalized,
                MatchType::Exact,
                context.confidence(),
                start.elapsed(),
            ));
            return (segment.with_text(normalized), records);
        }

        // Step 5 & 6: tokenize and correct per token.
        let corrected_text = self.correct_lines(&normalized, segment.id, &context, confidence_floor_override, &mut records);

        // Step 7: segment-level cleanup.
        let cleaned = script::clean_whitespace_and_fillers(&corrected_text);

        // Step 8: post-process (smart capitalization for invocation-mode
        // segments only; other modes leave casing exactly as produced).
        let final_text = if matches!(context, ContextResult::Invocation { mode: ProcessingMode::Aggressive, .. }) {
            smart_capitalize_prayer(&cleaned)
        } else {
            cleaned
        };

        (segment.with_text(final_text), records)
    }

    fn correct_lines(
        &mut self,
        text: &str,
        segment_id: u32,
        context: &ContextResult,
        confidence_floor_override: Option<f32>,
        records: &mut Vec<CorrectionRecord>,
    ) -> String {
        text.lines()
            .map(|line| {
                line.split(' ')
                    .map(|word| self.correct_token(word, segment_id, context, confidence_floor_override, records))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn correct_token(
        &mut self,
        raw: &str,
        segment_id: u32,
        context: &ContextResult,
        confidence_floor_override: Option<f32>,
        records: &mut Vec<CorrectionRecord>,
    ) -> String {
        if raw.is_empty() {
            return raw.to_string();
        }
        let token = split_token(raw);
        if token.core.is_empty() {
            return raw.to_string();
        }

        let lowered = token.core.to_lowercase();
        if samskara_lexicon::blocklist::is_blocklisted(&lowered) {
            return raw.to_string();
        }

        let token_ctx = TokenContext {
            store: &self.store,
            config: &self.config,
            context,
            confidence_floor_override,
        };

        // Matchers are tried in order and the first hit wins: lexicon, then
        // ASR patterns, then fuzzy, each only attempted on the previous
        // one's miss.
        let mut best: Option<Proposal> = None;
        for matcher in self.matchers.iter_mut() {
            let start = Instant::now();
            if let Some(proposal) = matcher.propose(&token.core, &token_ctx) {
                records.push(CorrectionRecord::new(
                    segment_id,
                    matcher.phase(),
                    &token.core,
                    &proposal.text,
                    proposal.match_type,
                    proposal.confidence,
                    start.elapsed(),
                ));
                best = Some(proposal);
                break;
            }
        }

        match best {
            Some(proposal) => {
                let flags = self
                    .store
                    .lookup(&lowered)
                    .map(|e| e.flags)
                    .unwrap_or_default();
                let cased = capitalize::preserve_capitalization(&token.core, &proposal.text, flags);
                format!("{}{}{}", token.prefix, cased, token.suffix)
            }
            None => raw.to_string(),
        }
    }
}

/// Whether `text` contains at least one letter and no lowercase ones —
/// the shape ASR transcripts of chanted invocations tend to come out in.
fn is_all_caps(text: &str) -> bool {
    let mut has_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            has_letter = true;
            if c.is_lowercase() {
                return false;
            }
        }
    }
    has_letter
}

/// Title-cases every space-separated word, not just the first (contrast
/// [`smart_capitalize_prayer`], which only fixes the leading word).
fn titlecase_every_word(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn smart_capitalize_prayer(text: &str) -> String {
    text.split_whitespace()
        .enumerate()
        .map(|(i, w)| {
            if i == 0 {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            } else {
                w.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts a human-readable message from a caught panic payload, falling
/// back to a fixed string for payloads that are neither `&str` nor `String`
/// (the two types `panic!`/`.unwrap()`/`.expect()` actually produce).
fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "segment processing panicked with a non-string payload".to_string()
    }
}

/// Processes one subtitle file end to end, writing the corrected SRT to
/// `output`. Checks `cancel` between segments so a long-running batch can
/// be interrupted cleanly. Every segment is isolated behind `catch_unwind`:
/// a panic in any single segment's correction is logged as an `error`
/// correction record and that segment is passed through unchanged, rather
/// than aborting the whole file.
pub fn process_file(
    input: &Path,
    output: &Path,
    mut driver: CorrectionDriver,
    options: &Options,
    cancel: &AtomicBool,
) -> SamskaraResult<ProcessingResult> {
    if !input.exists() {
        return Err(InputError::NotFound(input.to_path_buf()).into());
    }
    let raw = std::fs::read_to_string(input).map_err(|source| InputError::Unreadable {
        path: input.to_path_buf(),
        source,
    })?;

    let segments = subtitle::parse_srt(&raw);
    if segments.is_empty() {
        return Err(InputError::NoValidSegments { path: input.to_path_buf() }.into());
    }

    let mut result = ProcessingResult::default();
    let mut corrected_segments = Vec::with_capacity(segments.len());
    let mut reporter = Reporter::new();

    for segment in &segments {
        if cancel.load(Ordering::Relaxed) {
            result.cancelled = true;
            warn!("cancellation requested, flushing {} segments processed so far", result.segments_processed);
            break;
        }
        let lid = options.lid.get(segment.id);
        let (corrected, records) = match panic::catch_unwind(AssertUnwindSafe(|| driver.process_segment(segment, lid))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(&payload);
                warn!("segment {} panicked during processing, leaving it unchanged: {message}", segment.id);
                (segment.clone(), vec![CorrectionRecord::error(segment.id, "driver", message)])
            }
        };
        debug!("segment {} produced {} correction record(s)", segment.id, records.len());
        reporter.record_segment(segment, &records);
        result.corrections.extend(records);
        corrected_segments.push(corrected);
        result.segments_processed += 1;
    }

    let rendered = subtitle::render_srt(&corrected_segments);
    std::fs::write(output, rendered).map_err(|source| InputError::OutputUnwritable {
        path: output.to_path_buf(),
        source,
    })?;

    info!("processed {} segment(s) from {}", result.segments_processed, input.display());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn driver_with_empty_store() -> CorrectionDriver {
        let (store, _report) = Store::load(None, &[]);
        CorrectionDriver::new(store, Config::default())
    }

    #[test]
    fn english_bypass_leaves_text_unchanged() {
        let mut driver = driver_with_empty_store();
        let segment = Segment::new(1, 0, 1000, "He was treading carefully through the forest");
        let (corrected, _records) = driver.process_segment(&segment, None);
        assert_eq!(corrected.text, "He was treading carefully through the forest");
    }

    #[test]
    fn blocklisted_again_is_never_corrected() {
        let mut driver = driver_with_empty_store();
        let segment = Segment::new(2, 0, 1000, "Just again to reiterate, seven steps.");
        let (corrected, _records) = driver.process_segment(&segment, None);
        assert_eq!(corrected.text, "Just again to reiterate, seven steps.");
    }

    #[test]
    fn split_token_separates_possessive_suffix() {
        let token = split_token("Krishna's");
        assert_eq!(token.core, "Krishna");
        assert_eq!(token.suffix, "'s");
    }

    #[test]
    fn split_token_separates_leading_and_trailing_punctuation() {
        let token = split_token("\"dharma,\"");
        assert_eq!(token.prefix, "\"");
        assert_eq!(token.core, "dharma");
        assert_eq!(token.suffix, ",\"");
    }

    #[test]
    fn segment_order_never_changes() {
        let mut driver = driver_with_empty_store();
        let segment = Segment::new(7, 500, 1500, "unchanged text here");
        let (corrected, _) = driver.process_segment(&segment, None);
        assert_eq!(corrected.id, 7);
        assert_eq!(corrected.start_ms, 500);
        assert_eq!(corrected.end_ms, 1500);
    }

    #[test]
    fn all_caps_detection_ignores_non_letters_and_requires_no_lowercase() {
        assert!(is_all_caps("OM NAMAH SHIVAYA"));
        assert!(is_all_caps("AUM, NAMAH!"));
        assert!(!is_all_caps("Om Namah Shivaya"));
        assert!(!is_all_caps("123, ..."));
    }

    #[test]
    fn titlecase_every_word_fixes_every_word_not_just_the_first() {
        assert_eq!(titlecase_every_word("OM NAMAH SHIVAYA"), "Om Namah Shivaya");
        assert_eq!(titlecase_every_word("KRISHNA TAUGHT ARJUNA"), "Krishna Taught Arjuna");
    }

    /// Lowercasing `İ` (U+0130) grows it from 2 bytes to 3 (`i̇`), so a byte
    /// offset the compound matcher finds in the lowercased haystack can land
    /// past the end of the original-case string once enough of them precede
    /// a compound title. That drives `process_segment` into a genuine panic;
    /// `process_file` must catch it at the segment boundary, record it as an
    /// `error` correction, and keep the segment's text unchanged rather than
    /// aborting the rest of the batch.
    #[test]
    fn panicking_segment_is_isolated_and_left_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let lexicon_path = dir.path().join("lexicon.csv");
        let mut f = std::fs::File::create(&lexicon_path).unwrap();
        writeln!(
            f,
            "original_term,variations,transliteration,category,confidence,context_clues,is_compound,asr_common_error,error_type,frequency_rating,source_authority,difficulty_level"
        )
        .unwrap();
        writeln!(f, "Yoga Vasistha,,Yoga Vāsiṣṭha,scripture,0.95,,true,false,,high,,intermediate").unwrap();
        drop(f);
        let (store, _report) = Store::load(Some(&lexicon_path), &[]);
        let driver = CorrectionDriver::new(store, Config::default());

        let poisoned_text = format!("{} Yoga Vasistha", "İ".repeat(50));
        let input_path = dir.path().join("input.srt");
        std::fs::write(&input_path, format!("1\n00:00:01,000 --> 00:00:04,000\n{poisoned_text}\n")).unwrap();
        let output_path = dir.path().join("output.srt");

        let cancel = AtomicBool::new(false);
        let result = process_file(&input_path, &output_path, driver, &Options::default(), &cancel).unwrap();

        assert_eq!(result.segments_processed, 1);
        assert!(!result.cancelled);
        assert!(result
            .corrections
            .iter()
            .any(|r| r.match_type == MatchType::Error && r.phase == "driver"));

        let rendered = std::fs::read_to_string(&output_path).unwrap();
        assert!(
            rendered.contains(&poisoned_text),
            "segment that panicked mid-processing should render unchanged, got {rendered:?}"
        );
    }
}
