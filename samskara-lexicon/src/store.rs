//! The lexicon store: a persistent tabular store layered with a
//! small process-local overlay, exposed through two read-only *views*.
//!
//! Lookup is backed by an [`fst::Map`] from lowercased surface form to an
//! index into a flat `Vec<LexiconEntry>` — the same data structure the
//! teacher workspace's own lexicon crate (`vidyut-kosha`) is built on, for
//! the same reason: a compact, immutable, sorted map gives lookup time
//! proportional to key length rather than table size.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fst::{Map as FstMap, MapBuilder};
use log::warn;
use multimap::MultiMap;

use crate::blocklist;
use crate::entry::{Category, DifficultyLevel, EntryFlags, FrequencyRating, LexiconEntry};
use crate::error::LexiconError;
use crate::overlay::OverlayFile;

/// The schema version this build understands. A store whose sibling
/// `<path>.schema_version` file names a different version is rejected
/// so an incompatible store file is rejected rather than silently misread.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Source {
    Database,
    Overlay,
}

struct Candidate {
    entry_index: usize,
    confidence: f32,
    source: Source,
}

/// Summary of what happened while building a [`Store`]: how many rows
/// loaded cleanly, how many were skipped, how many lookup-key conflicts
/// were resolved, and whether the store degraded to overlay-only operation.
#[derive(Clone, Debug, Default)]
pub struct LoadReport {
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    pub conflicts_resolved: usize,
    pub degraded: bool,
}

/// The lexicon store: an immutable set of entries reachable by any of their
/// lookup keys, plus a process-local runtime overlay.
pub struct Store {
    entries: Vec<LexiconEntry>,
    index: FstMap<Vec<u8>>,
    /// Every winning lookup key, kept around (rather than re-derived from
    /// `entries`) so `candidates_by_first_letters` can hand back `&str`
    /// references with a lifetime tied to `self`.
    keys: Vec<String>,
    /// `keys[i]` is a lookup key for `entries[key_entries[i]]`.
    key_entries: Vec<usize>,
    by_first_letter: HashMap<char, Vec<usize>>,
    runtime_overlay: HashMap<String, LexiconEntry>,
}

impl Store {
    /// Builds a store from an optional CSV tabular store and zero or more
    /// TOML overlay files. Never fails: any problem degrades the result and
    /// is reflected in the returned [`LoadReport`].
    pub fn load(store_csv: Option<&Path>, overlay_paths: &[PathBuf]) -> (Store, LoadReport) {
        let mut report = LoadReport::default();
        let mut pool: Vec<LexiconEntry> = Vec::new();
        let mut candidates: MultiMap<String, Candidate> = MultiMap::new();

        for path in overlay_paths {
            match OverlayFile::load(path) {
                Ok(file) => {
                    for record in file.all_records().cloned() {
                        match record.into_entry() {
                            Some(entry) => {
                                let idx = pool.len();
                                for key in entry.lookup_keys() {
                                    candidates.insert(
                                        key,
                                        Candidate {
                                            entry_index: idx,
                                            confidence: entry.confidence,
                                            source: Source::Overlay,
                                        },
                                    );
                                }
                                pool.push(entry);
                                report.rows_loaded += 1;
                            }
                            None => {
                                warn!("skipping malformed overlay record in {}", path.display());
                                report.rows_skipped += 1;
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!("could not load overlay {}: {err}", path.display());
                    report.rows_skipped += 1;
                    report.degraded = true;
                }
            }
        }

        if let Some(csv_path) = store_csv {
            match load_csv_rows(csv_path, &mut pool, &mut candidates) {
                Ok(csv_report) => {
                    report.rows_loaded += csv_report.rows_loaded;
                    report.rows_skipped += csv_report.rows_skipped;
                }
                Err(err) => {
                    warn!("tabular lexicon store unavailable, falling back to overlay-only: {err}");
                    report.degraded = true;
                }
            }
        } else {
            report.degraded = true;
        }

        let (winners, conflicts) = resolve_winners(candidates);
        report.conflicts_resolved = conflicts;

        let mut sorted_keys: Vec<(String, usize)> = winners.into_iter().collect();
        sorted_keys.sort_by(|a, b| a.0.cmp(&b.0));
        sorted_keys.dedup_by(|a, b| a.0 == b.0);

        let mut builder = MapBuilder::memory();
        for (key, entry_idx) in &sorted_keys {
            // `MapBuilder::insert` requires strictly increasing keys; the
            // sort+dedup above guarantees that. The fst value stores the
            // entry index directly so `lookup` needs no second indirection.
            builder
                .insert(key.as_bytes(), *entry_idx as u64)
                .expect("keys are sorted and deduplicated above");
        }
        let index_bytes = builder.into_inner().expect("fst builder always finishes cleanly");
        let index = FstMap::new(index_bytes).expect("fst builder always produces a valid map");

        let mut keys = Vec::with_capacity(sorted_keys.len());
        let mut key_entries = Vec::with_capacity(sorted_keys.len());
        let mut by_first_letter: HashMap<char, Vec<usize>> = HashMap::new();
        for (key, entry_idx) in sorted_keys {
            let key_pos = keys.len();
            if let Some(c) = key.chars().next() {
                by_first_letter.entry(c).or_default().push(key_pos);
            }
            keys.push(key);
            key_entries.push(entry_idx);
        }

        (
            Store {
                entries: pool,
                index,
                keys,
                key_entries,
                by_first_letter,
                runtime_overlay: HashMap::new(),
            },
            report,
        )
    }

    /// `O(key length)` average-case lookup. `key` must already be lowercased.
    pub fn lookup(&self, key: &str) -> Option<&LexiconEntry> {
        let runtime = self.runtime_overlay.get(key);
        let indexed = self
            .index
            .get(key.as_bytes())
            .and_then(|i| self.entries.get(i as usize));
        match (runtime, indexed) {
            (Some(r), Some(i)) => Some(if i.confidence > r.confidence { i } else { r }),
            (Some(r), None) => Some(r),
            (None, Some(i)) => Some(i),
            (None, None) => None,
        }
    }

    /// Adds (or overwrites) a process-local entry that lives only for this
    /// `Store`'s lifetime: a small overlay of runtime additions that never
    /// touches the on-disk store.
    pub fn add_runtime_entry(&mut self, key: String, entry: LexiconEntry) {
        self.runtime_overlay.insert(key.to_lowercase(), entry);
    }

    /// Candidate surface forms beginning with any of `letters`, restricted
    /// to keys longer than `min_len` characters, capped at `cap` total
    /// results. Used by the fuzzy matcher for bounded-candidate selection.
    pub fn candidates_by_first_letters(
        &self,
        letters: &[char],
        min_len: usize,
        cap: usize,
    ) -> Vec<(&str, &LexiconEntry)> {
        let mut out = Vec::new();
        'letters: for letter in letters {
            if let Some(key_positions) = self.by_first_letter.get(letter) {
                for &key_pos in key_positions {
                    if out.len() >= cap {
                        break 'letters;
                    }
                    let key = self.keys[key_pos].as_str();
                    if key.chars().count() <= min_len {
                        continue;
                    }
                    let entry_idx = self.key_entries[key_pos];
                    if let Some(entry) = self.entries.get(entry_idx) {
                        out.push((key, entry));
                    }
                }
            }
        }
        out
    }

    pub fn corrections_view(&self) -> CorrectionsView<'_> {
        CorrectionsView { store: self }
    }

    pub fn proper_nouns_view(&self) -> ProperNounsView<'_> {
        ProperNounsView { store: self }
    }

    pub fn entries(&self) -> &[LexiconEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The "any category, confidence >= 0.7" view.
pub struct CorrectionsView<'a> {
    store: &'a Store,
}

impl<'a> CorrectionsView<'a> {
    pub fn lookup(&self, key: &str) -> Option<&'a LexiconEntry> {
        self.store.lookup(key).filter(|e| e.confidence >= 0.7)
    }
}

/// The "category in {deity, person, place}" view.
pub struct ProperNounsView<'a> {
    store: &'a Store,
}

impl<'a> ProperNounsView<'a> {
    pub fn lookup(&self, key: &str) -> Option<&'a LexiconEntry> {
        self.store.lookup(key).filter(|e| e.category.is_proper_noun())
    }
}

struct CsvLoadReport {
    rows_loaded: usize,
    rows_skipped: usize,
}

fn load_csv_rows(
    csv_path: &Path,
    pool: &mut Vec<LexiconEntry>,
    candidates: &mut MultiMap<String, Candidate>,
) -> Result<CsvLoadReport, LexiconError> {
    if let Some(found) = read_schema_version(csv_path) {
        if found != CURRENT_SCHEMA_VERSION {
            return Err(LexiconError::UnsupportedSchemaVersion {
                path: csv_path.to_path_buf(),
                found,
                expected: CURRENT_SCHEMA_VERSION,
            });
        }
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(csv_path)
        .map_err(|source| LexiconError::Csv {
            path: csv_path.to_path_buf(),
            source,
        })?;

    let mut report = CsvLoadReport {
        rows_loaded: 0,
        rows_skipped: 0,
    };

    for result in reader.deserialize::<StoreRow>() {
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                warn!("skipping malformed row in {}: {err}", csv_path.display());
                report.rows_skipped += 1;
                continue;
            }
        };
        match row.into_entry() {
            Some(entry) => {
                if blocklist::is_blocklisted(&entry.canonical) {
                    warn!(
                        "rejecting lexicon entry whose canonical form '{}' is on the English blocklist",
                        entry.canonical
                    );
                    report.rows_skipped += 1;
                    continue;
                }
                let idx = pool.len();
                for key in entry.lookup_keys() {
                    candidates.insert(
                        key,
                        Candidate {
                            entry_index: idx,
                            confidence: entry.confidence,
                            source: Source::Database,
                        },
                    );
                }
                pool.push(entry);
                report.rows_loaded += 1;
            }
            None => {
                warn!("skipping malformed row in {}", csv_path.display());
                report.rows_skipped += 1;
            }
        }
    }

    Ok(report)
}

fn read_schema_version(csv_path: &Path) -> Option<u32> {
    let version_path = PathBuf::from(format!("{}.schema_version", csv_path.display()));
    std::fs::read_to_string(version_path)
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
}

/// One raw row as read from the CSV tabular store, before validation.
#[derive(Debug, serde::Deserialize)]
struct StoreRow {
    original_term: String,
    #[serde(default)]
    variations: String,
    transliteration: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    confidence: String,
    #[serde(default)]
    context_clues: String,
    #[serde(default)]
    is_compound: String,
    #[serde(default)]
    asr_common_error: String,
    #[serde(default)]
    error_type: String,
    #[serde(default)]
    frequency_rating: String,
    #[serde(default)]
    source_authority: String,
    #[serde(default)]
    difficulty_level: String,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

impl StoreRow {
    fn into_entry(self) -> Option<LexiconEntry> {
        if self.original_term.trim().is_empty() || self.transliteration.trim().is_empty() {
            return None;
        }
        let confidence: f32 = self.confidence.trim().parse().ok()?;
        if !(0.0..=1.0).contains(&confidence) {
            return None;
        }
        let category = if self.category.trim().is_empty() {
            Category::Other
        } else {
            self.category.parse().ok()?
        };
        let frequency_rating = if self.frequency_rating.trim().is_empty() {
            FrequencyRating::Medium
        } else {
            self.frequency_rating.parse().ok()?
        };
        let difficulty_level = if self.difficulty_level.trim().is_empty() {
            DifficultyLevel::Beginner
        } else {
            self.difficulty_level.parse().ok()?
        };
        let mut flags = EntryFlags::new();
        flags.set_is_compound(parse_bool(&self.is_compound));
        flags.set_asr_common_error(parse_bool(&self.asr_common_error));

        let mut variations = split_list(&self.variations);
        variations.push(self.original_term);

        Some(LexiconEntry {
            canonical: self.transliteration,
            variations,
            category,
            confidence,
            flags,
            error_type: if self.error_type.trim().is_empty() {
                None
            } else {
                Some(self.error_type)
            },
            context_clues: split_list(&self.context_clues),
            frequency_rating,
            source_authority: if self.source_authority.trim().is_empty() {
                None
            } else {
                Some(self.source_authority)
            },
            difficulty_level,
        })
    }
}

/// Resolves, per lookup key, which candidate entry wins: a higher-confidence
/// entry wins outright; between a
/// database and an overlay candidate of the *same* key, the database
/// candidate must be *strictly* more confident to override the overlay.
fn resolve_winners(candidates: MultiMap<String, Candidate>) -> (HashMap<String, usize>, usize) {
    let mut winners = HashMap::new();
    let mut conflicts = 0;

    for (key, bucket) in candidates.iter_all() {
        if bucket.len() > 1 {
            conflicts += 1;
            warn!("lexicon lookup-key conflict for '{key}' ({} candidates)", bucket.len());
        }

        let best_overlay = bucket
            .iter()
            .filter(|c| c.source == Source::Overlay)
            .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap());
        let best_database = bucket
            .iter()
            .filter(|c| c.source == Source::Database)
            .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap());

        let winner = match (best_database, best_overlay) {
            (Some(db), Some(ov)) => {
                if db.confidence > ov.confidence {
                    db
                } else {
                    ov
                }
            }
            (Some(db), None) => db,
            (None, Some(ov)) => ov,
            (None, None) => continue,
        };
        winners.insert(key.clone(), winner.entry_index);
    }

    (winners, conflicts)
}
