//! Six literal end-to-end acceptance scenarios, driven through the full
//! [`CorrectionDriver`] pipeline rather than any single component in
//! isolation.

use std::io::Write;

use samskara::config::Config;
use samskara::driver::CorrectionDriver;
use samskara::segment::Segment;
use samskara_lexicon::Store;

/// A small lexicon covering exactly the entries these scenarios need:
/// the "Yoga Vasistha" compound title and the three single-word
/// corrections ("utpati", "prakarana", "jnana").
fn scenario_store() -> Store {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lexicon.csv");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(
        f,
        "original_term,variations,transliteration,category,confidence,context_clues,is_compound,asr_common_error,error_type,frequency_rating,source_authority,difficulty_level"
    )
    .unwrap();
    writeln!(f, "Yoga Vasistha,,Yoga Vāsiṣṭha,scripture,0.95,,true,false,,high,,intermediate").unwrap();
    writeln!(f, "utpati,,Utpatti,concept,0.9,,false,true,,medium,,intermediate").unwrap();
    writeln!(f, "prakarana,,Prakaraṇa,concept,0.9,,false,true,,medium,,intermediate").unwrap();
    writeln!(f, "jnana,,jñāna,concept,0.9,,false,true,,high,,beginner").unwrap();
    let (store, report) = Store::load(Some(&path), &[]);
    assert_eq!(report.rows_loaded, 4);
    store
}

fn driver() -> CorrectionDriver {
    CorrectionDriver::new(scenario_store(), Config::default())
}

#[test]
fn scenario_1_english_bypass() {
    let mut driver = driver();
    let segment = Segment::new(1, 0, 1000, "He was treading carefully through the forest");
    let (corrected, _) = driver.process_segment(&segment, None);
    assert_eq!(corrected.text, "He was treading carefully through the forest");
}

#[test]
fn scenario_2_blocklisted_again_never_corrected() {
    let mut driver = driver();
    let segment = Segment::new(2, 0, 1000, "Just again to reiterate, seven steps.");
    let (corrected, _) = driver.process_segment(&segment, None);
    assert_eq!(corrected.text, "Just again to reiterate, seven steps.");
}

#[test]
fn scenario_3_compound_phrase_plus_remaining_lexicon_words() {
    let mut driver = driver();
    let segment = Segment::new(3, 0, 1000, "Yoga Vasistha, Utpati Prakarana");
    let (corrected, _) = driver.process_segment(&segment, None);
    assert_eq!(corrected.text, "Yoga Vāsiṣṭha, Utpatti Prakaraṇa");
}

#[test]
fn scenario_4_segment_wide_pattern_leaves_english_remainder_alone() {
    let mut driver = driver();
    let segment = Segment::new(4, 0, 1000, "Bhagavad Gita chapter 2, verse 47");
    let (corrected, _) = driver.process_segment(&segment, None);
    assert_eq!(corrected.text, "Bhagavad Gītā chapter 2, verse 47");
}

#[test]
fn scenario_5_whitelist_override_on_short_utterance() {
    let mut driver = driver();
    let segment = Segment::new(5, 0, 1000, "That's called jnana");
    let (corrected, _) = driver.process_segment(&segment, None);
    assert_eq!(corrected.text, "That's called jñāna");
}

#[test]
fn scenario_6_purnamadah_mantra_fingerprint() {
    let mut driver = driver();
    let segment = Segment::new(
        6,
        0,
        1000,
        "auṁ pūna-madhah pūna-midam pūrṇāt pūrṇamudacyate purnasya purnamadaya purnameva avasisyate",
    );
    let (corrected, _) = driver.process_segment(&segment, None);
    assert_eq!(
        corrected.text,
        "oṃ pūrṇam adaḥ pūrṇam idaṃ pūrṇāt pūrṇam udacyate\npūrṇasya pūrṇam ādāya pūrṇam evāvaśiṣyate"
    );
}
