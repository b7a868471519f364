//! Segment and correction-record types shared across every component.

use std::time::Duration;

/// One time-coded subtitle record. Immutable after parsing; the driver
/// produces a new `Segment` with corrected text rather than mutating this
/// one in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub id: u32,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

impl Segment {
    pub fn new(id: u32, start_ms: u64, end_ms: u64, text: impl Into<String>) -> Segment {
        Segment {
            id,
            start_ms,
            end_ms,
            text: text.into(),
        }
    }

    pub fn with_text(&self, text: impl Into<String>) -> Segment {
        Segment {
            id: self.id,
            start_ms: self.start_ms,
            end_ms: self.end_ms,
            text: text.into(),
        }
    }
}

/// How a correction was produced. Carried on every [`CorrectionRecord`] so
/// the reporter can break down counts by strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchType {
    Exact,
    CaseInsensitive,
    Phrase,
    Fuzzy,
    Phonetic,
    Pattern,
    ProperNoun,
    Error,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::CaseInsensitive => "case-insensitive",
            MatchType::Phrase => "phrase",
            MatchType::Fuzzy => "fuzzy",
            MatchType::Phonetic => "phonetic",
            MatchType::Pattern => "pattern",
            MatchType::ProperNoun => "proper-noun",
            MatchType::Error => "error",
        }
    }
}

/// One correction event, emitted by the driver and consumed by the
/// reporter. `phase` names the driver step that produced
/// it (`"phrase"`, `"lexicon"`, `"pattern"`, `"fuzzy"`, ...).
#[derive(Clone, Debug)]
pub struct CorrectionRecord {
    pub segment_id: u32,
    pub phase: &'static str,
    pub source: String,
    pub produced: String,
    pub match_type: MatchType,
    pub confidence: f32,
    pub elapsed: Duration,
}

impl CorrectionRecord {
    pub fn new(
        segment_id: u32,
        phase: &'static str,
        source: impl Into<String>,
        produced: impl Into<String>,
        match_type: MatchType,
        confidence: f32,
        elapsed: Duration,
    ) -> CorrectionRecord {
        CorrectionRecord {
            segment_id,
            phase,
            source: source.into(),
            produced: produced.into(),
            match_type,
            confidence: confidence.clamp(0.0, 1.0),
            elapsed,
        }
    }

    pub fn error(segment_id: u32, phase: &'static str, message: impl Into<String>) -> CorrectionRecord {
        CorrectionRecord {
            segment_id,
            phase,
            source: message.into(),
            produced: String::new(),
            match_type: MatchType::Error,
            confidence: 0.0,
            elapsed: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_text_preserves_timing() {
        let seg = Segment::new(3, 1000, 2000, "original");
        let corrected = seg.with_text("corrected");
        assert_eq!(corrected.id, 3);
        assert_eq!(corrected.start_ms, 1000);
        assert_eq!(corrected.end_ms, 2000);
        assert_eq!(corrected.text, "corrected");
    }

    #[test]
    fn correction_record_clamps_confidence() {
        let record = CorrectionRecord::new(1, "fuzzy", "teh", "the", MatchType::Fuzzy, 1.4, Duration::ZERO);
        assert_eq!(record.confidence, 1.0);
    }

    #[test]
    fn error_record_has_zero_confidence() {
        let record = CorrectionRecord::error(5, "lexicon", "lookup panicked");
        assert_eq!(record.match_type, MatchType::Error);
        assert_eq!(record.confidence, 0.0);
    }
}
