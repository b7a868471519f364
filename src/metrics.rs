//! Metrics and quality report. Aggregates the
//! correction records the driver emits into per-segment and per-file
//! summaries, and either prints a human summary or serializes a
//! structured report, matching the two output modes of
//! `original_source/utils/processing_reporter.py`.

use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::segment::{CorrectionRecord, MatchType, Segment};

const MAX_REASONABLE_TOKEN_LEN: usize = 25;

#[derive(Clone, Debug, Serialize)]
pub struct SegmentDiagnostic {
    pub segment_id: u32,
    pub overall_confidence: f32,
    pub issues: Vec<String>,
    pub correction_count: usize,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Report {
    pub segments_processed: usize,
    pub total_corrections: usize,
    pub counts_by_match_type: HashMap<String, usize>,
    pub mean_confidence: f32,
    pub median_confidence: f32,
    pub error_count: usize,
    pub quality_score: f32,
    pub diagnostics: Vec<SegmentDiagnostic>,
}

/// Collects records as the driver runs and produces a [`Report`] at the
/// end of a file.
pub struct Reporter {
    segments_processed: usize,
    all_confidences: Vec<f32>,
    counts_by_match_type: HashMap<String, usize>,
    error_count: usize,
    diagnostics: Vec<SegmentDiagnostic>,
    phase_timings: HashMap<&'static str, Duration>,
}

impl Reporter {
    pub fn new() -> Reporter {
        Reporter {
            segments_processed: 0,
            all_confidences: Vec::new(),
            counts_by_match_type: HashMap::new(),
            error_count: 0,
            diagnostics: Vec::new(),
            phase_timings: HashMap::new(),
        }
    }

    /// Folds one segment's correction records into the running totals and
    /// runs issue detection for that segment.
    pub fn record_segment(&mut self, segment: &Segment, records: &[CorrectionRecord]) {
        self.segments_processed += 1;
        let mut segment_confidences = Vec::new();
        let mut issues = Vec::new();

        for record in records {
            *self.counts_by_match_type.entry(record.match_type.as_str().to_string()).or_insert(0) += 1;
            *self.phase_timings.entry(record.phase).or_insert(Duration::ZERO) += record.elapsed;
            if record.match_type == MatchType::Error {
                self.error_count += 1;
                issues.push(format!("error in phase '{}': {}", record.phase, record.source));
                continue;
            }
            self.all_confidences.push(record.confidence);
            segment_confidences.push(record.confidence);
            if record.produced.chars().count() > MAX_REASONABLE_TOKEN_LEN {
                issues.push(format!("unusually long token produced: '{}'", record.produced));
            }
        }

        if segment.text.contains('[') || segment.text.contains(']') {
            issues.push("stray bracketed text in segment".to_string());
        }

        let overall_confidence = mean(&segment_confidences).unwrap_or(1.0);
        if overall_confidence < 0.9 || !issues.is_empty() {
            self.diagnostics.push(SegmentDiagnostic {
                segment_id: segment.id,
                overall_confidence,
                issues,
                correction_count: records.len(),
            });
        }
    }

    /// Builds the final [`Report`], computing the weighted quality score
    /// (30% confidence mean, 40% success rate, 20% error penalty, 10%
    /// coverage), clamped to [0, 100].
    pub fn finish(self) -> Report {
        let total_corrections: usize = self.counts_by_match_type.values().sum::<usize>() - self.error_count;
        let mean_confidence = mean(&self.all_confidences).unwrap_or(1.0);
        let median_confidence = median(&self.all_confidences).unwrap_or(1.0);
        let success_rate = 1.0_f32; // only successes are ever recorded as non-error.
        let error_penalty = if self.segments_processed == 0 {
            0.0
        } else {
            1.0 - (self.error_count as f32 / self.segments_processed as f32)
        };
        let coverage = if self.segments_processed == 0 {
            0.0
        } else {
            (total_corrections as f32 / self.segments_processed as f32).min(1.0)
        };

        let quality_score = (mean_confidence * 0.30 + success_rate * 0.40 + error_penalty * 0.20 + coverage * 0.10)
            * 100.0;

        Report {
            segments_processed: self.segments_processed,
            total_corrections,
            counts_by_match_type: self.counts_by_match_type,
            mean_confidence,
            median_confidence,
            error_count: self.error_count,
            quality_score: quality_score.clamp(0.0, 100.0),
            diagnostics: self.diagnostics,
        }
    }
}

impl Default for Reporter {
    fn default() -> Reporter {
        Reporter::new()
    }
}

fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f32>() / values.len() as f32)
    }
}

fn median(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Prints the short human summary to stdout.
pub fn print_summary(report: &Report) {
    println!("Segments processed: {}", report.segments_processed);
    println!("Corrections applied: {}", report.total_corrections);
    println!("Mean confidence: {:.2}", report.mean_confidence);
    println!("Quality score: {:.1}/100", report.quality_score);
    if report.error_count > 0 {
        println!("Errors: {}", report.error_count);
    }
    if !report.diagnostics.is_empty() {
        println!("Segments flagged for review: {}", report.diagnostics.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::CorrectionRecord;

    #[test]
    fn quality_score_stays_within_bounds() {
        let mut reporter = Reporter::new();
        let segment = Segment::new(1, 0, 1000, "dharma karma");
        let records = vec![CorrectionRecord::new(
            1,
            "lexicon",
            "dharma",
            "dharma",
            MatchType::Exact,
            0.95,
            Duration::ZERO,
        )];
        reporter.record_segment(&segment, &records);
        let report = reporter.finish();
        assert!(report.quality_score >= 0.0 && report.quality_score <= 100.0);
    }

    #[test]
    fn error_records_count_toward_error_count_not_corrections() {
        let mut reporter = Reporter::new();
        let segment = Segment::new(2, 0, 1000, "oops");
        let records = vec![CorrectionRecord::error(2, "fuzzy", "boom")];
        reporter.record_segment(&segment, &records);
        let report = reporter.finish();
        assert_eq!(report.error_count, 1);
        assert_eq!(report.total_corrections, 0);
    }

    #[test]
    fn low_confidence_segment_is_flagged_as_a_diagnostic() {
        let mut reporter = Reporter::new();
        let segment = Segment::new(3, 0, 1000, "maybe dharma");
        let records = vec![CorrectionRecord::new(
            3,
            "fuzzy",
            "maybe",
            "maybee",
            MatchType::Fuzzy,
            0.5,
            Duration::ZERO,
        )];
        reporter.record_segment(&segment, &records);
        let report = reporter.finish();
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].segment_id, 3);
    }
}
