//! SRT subtitle format reader/writer. For a runnable binary the parsing
//! and rendering live here directly, grounded in
//! `original_source/utils/srt_parser.py`'s block-splitting approach but
//! re-expressed without silently swallowing malformed blocks.

use log::warn;

use crate::segment::Segment;

/// Parses SRT text into segments. Blank-line-separated blocks; each block
/// is `index`, then `HH:MM:SS,mmm --> HH:MM:SS,mmm`, then one or more text
/// lines. Malformed blocks are skipped with a warning; well-formed blocks
/// around a malformed one are still parsed.
pub fn parse_srt(text: &str) -> Vec<Segment> {
    let normalized = text.replace("\r\n", "\n");
    let mut segments = Vec::new();

    for (block_index, block) in normalized.split("\n\n").enumerate() {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        let mut lines = block.lines();

        let Some(index_line) = lines.next() else {
            warn!("skipping empty block at position {block_index}");
            continue;
        };
        let Ok(id) = index_line.trim().parse::<u32>() else {
            warn!("skipping block with non-numeric index: '{index_line}'");
            continue;
        };

        let Some(timestamp_line) = lines.next() else {
            warn!("skipping block {id}: missing timestamp line");
            continue;
        };
        let Some((start_ms, end_ms)) = parse_timestamp_line(timestamp_line) else {
            warn!("skipping block {id}: malformed timestamp line '{timestamp_line}'");
            continue;
        };

        let text_lines: Vec<&str> = lines.collect();
        if text_lines.is_empty() {
            warn!("skipping block {id}: no text lines");
            continue;
        }

        segments.push(Segment::new(id, start_ms, end_ms, text_lines.join("\n")));
    }

    segments
}

fn parse_timestamp_line(line: &str) -> Option<(u64, u64)> {
    let (start, end) = line.split_once("-->")?;
    Some((parse_timestamp(start.trim())?, parse_timestamp(end.trim())?))
}

fn parse_timestamp(raw: &str) -> Option<u64> {
    let (time_part, ms_part) = raw.split_once(',')?;
    let mut fields = time_part.split(':');
    let hours: u64 = fields.next()?.parse().ok()?;
    let minutes: u64 = fields.next()?.parse().ok()?;
    let seconds: u64 = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    let millis: u64 = ms_part.parse().ok()?;
    Some(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis)
}

fn format_timestamp(total_ms: u64) -> String {
    let millis = total_ms % 1000;
    let total_seconds = total_ms / 1000;
    let seconds = total_seconds % 60;
    let total_minutes = total_seconds / 60;
    let minutes = total_minutes % 60;
    let hours = total_minutes / 60;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Renders segments back into SRT text. Indices and timestamps are
/// preserved exactly; only text content may have changed.
pub fn render_srt(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| {
            format!(
                "{}\n{} --> {}\n{}\n",
                segment.id,
                format_timestamp(segment.start_ms),
                format_timestamp(segment.end_ms),
                segment.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_blocks() {
        let srt = "1\n00:00:01,000 --> 00:00:04,000\nHello world\n\n2\n00:00:05,000 --> 00:00:08,500\nSecond line\n";
        let segments = parse_srt(srt);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].id, 1);
        assert_eq!(segments[0].start_ms, 1000);
        assert_eq!(segments[0].end_ms, 4000);
        assert_eq!(segments[0].text, "Hello world");
        assert_eq!(segments[1].end_ms, 8500);
    }

    #[test]
    fn skips_malformed_block_but_keeps_surrounding_ones() {
        let srt = "1\n00:00:01,000 --> 00:00:02,000\nfirst\n\nnot-a-number\nbroken\n\n3\n00:00:05,000 --> 00:00:06,000\nthird\n";
        let segments = parse_srt(srt);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].id, 1);
        assert_eq!(segments[1].id, 3);
    }

    #[test]
    fn timestamp_roundtrips() {
        assert_eq!(format_timestamp(parse_timestamp("01:02:03,456").unwrap()), "01:02:03,456");
    }

    #[test]
    fn render_then_parse_preserves_structure() {
        let original = vec![Segment::new(1, 1000, 2000, "dharma")];
        let rendered = render_srt(&original);
        let reparsed = parse_srt(&rendered);
        assert_eq!(reparsed.len(), 1);
        assert_eq!(reparsed[0].id, 1);
        assert_eq!(reparsed[0].start_ms, 1000);
        assert_eq!(reparsed[0].end_ms, 2000);
        assert_eq!(reparsed[0].text, "dharma");
    }
}
