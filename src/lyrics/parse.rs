use crate::lyrics::types::LyricLine;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;

/// A leading `[MM:SS]`, `[MM:SS.f]` .. `[MM:SS.fff]` tag; longer fractions
/// are accepted and truncated to milliseconds. `:` is tolerated as the
/// fraction separator.
static LEADING_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[(\d+):(\d{1,2})(?:[.:](\d+))?\]").unwrap());

/// Parse time-synced lyrics into LyricLine structs.
///
/// Only tags at the start of a line are timestamps; brackets later in the
/// line are lyric text. Lines without a leading tag, or whose text is empty
/// once the tags are stripped, are dropped. A line with several tags yields
/// one entry per tag. The result is stable-sorted by time, so entries sharing
/// a timestamp keep their source order.
pub fn parse_synced_lyrics(synced: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();
    for line in synced.split(['\r', '\n']) {
        let (times, rest) = split_leading_tags(line);
        if times.is_empty() {
            continue;
        }
        let text = rest.trim();
        if text.is_empty() {
            continue;
        }
        lines.extend(times.into_iter().map(|time| LyricLine {
            time,
            text: text.to_string(),
        }));
    }
    lines.sort_by(|a, b| a.time.total_cmp(&b.time));
    lines
}

/// Consume timestamp tags from the front of `line`. Stops at the first
/// bracket that is not a usable tag, which then stays part of the text.
fn split_leading_tags(line: &str) -> (Vec<f64>, &str) {
    let mut times = Vec::new();
    let mut rest = line;
    while let Some(cap) = LEADING_TAG_RE.captures(rest) {
        let Some(time) = tag_seconds(&cap) else {
            break;
        };
        times.push(time);
        rest = &rest[cap.get(0).map_or(0, |m| m.end())..];
    }
    (times, rest)
}

fn tag_seconds(cap: &regex::Captures<'_>) -> Option<f64> {
    let min = cap.get(1)?.as_str().parse::<u64>().ok()?;
    let sec = cap.get(2)?.as_str().parse::<u64>().ok()?;
    let millis = cap.get(3).map(|f| fraction_to_millis(f.as_str())).unwrap_or(0);
    Some(min as f64 * 60.0 + sec as f64 + f64::from(millis) / 1000.0)
}

/// "5" -> 500, "05" -> 50, "123" -> 123, "12345" -> 123
fn fraction_to_millis(digits: &str) -> u32 {
    let mut millis = 0u32;
    let mut scale = 100u32;
    for d in digits.bytes().take(3) {
        millis += u32::from(d - b'0') * scale;
        scale /= 10;
    }
    millis
}

/// Render lines back into canonical `[MM:SS.mmm]text` form, one per line.
pub fn format_lrc(lines: &[LyricLine]) -> String {
    let mut out = String::new();
    for line in lines {
        let ms = (line.time.max(0.0) * 1000.0).round() as u64;
        let minutes = ms / 60_000;
        let seconds = (ms % 60_000) / 1000;
        let millis = ms % 1000;
        let _ = writeln!(out, "[{:02}:{:02}.{:03}]{}", minutes, seconds, millis, line.text);
    }
    out
}
