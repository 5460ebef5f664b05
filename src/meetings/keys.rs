//! Meeting-log entries are keyed by their RFC 3339 timestamp with `:` and
//! `.` replaced by `_`, because the log store forbids those characters in
//! keys. This module is the only place that encoding is known; everything
//! else handles real timestamps.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, SecondsFormat};

/// Render a timestamp the way the log store keys it, e.g.
/// `2026-03-02T14_05_00_000-05_00`.
pub fn encode_meeting_key(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp
        .to_rfc3339_opts(SecondsFormat::Millis, false)
        .replace([':', '.'], "_")
}

/// Restore a log key to the timestamp it encodes.
///
/// The first two underscores after `T` were colons, a third was the
/// fractional-second dot, and underscores in the trailing signed offset
/// were colons. Keys that do not decode to a timestamp are an error; the
/// caller decides whether to skip or fail.
pub fn decode_meeting_key(key: &str) -> Result<DateTime<FixedOffset>> {
    let time_start = key
        .find('T')
        .ok_or_else(|| anyhow!("meeting key '{key}' has no time component"))?;

    // The offset suffix is the last sign after 'T'; the date's own dashes
    // all come before it.
    let (body, suffix) = match key[time_start..].rfind(['+', '-']) {
        Some(index) => key.split_at(time_start + index),
        None => (key, ""),
    };

    let mut restored = String::with_capacity(key.len());
    let mut underscores = 0;
    for ch in body.chars() {
        if ch == '_' {
            underscores += 1;
            restored.push(if underscores <= 2 { ':' } else { '.' });
        } else {
            restored.push(ch);
        }
    }
    restored.push_str(&suffix.replace('_', ":"));

    DateTime::parse_from_rfc3339(&restored)
        .with_context(|| format!("meeting key '{key}' does not decode to a timestamp"))
}
