use chrono::{DateTime, FixedOffset, Timelike};
use log::debug;

use crate::models::RawRecord;
use crate::store::Snapshot;

/// A raw record with its snapshot key and reference-zone timestamp
/// attached. Intermediate shape between the raw mapping and enrichment.
#[derive(Debug, Clone)]
pub struct TimedRecord {
    pub id: String,
    pub raw: RawRecord,
    pub zoned_time: DateTime<FixedOffset>,
}

/// Parse, zone-convert, window-filter, and sort one raw snapshot.
///
/// Entries that are not objects, lack a device id, or carry a missing or
/// unparsable timestamp are dropped without failing the batch. The window
/// keeps only the session half that `now` falls in: strictly before local
/// noon when `now` is before noon, at or after noon otherwise. Classroom
/// sessions run in two daily halves, so this keeps the working set bounded
/// and keeps the morning's residue out of the afternoon.
pub fn normalize_snapshot(
    snapshot: &Snapshot,
    now: DateTime<FixedOffset>,
    offset: FixedOffset,
) -> Vec<TimedRecord> {
    let noon = local_noon(now);
    let morning = now < noon;

    let mut records: Vec<TimedRecord> = snapshot
        .iter()
        .filter_map(|(key, value)| {
            let raw: RawRecord = match serde_json::from_value(value.clone()) {
                Ok(raw) => raw,
                Err(err) => {
                    debug!("dropping malformed entry '{key}': {err}");
                    return None;
                }
            };
            if raw.device_id.is_empty() {
                debug!("dropping entry '{key}' with empty device id");
                return None;
            }
            let zoned_time = parse_zoned(&raw.timestamp, offset)?;
            Some(TimedRecord {
                id: key.clone(),
                raw,
                zoned_time,
            })
        })
        .filter(|record| {
            if morning {
                record.zoned_time < noon
            } else {
                record.zoned_time >= noon
            }
        })
        .collect();

    records.sort_by_key(|record| record.zoned_time);
    records
}

fn parse_zoned(timestamp: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(parsed) => Some(parsed.with_timezone(&offset)),
        Err(err) => {
            debug!("dropping record with bad timestamp '{timestamp}': {err}");
            None
        }
    }
}

/// Noon of `now`'s date in the reference zone.
fn local_noon(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    now.with_hour(12)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(timestamp: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(timestamp).unwrap()
    }

    fn snapshot(entries: &[(&str, serde_json::Value)]) -> Snapshot {
        let map: BTreeMap<String, serde_json::Value> = entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();
        Arc::new(map)
    }

    fn entry(device_id: &str, timestamp: &str) -> serde_json::Value {
        json!({ "device_id": device_id, "timestamp": timestamp })
    }

    #[test]
    fn empty_snapshot_yields_empty_list() {
        let records = normalize_snapshot(&snapshot(&[]), at("2026-03-02T15:00:00+00:00"), utc());
        assert!(records.is_empty());
    }

    #[test]
    fn afternoon_window_keeps_only_pm_records() {
        let snap = snapshot(&[
            ("a", entry("S1", "2026-03-02T09:30:00+00:00")),
            ("b", entry("S1", "2026-03-02T12:00:00+00:00")),
            ("c", entry("S1", "2026-03-02T14:45:00+00:00")),
        ]);
        let records = normalize_snapshot(&snap, at("2026-03-02T15:00:00+00:00"), utc());
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        // Noon itself belongs to the PM half.
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn morning_window_keeps_only_am_records() {
        let snap = snapshot(&[
            ("a", entry("S1", "2026-03-02T09:30:00+00:00")),
            ("b", entry("S1", "2026-03-02T12:00:00+00:00")),
        ]);
        let records = normalize_snapshot(&snap, at("2026-03-02T10:00:00+00:00"), utc());
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn output_is_sorted_ascending() {
        let snap = snapshot(&[
            ("late", entry("S1", "2026-03-02T16:00:00+00:00")),
            ("early", entry("S2", "2026-03-02T13:00:00+00:00")),
            ("mid", entry("T1", "2026-03-02T14:30:00+00:00")),
        ]);
        let records = normalize_snapshot(&snap, at("2026-03-02T17:00:00+00:00"), utc());
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "mid", "late"]);
    }

    #[test]
    fn bad_entries_are_dropped_silently() {
        let snap = snapshot(&[
            ("ok", entry("S1", "2026-03-02T14:00:00+00:00")),
            ("no_ts", json!({ "device_id": "S2" })),
            ("bad_ts", entry("S3", "not-a-timestamp")),
            ("not_object", json!(42)),
            ("null", serde_json::Value::Null),
            ("no_device", json!({ "timestamp": "2026-03-02T14:10:00+00:00" })),
        ]);
        let records = normalize_snapshot(&snap, at("2026-03-02T15:00:00+00:00"), utc());
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ok"]);
    }

    #[test]
    fn timestamps_convert_to_reference_zone() {
        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        // 19:00 UTC is 14:00 EST, the afternoon half there.
        let snap = snapshot(&[("a", entry("S1", "2026-03-02T19:00:00+00:00"))]);
        let records = normalize_snapshot(&snap, at("2026-03-02T15:00:00-05:00"), est);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].zoned_time.hour(), 14);
    }
}
