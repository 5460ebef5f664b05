use std::collections::BTreeSet;

use crate::config::DeviceCatalog;
use crate::models::DeviceRoleSets;

use super::zoned::TimedRecord;

/// Partition the batch's device ids into roles and drop ignored devices.
///
/// Role sets contain only ids that are both listed in the corresponding
/// catalog and present in this batch. An id in neither catalog keeps its
/// records but holds no role; an id on the ignore list loses its records
/// entirely before enrichment.
pub fn classify(
    records: Vec<TimedRecord>,
    catalog: &DeviceCatalog,
) -> (Vec<TimedRecord>, DeviceRoleSets) {
    let ignore: BTreeSet<&str> = catalog.ignored.iter().map(String::as_str).collect();

    let mut roles = DeviceRoleSets::default();
    let mut kept = Vec::with_capacity(records.len());

    for record in records {
        let device_id = &record.raw.device_id;
        if ignore.contains(device_id.as_str()) {
            roles.ignored.insert(device_id.clone());
            continue;
        }
        if catalog.cadets.contains(device_id) {
            roles.cadets.insert(device_id.clone());
        } else if catalog.sectors.contains(device_id) {
            roles.sectors.insert(device_id.clone());
        }
        kept.push(record);
    }

    (kept, roles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRecord;
    use chrono::DateTime;
    use std::collections::BTreeMap;

    fn catalog() -> DeviceCatalog {
        DeviceCatalog {
            cadets: vec!["S1".into(), "S2".into()],
            sectors: vec!["T1".into()],
            ignored: vec!["TEST".into()],
        }
    }

    fn record(device_id: &str) -> TimedRecord {
        TimedRecord {
            id: format!("key-{device_id}"),
            raw: RawRecord {
                device_id: device_id.to_string(),
                timestamp: "2026-03-02T14:00:00+00:00".to_string(),
                infection_status: serde_json::Value::Null,
                proximity_mask: serde_json::Value::Null,
                extra: BTreeMap::new(),
            },
            zoned_time: DateTime::parse_from_rfc3339("2026-03-02T14:00:00+00:00").unwrap(),
        }
    }

    #[test]
    fn roles_are_scoped_to_present_ids() {
        // S2 is in the catalog but not in this batch.
        let (kept, roles) = classify(vec![record("S1"), record("T1")], &catalog());
        assert_eq!(kept.len(), 2);
        assert!(roles.is_cadet("S1"));
        assert!(!roles.is_cadet("S2"));
        assert!(roles.is_sector("T1"));
    }

    #[test]
    fn ignored_devices_are_dropped_entirely() {
        let (kept, roles) = classify(vec![record("S1"), record("TEST")], &catalog());
        let ids: Vec<&str> = kept.iter().map(|r| r.raw.device_id.as_str()).collect();
        assert_eq!(ids, vec!["S1"]);
        assert!(roles.ignored.contains("TEST"));
    }

    #[test]
    fn uncataloged_devices_keep_records_without_role() {
        let (kept, roles) = classify(vec![record("X9")], &catalog());
        assert_eq!(kept.len(), 1);
        assert!(!roles.is_cadet("X9"));
        assert!(!roles.is_sector("X9"));
    }
}
