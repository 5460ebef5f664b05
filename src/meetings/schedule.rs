use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use log::debug;

use crate::models::MeetingEvent;

use super::keys::decode_meeting_key;

/// Log event type marking the completion of a meeting.
pub const MEETING_END_EVENT: &str = "MEETINGEND";

/// Ascending meeting-end instants for the active session.
///
/// The default schedule is empty and reports zero meetings held at any
/// instant, which is exactly the degraded behavior when no session is
/// active or the log fetch failed.
#[derive(Debug, Clone, Default)]
pub struct MeetingSchedule {
    ends: Vec<DateTime<FixedOffset>>,
}

impl MeetingSchedule {
    /// Build from a raw log, keeping only `MEETINGEND` entries whose keys
    /// decode. Undecodable entries are skipped, not fatal. The whole log is
    /// replaced on every session change; there is no incremental merge.
    pub fn from_log(log: &BTreeMap<String, MeetingEvent>, offset: FixedOffset) -> Self {
        let ends = log
            .iter()
            .filter(|(_, entry)| entry.event == MEETING_END_EVENT)
            .filter_map(|(key, _)| match decode_meeting_key(key) {
                Ok(timestamp) => Some(timestamp.with_timezone(&offset)),
                Err(err) => {
                    debug!("skipping meeting entry: {err:#}");
                    None
                }
            })
            .collect();
        Self::from_ends(ends)
    }

    pub fn from_ends(mut ends: Vec<DateTime<FixedOffset>>) -> Self {
        ends.sort_unstable();
        Self { ends }
    }

    /// Number of meetings ended at or before `t`. Monotonic non-decreasing
    /// in `t` for a fixed schedule.
    pub fn meetings_held(&self, t: DateTime<FixedOffset>) -> u32 {
        self.ends.partition_point(|end| *end <= t) as u32
    }

    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }
}
