use chrono::Timelike;

use crate::meetings::MeetingSchedule;
use crate::models::{
    is_infected, proximity_count, DeviceRoleSets, NormalizedRecord, SessionHalf,
};

use super::zoned::TimedRecord;

/// Attach derived fields to every record of an accepted batch.
///
/// The role/health partition is exclusive: a record lands in at most one of
/// the four fields, and only when its device holds the matching role in
/// this batch. Callers replace the previous list wholesale with the result,
/// so observers never see a partial mix.
pub fn enrich(
    records: Vec<TimedRecord>,
    roles: &DeviceRoleSets,
    schedule: &MeetingSchedule,
) -> Vec<NormalizedRecord> {
    records
        .into_iter()
        .map(|record| {
            let TimedRecord {
                id,
                raw,
                zoned_time,
            } = record;

            let hour = zoned_time.hour();
            let infected = is_infected(&raw.infection_status);
            let is_cadet = roles.is_cadet(&raw.device_id);
            let is_sector = roles.is_sector(&raw.device_id);
            let device_id = raw.device_id;

            NormalizedRecord {
                id,
                zoned_time,
                hour,
                session_half: SessionHalf::from_hour(hour),
                proximity_count: proximity_count(&raw.proximity_mask),
                meetings_held: schedule.meetings_held(zoned_time),
                infected_cadets: (is_cadet && infected).then(|| device_id.clone()),
                infected_sectors: (is_sector && infected).then(|| device_id.clone()),
                healthy_cadets: (is_cadet && !infected).then(|| device_id.clone()),
                healthy_sectors: (is_sector && !infected).then(|| device_id.clone()),
                device_id,
                extra: raw.extra,
            }
        })
        .collect()
}
