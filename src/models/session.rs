use crate::meetings::MeetingSchedule;

/// Active session id plus the meeting-end schedule fetched for it.
///
/// The id is polled independently of telemetry. When it changes, the
/// schedule is refetched and replaced in full; there is no incremental
/// merge. No session means no correlation: the empty schedule reports
/// zero meetings held at any instant.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub session_id: Option<String>,
    pub schedule: MeetingSchedule,
}
