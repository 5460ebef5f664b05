use serde::{Deserialize, Serialize};

/// One entry in the per-session meeting-event log. Only `MEETINGEND`
/// entries matter to the correlator; everything else is passed over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingEvent {
    pub event: String,
    pub timestamp: String,
}
