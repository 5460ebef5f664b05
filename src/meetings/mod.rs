pub mod keys;
pub mod refresh;
pub mod schedule;

pub use keys::{decode_meeting_key, encode_meeting_key};
pub use refresh::refresh_session;
pub use schedule::{MeetingSchedule, MEETING_END_EVENT};
