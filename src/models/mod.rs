mod meeting;
mod record;
mod roles;
mod session;

pub use meeting::MeetingEvent;
pub use record::{
    coerce_number, is_infected, proximity_count, NormalizedRecord, RawRecord, SessionHalf,
};
pub use roles::DeviceRoleSets;
pub use session::SessionContext;
