use anyhow::{Context, Result};
use chrono::FixedOffset;
use log::info;

use crate::models::SessionContext;
use crate::store::{MeetingLogStore, SessionStore};

use super::schedule::MeetingSchedule;

/// One poll step: resolve the active session id and, when it changed,
/// replace the meeting schedule wholesale.
///
/// An absent session simply disables correlation. A failed log fetch
/// drops the schedule to empty (meetings held degrade to 0) and surfaces
/// the transport error, but does not adopt the new session id, so the next
/// scheduled poll retries the fetch. Telemetry handling is never blocked
/// by any of this. Returns whether the session id changed.
pub async fn refresh_session<S>(
    store: &S,
    ctx: &mut SessionContext,
    offset: FixedOffset,
) -> Result<bool>
where
    S: SessionStore + MeetingLogStore,
{
    let session_id = store
        .active_session()
        .await
        .context("active session lookup failed")?;

    if session_id == ctx.session_id {
        return Ok(false);
    }

    info!(
        "active session changed: {:?} -> {:?}",
        ctx.session_id, session_id
    );

    let Some(id) = session_id else {
        ctx.session_id = None;
        ctx.schedule = MeetingSchedule::default();
        return Ok(true);
    };

    let log = match store.fetch_meeting_log(&id).await {
        Ok(log) => log,
        Err(err) => {
            ctx.schedule = MeetingSchedule::default();
            return Err(err).with_context(|| format!("meeting log fetch failed for session {id}"));
        }
    };

    ctx.schedule = MeetingSchedule::from_log(&log, offset);
    info!(
        "meeting log loaded: {} end events for session {id}",
        ctx.schedule.len()
    );
    ctx.session_id = Some(id);
    Ok(true)
}
