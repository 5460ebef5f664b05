use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use tokio::sync::{watch, Mutex};
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::PipelineSettings;
use crate::meetings::refresh_session;
use crate::models::NormalizedRecord;
use crate::normalize::{classify, enrich, normalize_snapshot};
use crate::store::{BeaconStore, Snapshot};

use super::state::PipelineState;

// Set to false to silence the per-snapshot chatter in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Event loop driving the whole derivation.
///
/// Two asynchronous sources feed it: the store's full-snapshot push and
/// the fixed-interval session poll. They may race; a snapshot processed
/// with a stale schedule self-corrects on the next accepted snapshot after
/// the poll catches up. Each recomputation reads the role sets and
/// schedule current at the moment it runs, and never awaits while holding
/// the state lock.
pub(super) async fn pipeline_loop<S: BeaconStore>(
    store: Arc<S>,
    state: Arc<Mutex<PipelineState>>,
    updates: watch::Sender<Arc<Vec<NormalizedRecord>>>,
    settings: PipelineSettings,
    cancel_token: CancellationToken,
) {
    let offset = settings.reference_offset();

    let mut snapshots = store.subscribe();
    let mut poll = tokio::time::interval(Duration::from_secs(settings.session_poll_secs.max(1)));
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Resolve the session before the first snapshot so meetings_held is
    // populated from the start, then seed from a one-shot fetch instead of
    // waiting for the first push.
    run_poll_step(store.as_ref(), &state, offset).await;
    match store.fetch_snapshot().await {
        Ok(snapshot) => apply_snapshot(&snapshot, &state, &updates, &settings, offset).await,
        Err(err) => record_transport_error(&state, format!("{err:#}")).await,
    }

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    log_warn!("telemetry store dropped; pipeline loop exiting");
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                apply_snapshot(&snapshot, &state, &updates, &settings, offset).await;
            }
            _ = poll.tick() => {
                run_poll_step(store.as_ref(), &state, offset).await;
            }
            _ = cancel_token.cancelled() => {
                log_info!("pipeline loop shutting down");
                break;
            }
        }
    }
}

/// Normalize one pushed snapshot and, if the gate admits it, replace the
/// derived record set atomically.
async fn apply_snapshot(
    snapshot: &Snapshot,
    state: &Arc<Mutex<PipelineState>>,
    updates: &watch::Sender<Arc<Vec<NormalizedRecord>>>,
    settings: &PipelineSettings,
    offset: FixedOffset,
) {
    let now = Utc::now().with_timezone(&offset);
    let timed = normalize_snapshot(snapshot, now, offset);
    let candidate = timed.last().map(|record| record.zoned_time);

    let mut guard = state.lock().await;
    if !guard.gate.admit(candidate) {
        log_info!("snapshot skipped: no telemetry past the watermark");
        return;
    }

    let (kept, roles) = classify(timed, &settings.catalog);
    let enriched = enrich(kept, &roles, &guard.session.schedule);

    log_info!(
        "accepted snapshot: {} records ({} cadets, {} sectors), watermark {:?}",
        enriched.len(),
        roles.cadets.len(),
        roles.sectors.len(),
        guard.gate.watermark()
    );

    guard.roles = roles;
    guard.records = Arc::new(enriched);
    guard.last_error = None;
    let _ = updates.send(guard.records.clone());
}

/// Poll the session id with the lock released, then commit the refreshed
/// context. Last write wins; a concurrently processed snapshot simply used
/// the context that was current when it ran.
async fn run_poll_step<S: BeaconStore>(
    store: &S,
    state: &Arc<Mutex<PipelineState>>,
    offset: FixedOffset,
) {
    let mut ctx = state.lock().await.session.clone();

    match refresh_session(store, &mut ctx, offset).await {
        Ok(_) => {
            state.lock().await.session = ctx;
        }
        Err(err) => {
            log_error!("session poll failed: {err:#}");
            let mut guard = state.lock().await;
            guard.session = ctx;
            guard.last_error = Some(format!("{err:#}"));
        }
    }
}

async fn record_transport_error(state: &Arc<Mutex<PipelineState>>, message: String) {
    log_error!("telemetry fetch failed: {message}");
    state.lock().await.last_error = Some(message);
}
