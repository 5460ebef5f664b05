use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tokio::sync::watch;

use crate::models::MeetingEvent;

mod memory;

pub use memory::InMemoryStore;

/// The entire raw-record mapping, as pushed by the telemetry store on
/// every change. Values are loosely typed; the normalizer decides what
/// survives.
pub type Snapshot = Arc<BTreeMap<String, Value>>;

/// Per-session meeting-event log, keyed by underscore-escaped timestamps.
pub type MeetingLog = BTreeMap<String, MeetingEvent>;

/// Push-based raw record table.
///
/// The store delivers full snapshots, not deltas. Dropping the receiver
/// unsubscribes.
pub trait TelemetryStore: Send + Sync + 'static {
    fn subscribe(&self) -> watch::Receiver<Snapshot>;

    fn fetch_snapshot(&self) -> impl Future<Output = Result<Snapshot>> + Send;
}

/// Scalar cell holding the active session identifier, if any.
pub trait SessionStore: Send + Sync + 'static {
    fn active_session(&self) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Append-only per-session meeting-event log.
pub trait MeetingLogStore: Send + Sync + 'static {
    fn fetch_meeting_log(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<MeetingLog>> + Send;
}

/// Everything the pipeline needs from one backend.
pub trait BeaconStore: TelemetryStore + SessionStore + MeetingLogStore {}

impl<T: TelemetryStore + SessionStore + MeetingLogStore> BeaconStore for T {}
