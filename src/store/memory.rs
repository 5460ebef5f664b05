use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use serde_json::Value;
use tokio::sync::watch;

use crate::models::MeetingEvent;

use super::{MeetingLog, MeetingLogStore, SessionStore, Snapshot, TelemetryStore};

/// In-memory backend used by the simulator and the integration tests.
///
/// Mirrors the push semantics of the real store: every mutation of the
/// record table re-delivers the whole mapping to subscribers. Failure
/// flags let tests inject transport errors per surface.
pub struct InMemoryStore {
    inner: Mutex<MemoryState>,
    snapshot_tx: watch::Sender<Snapshot>,
}

struct MemoryState {
    records: BTreeMap<String, Value>,
    session_id: Option<String>,
    logs: BTreeMap<String, MeetingLog>,
    fail_telemetry: bool,
    fail_session: bool,
    fail_meeting_log: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(BTreeMap::new()));
        Self {
            inner: Mutex::new(MemoryState {
                records: BTreeMap::new(),
                session_id: None,
                logs: BTreeMap::new(),
                fail_telemetry: false,
                fail_session: false,
                fail_meeting_log: false,
            }),
            snapshot_tx,
        }
    }

    pub fn insert_record(&self, key: &str, value: Value) {
        let mut state = self.inner.lock().unwrap();
        state.records.insert(key.to_string(), value);
        self.push(&state);
    }

    /// Replace the whole record table, e.g. to simulate a partial read.
    pub fn replace_records(&self, records: BTreeMap<String, Value>) {
        let mut state = self.inner.lock().unwrap();
        state.records = records;
        self.push(&state);
    }

    pub fn set_session(&self, session_id: Option<&str>) {
        let mut state = self.inner.lock().unwrap();
        state.session_id = session_id.map(str::to_string);
    }

    pub fn append_meeting_event(&self, session_id: &str, key: String, event: MeetingEvent) {
        let mut state = self.inner.lock().unwrap();
        state
            .logs
            .entry(session_id.to_string())
            .or_default()
            .insert(key, event);
    }

    pub fn fail_telemetry(&self, fail: bool) {
        self.inner.lock().unwrap().fail_telemetry = fail;
    }

    pub fn fail_session(&self, fail: bool) {
        self.inner.lock().unwrap().fail_session = fail;
    }

    pub fn fail_meeting_log(&self, fail: bool) {
        self.inner.lock().unwrap().fail_meeting_log = fail;
    }

    fn push(&self, state: &MemoryState) {
        // Subscribers may all be gone; that is not this store's problem.
        let _ = self.snapshot_tx.send(Arc::new(state.records.clone()));
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryStore for InMemoryStore {
    fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let state = self.inner.lock().unwrap();
        if state.fail_telemetry {
            bail!("telemetry store unavailable");
        }
        Ok(Arc::new(state.records.clone()))
    }
}

impl SessionStore for InMemoryStore {
    async fn active_session(&self) -> Result<Option<String>> {
        let state = self.inner.lock().unwrap();
        if state.fail_session {
            bail!("session store unavailable");
        }
        Ok(state.session_id.clone())
    }
}

impl MeetingLogStore for InMemoryStore {
    async fn fetch_meeting_log(&self, session_id: &str) -> Result<MeetingLog> {
        let state = self.inner.lock().unwrap();
        if state.fail_meeting_log {
            bail!("meeting log unavailable");
        }
        Ok(state.logs.get(session_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn every_mutation_pushes_the_full_mapping() {
        let store = InMemoryStore::new();
        let mut rx = store.subscribe();

        store.insert_record("r1", json!({ "device_id": "S1" }));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);

        store.insert_record("r2", json!({ "device_id": "S2" }));
        rx.changed().await.unwrap();
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains_key("r1"));
    }

    #[tokio::test]
    async fn failure_flags_affect_only_their_surface() {
        let store = InMemoryStore::new();
        store.set_session(Some("period-3"));
        store.fail_meeting_log(true);

        assert!(store.fetch_snapshot().await.is_ok());
        assert!(store.active_session().await.is_ok());
        assert!(store.fetch_meeting_log("period-3").await.is_err());

        store.fail_meeting_log(false);
        assert!(store.fetch_meeting_log("period-3").await.is_ok());
    }
}
