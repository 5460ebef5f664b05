use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::PipelineSettings;
use crate::models::{DeviceRoleSets, NormalizedRecord};
use crate::store::BeaconStore;

use super::state::PipelineState;
use super::worker::pipeline_loop;

/// Owns the derivation worker and the state it mutates.
///
/// `start` spawns the worker; `stop` cancels it and joins, after which no
/// further state writes occur. Everything observable goes through the
/// accessors or the broadcast channel; nothing hands out the mutex.
pub struct PipelineController {
    state: Arc<Mutex<PipelineState>>,
    updates_rx: watch::Receiver<Arc<Vec<NormalizedRecord>>>,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl PipelineController {
    pub fn start<S: BeaconStore>(store: Arc<S>, settings: PipelineSettings) -> Self {
        let state = Arc::new(Mutex::new(PipelineState::default()));
        let (updates_tx, updates_rx) = watch::channel(Arc::new(Vec::new()));
        let cancel_token = CancellationToken::new();

        let handle = tokio::spawn(pipeline_loop(
            store,
            state.clone(),
            updates_tx,
            settings,
            cancel_token.clone(),
        ));

        Self {
            state,
            updates_rx,
            handle: Some(handle),
            cancel_token: Some(cancel_token),
        }
    }

    /// Receiver that observes every accepted recomputation. The borrowed
    /// value is always a complete list; gate-rejected snapshots produce no
    /// notification.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<NormalizedRecord>>> {
        self.updates_rx.clone()
    }

    pub async fn current_records(&self) -> Arc<Vec<NormalizedRecord>> {
        self.state.lock().await.records.clone()
    }

    pub async fn current_roles(&self) -> DeviceRoleSets {
        self.state.lock().await.roles.clone()
    }

    pub async fn session_id(&self) -> Option<String> {
        self.state.lock().await.session.session_id.clone()
    }

    pub async fn watermark(&self) -> Option<DateTime<FixedOffset>> {
        self.state.lock().await.gate.watermark()
    }

    /// Last transport failure, if the most recent store interaction failed.
    /// The previously derived records remain available alongside it.
    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error.clone()
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle.await.context("pipeline worker failed to join")?;
        }
        Ok(())
    }
}
