use std::sync::Arc;

use crate::models::{DeviceRoleSets, NormalizedRecord, SessionContext};
use crate::normalize::WatermarkGate;

/// Everything the worker mutates between snapshots.
///
/// Owned by the controller behind a single mutex and passed by reference
/// into each step; there is no module-level singleton. Observers never see
/// this directly: the record list is only ever replaced as a whole `Arc`,
/// so a reader holds either the old complete list or the new one.
#[derive(Debug, Default)]
pub struct PipelineState {
    pub gate: WatermarkGate,
    pub records: Arc<Vec<NormalizedRecord>>,
    pub roles: DeviceRoleSets,
    pub session: SessionContext,
    /// Last transport failure, cleared by the next accepted snapshot.
    /// Malformed records and gate rejections never land here.
    pub last_error: Option<String>,
}
