use std::collections::BTreeSet;

/// Device roles observed in one accepted batch.
///
/// Roles are a property of "currently observed", not "ever observed": a
/// device absent from the batch is absent here even if it appeared in an
/// earlier one. `ignored` records which housekeeping ids were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRoleSets {
    pub cadets: BTreeSet<String>,
    pub sectors: BTreeSet<String>,
    pub ignored: BTreeSet<String>,
}

impl DeviceRoleSets {
    pub fn is_cadet(&self, device_id: &str) -> bool {
        self.cadets.contains(device_id)
    }

    pub fn is_sector(&self, device_id: &str) -> bool {
        self.sectors.contains(device_id)
    }
}
