use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

/// Canonical device catalogs: which ids count as cadets, which as sector
/// beacons, and which housekeeping ids are excluded outright. Roles are
/// always the intersection of a catalog with the ids present in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCatalog {
    pub cadets: Vec<String>,
    pub sectors: Vec<String>,
    pub ignored: Vec<String>,
}

impl Default for DeviceCatalog {
    fn default() -> Self {
        Self {
            cadets: (1..=24).map(|n| format!("S{n}")).collect(),
            sectors: (1..=8).map(|n| format!("T{n}")).collect(),
            ignored: vec!["TEST".into(), "SPARE".into(), "LAB-GATEWAY".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSettings {
    /// Classroom wall-clock zone as minutes east of UTC.
    pub utc_offset_minutes: i32,
    pub session_poll_secs: u64,
    pub catalog: DeviceCatalog,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            utc_offset_minutes: -5 * 60,
            session_poll_secs: 30,
            catalog: DeviceCatalog::default(),
        }
    }
}

impl PipelineSettings {
    /// The fixed reference zone every timestamp is converted into.
    /// Out-of-range offsets fall back to UTC rather than failing.
    pub fn reference_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
    }
}

pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<PipelineSettings>,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            PipelineSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> PipelineSettings {
        self.data.read().unwrap().clone()
    }

    pub fn update(&self, settings: PipelineSettings) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            *guard = settings;
            self.persist(&guard)?;
        }
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: PipelineSettings = serde_json::from_str(&contents)?;
        let mut guard = self.data.write().unwrap();
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &PipelineSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
