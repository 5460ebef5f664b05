use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One raw telemetry entry as delivered by the record store.
///
/// The store is loosely typed: `infection_status` may arrive as a number or
/// a numeric string, and `proximity_mask` is occasionally negative or
/// missing. Both stay raw JSON here and are coerced at enrichment time.
/// Fields beyond the required core land in `extra` and are only read
/// through the plot variable accessors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub device_id: String,
    pub timestamp: String,
    #[serde(default)]
    pub infection_status: Value,
    #[serde(default)]
    pub proximity_mask: Value,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// AM/PM partition of the telemetry day, bounded by local noon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionHalf {
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "PM")]
    Pm,
}

impl SessionHalf {
    pub fn from_hour(hour: u32) -> Self {
        if hour < 12 {
            SessionHalf::Am
        } else {
            SessionHalf::Pm
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionHalf::Am => "AM",
            SessionHalf::Pm => "PM",
        }
    }
}

/// A raw record after zoning, windowing, classification, and enrichment.
///
/// Invariant: at most one of the four role/health fields is `Some`, and
/// only when `device_id` was classified into that role for the batch the
/// record arrived in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    pub id: String,
    pub device_id: String,
    pub zoned_time: DateTime<FixedOffset>,
    pub hour: u32,
    pub session_half: SessionHalf,
    pub proximity_count: u32,
    pub meetings_held: u32,
    pub infected_cadets: Option<String>,
    pub infected_sectors: Option<String>,
    pub healthy_cadets: Option<String>,
    pub healthy_sectors: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Lenient numeric coercion shared by the enricher and plot accessors.
/// Numbers pass through; numeric strings are parsed; everything else is
/// `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Infected iff the status coerces to exactly the integer 1. `"1"`, `1`,
/// and `1.0` all count; absent, garbage, and every other number are
/// healthy.
pub fn is_infected(status: &Value) -> bool {
    coerce_number(status) == Some(1.0)
}

/// Population count of the proximity bitmask. Negative, fractional, and
/// non-numeric masks contribute zero set bits.
pub fn proximity_count(mask: &Value) -> u32 {
    match coerce_number(mask) {
        Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64 => {
            (n as u64).count_ones()
        }
        _ => 0,
    }
}
