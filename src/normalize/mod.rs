pub mod classify;
pub mod enrich;
pub mod watermark;
pub mod zoned;

pub use classify::classify;
pub use enrich::enrich;
pub use watermark::WatermarkGate;
pub use zoned::{normalize_snapshot, TimedRecord};
