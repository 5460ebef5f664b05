use chrono::{DateTime, FixedOffset};
use log::debug;

/// Idempotence gate over full-snapshot pushes.
///
/// The store re-delivers the entire mapping on every change, so most pushes
/// carry nothing new. A snapshot is admitted only when its maximum zoned
/// timestamp strictly exceeds the stored high-water mark. Equal or older
/// maxima are rejected even when the snapshot is longer: newer wins, never
/// longer wins, which also shields against transient partial reads.
#[derive(Debug, Default)]
pub struct WatermarkGate {
    watermark: Option<DateTime<FixedOffset>>,
}

impl WatermarkGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watermark(&self) -> Option<DateTime<FixedOffset>> {
        self.watermark
    }

    /// Returns true when the candidate advances the watermark; the caller
    /// recomputes the derived set only in that case. Rejection is an
    /// expected, frequent condition, not an error.
    pub fn admit(&mut self, candidate: Option<DateTime<FixedOffset>>) -> bool {
        let Some(candidate) = candidate else {
            return false;
        };

        match self.watermark {
            Some(current) if candidate <= current => {
                debug!("snapshot rejected: max {candidate} does not advance watermark {current}");
                false
            }
            _ => {
                self.watermark = Some(candidate);
                true
            }
        }
    }
}
