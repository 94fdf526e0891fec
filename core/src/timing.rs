//! Frame timing
//!
//! Delta computation between scheduler ticks. Timestamps arrive in
//! milliseconds from the host scheduler; deltas are handed to the cartridge
//! in seconds.

/// Per-driver timing state.
///
/// The previous timestamp is unset before the first tick, so the first
/// delta is exactly zero. The bookkeeping runs on every tick whether the
/// driver is running or paused; keeping the timestamp fresh during pause
/// means resuming never produces a delta spike.
#[derive(Debug, Default)]
pub struct FrameTiming {
    previous_ms: Option<f64>,
}

impl FrameTiming {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `timestamp_ms` and return the elapsed time since the previous
    /// tick in seconds, clamped to be non-negative.
    pub fn advance(&mut self, timestamp_ms: f64) -> f32 {
        let delta = match self.previous_ms {
            Some(previous) => ((timestamp_ms - previous) * 0.001).max(0.0) as f32,
            None => 0.0,
        };
        self.previous_ms = Some(timestamp_ms);
        delta
    }

    /// Timestamp of the previous tick, if any tick has happened.
    pub fn previous_ms(&self) -> Option<f64> {
        self.previous_ms
    }
}
