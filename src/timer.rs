//! Frame timing over host timestamps
//!
//! Timestamps are seconds from any monotonic host clock
//! (`performance.now() / 1000`, `Instant` offsets, ...). Time spent paused,
//! e.g. while the window is hidden, never shows up in a delta.

/// Active time since the last reset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTimer {
    start: f64,
    paused_at: Option<f64>,
    /// Paused time accumulated since `start`
    idle: f64,
}

impl FrameTimer {
    pub fn new(now: f64) -> Self {
        Self {
            start: now,
            paused_at: None,
            idle: 0.0,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn pause(&mut self, now: f64) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    pub fn resume(&mut self, now: f64) {
        if let Some(paused_at) = self.paused_at.take() {
            self.idle += (now - paused_at).max(0.0);
        }
    }

    /// Start a new frame; a paused timer stays paused from `now`
    pub fn reset(&mut self, now: f64) {
        self.start = now;
        self.idle = 0.0;
        if self.paused_at.is_some() {
            self.paused_at = Some(now);
        }
    }

    /// Seconds of active time since the last reset
    pub fn delta(&self, now: f64) -> f32 {
        let end = self.paused_at.unwrap_or(now);
        (end - self.start - self.idle).max(0.0) as f32
    }

    /// Delta for this frame, then reset for the next one
    pub fn tick(&mut self, now: f64) -> f32 {
        let delta = self.delta(now);
        self.reset(now);
        delta
    }
}

/// Bound a frame delta to `[0, max]`; garbage deltas become 0
pub fn clamp_frame_delta(dt: f32, max: f32) -> f32 {
    if dt.is_nan() {
        return 0.0;
    }
    dt.clamp(0.0, max)
}
