//! Frame pacing.
//!
//! Engines are driven by the host calling `tick` with a timestamp
//! as often as it likes (typically once per display refresh).
//! The [`FrameClock`] decides which of those ticks produce a frame.

/// Decides whether a tick should produce a frame, given a target frame rate.
///
/// Timestamps are milliseconds on an arbitrary monotonic timeline
/// chosen by the host.
#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    last_frame_time: f64,
    frame_interval: f64,
}

impl FrameClock {
    /// Create a clock targeting the given frame rate.
    ///
    /// Non-positive or non-finite rates fall back to 60.
    pub fn new(fps: f64) -> Self {
        Self {
            last_frame_time: 0.0,
            frame_interval: interval_for(fps),
        }
    }

    /// Change the target frame rate.
    /// The phase of the clock is preserved.
    pub fn set_fps(&mut self, fps: f64) {
        self.frame_interval = interval_for(fps);
    }

    /// Minimum time in milliseconds between two frames.
    #[inline]
    pub fn frame_interval(&self) -> f64 {
        self.frame_interval
    }

    /// Timestamp of the last accepted frame.
    #[inline]
    pub fn last_frame_time(&self) -> f64 {
        self.last_frame_time
    }

    /// Restart the clock so that the next frame is due
    /// one interval after `now`.
    pub fn reset(&mut self, now: f64) {
        self.last_frame_time = now;
    }

    /// Check whether a frame is due at `now`.
    ///
    /// Returns the time elapsed since the previous frame if it is.
    /// The clock is then advanced phase-locked:
    /// the remainder of the elapsed time past a whole interval is kept,
    /// so that frame times don't drift when ticks arrive at a rate
    /// that isn't a multiple of the target frame rate.
    pub fn advance(&mut self, now: f64) -> Option<f64> {
        let elapsed = now - self.last_frame_time;
        if elapsed < self.frame_interval {
            return None;
        }
        self.last_frame_time = now - elapsed % self.frame_interval;
        Some(elapsed)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(60.0)
    }
}

fn interval_for(fps: f64) -> f64 {
    let fps = if fps.is_finite() && fps > 0.0 { fps } else { 60.0 };
    1000.0 / fps
}
