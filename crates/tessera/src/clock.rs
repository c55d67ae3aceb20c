//! # Frame Clock
//!
//! Frame time, delta time and frames per second.
//!
//! Time is a `u32` millisecond counter that may wrap. With a locked delta
//! the clock advances by exactly that much per frame regardless of real
//! time, which keeps runs reproducible. Otherwise the delta is measured and
//! capped at [`MAX_DT`] so a stall or a counter wrap never produces a huge
//! step.

use crate::config::ClockConfig;

/// Milliseconds since start.
pub type Millis = u32;

/// Largest measured delta, in seconds.
pub const MAX_DT: f32 = 0.1;

/// Frame timing state.
#[derive(Clone, Debug)]
pub struct Clock {
    interval_ms: Millis,
    locked_dt_ms: Millis,
    frames_since_fps: u32,
    last_fps_ms: Millis,
    prev_ms: Millis,
    ms: Millis,
    dt: f32,
    fps: u32,
}

impl Clock {
    /// Creates a clock starting at `now_ms`.
    #[must_use]
    pub fn new(now_ms: Millis, config: &ClockConfig) -> Self {
        let locked = config.locked_dt_ms;
        Self {
            interval_ms: config.fps_interval_ms,
            locked_dt_ms: locked,
            frames_since_fps: 0,
            last_fps_ms: now_ms,
            prev_ms: now_ms,
            ms: if locked > 0 { 0 } else { now_ms },
            dt: if locked > 0 { 0.001 * locked as f32 } else { 0.0 },
            fps: 0,
        }
    }

    /// Advances to a new frame at real time `now_ms`.
    ///
    /// Returns true when a new frames-per-second value was computed.
    pub fn on_frame(&mut self, now_ms: Millis) -> bool {
        if self.locked_dt_ms > 0 {
            self.ms = self.ms.wrapping_add(self.locked_dt_ms);
        } else {
            self.ms = now_ms;
            self.dt = (0.001 * now_ms.wrapping_sub(self.prev_ms) as f32).min(MAX_DT);
            self.prev_ms = now_ms;
        }

        self.frames_since_fps += 1;
        if self.interval_ms == 0 {
            return false;
        }
        let elapsed = now_ms.wrapping_sub(self.last_fps_ms);
        if elapsed >= self.interval_ms {
            self.fps = self.frames_since_fps * 1000 / elapsed;
            self.frames_since_fps = 0;
            self.last_fps_ms = now_ms;
            return true;
        }
        false
    }

    /// Game time of the current frame.
    #[inline]
    #[must_use]
    pub const fn ms(&self) -> Millis {
        self.ms
    }

    /// Seconds since the previous frame.
    #[inline]
    #[must_use]
    pub const fn dt(&self) -> f32 {
        self.dt
    }

    /// Frames per second over the last interval.
    #[inline]
    #[must_use]
    pub const fn fps(&self) -> u32 {
        self.fps
    }
}
