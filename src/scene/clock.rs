//! Scene clock.
//!
//! One monotonically increasing elapsed time per mounted scene, advanced
//! once per render callback. The [`FrameTime`] it hands out is `Copy` and is
//! passed by value to every node in the frame, so siblings can never observe
//! different timestamps.

/// Timestamp shared by every subsystem within a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Seconds since mount
    pub elapsed: f32,
    /// Seconds since the previous frame
    pub delta: f32,
    /// Frame counter (first frame is 1)
    pub frame: u64,
}

impl FrameTime {
    /// A frame at an arbitrary elapsed time (replay / tests).
    pub fn at(elapsed: f32) -> Self {
        Self {
            elapsed,
            delta: 0.0,
            frame: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneClock {
    // accumulated in f64 so long sessions keep sub-millisecond resolution
    elapsed: f64,
    frame: u64,
}

impl SceneClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `dt` seconds and return the frame's timestamp.
    ///
    /// Negative or non-finite deltas advance by zero.
    pub fn tick(&mut self, dt: f32) -> FrameTime {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.elapsed += dt as f64;
        self.frame += 1;
        FrameTime {
            elapsed: self.elapsed as f32,
            delta: dt,
            frame: self.frame,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed as f32
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}
