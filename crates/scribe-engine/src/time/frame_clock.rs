use std::time::{Duration, Instant};

/// Shortest delta a tick reports.
const DT_MIN: Duration = Duration::from_micros(100);
/// Longest delta a tick reports; longer stalls (debugger, minimise) are cut.
const DT_MAX: Duration = Duration::from_millis(250);

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,
    pub now: Instant,
    pub frame_index: u64,
}

impl FrameTime {
    /// Instantaneous frame rate, `1 / dt`.
    #[inline]
    pub fn fps(&self) -> f32 {
        fps(self.dt)
    }
}

/// Frame rate for a delta of `dt` seconds; zero when `dt` is not positive.
#[inline]
pub fn fps(dt: f32) -> f32 {
    if dt > 0.0 { 1.0 / dt } else { 0.0 }
}

/// Monotonic delta-time source for the render loop.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(DT_MIN, DT_MAX)
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Advances the clock.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let time = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        time
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
