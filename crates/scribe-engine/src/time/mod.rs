//! Frame timing.
//!
//! One [`FrameClock`] per render loop; `tick()` once per presented frame. Its
//! `dt` feeds the overlay's FPS readout.

mod frame_clock;

pub use frame_clock::{fps, FrameClock, FrameTime};
