//! Window + runtime loop.
//!
//! Owns the `winit` event loop and the single host window, and wires them to
//! the GPU layer and the renderer.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
