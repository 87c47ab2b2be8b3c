//! Scribe engine crate.
//!
//! An immediate-mode 2D batcher with per-size font atlases, plus the winit +
//! wgpu runtime that hosts it.

pub mod assets;
pub mod coords;
pub mod core;
pub mod device;
pub mod logging;
pub mod paint;
pub mod render;
pub mod text;
pub mod time;
pub mod window;
