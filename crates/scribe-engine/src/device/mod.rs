//! GPU device + surface management.
//!
//! Creates the wgpu device/queue, configures the window surface and hands out
//! surface textures. Drawing is done by the render backend.

mod gpu;

pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
