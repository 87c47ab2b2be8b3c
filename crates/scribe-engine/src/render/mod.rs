//! Immediate-mode rendering.
//!
//! Conventions:
//! - callers work in window pixels, top-left origin, +Y down
//! - the batch stores Y negated; the transform block maps that back to clip space
//! - every GPU call goes through a [`RenderBackend`]

pub mod backend;
mod batch;
mod overlay;
mod renderer;
pub mod shader;
mod stats;
mod transform;
mod vertex;

pub use backend::{
    HeadlessBackend, ProgramHandle, RenderBackend, TextureHandle, WgpuBackend,
};
pub use batch::{GeometryBatch, DEFAULT_BATCH_CAPACITY};
pub use overlay::{draw_overlay, overlay_text};
pub use renderer::{Renderer, RendererConfig, FONT_SHADER, SOLID_SHAPE_SHADER};
pub use shader::{ProgramId, ShaderError, ShaderRegistry};
pub use stats::FrameStats;
pub use transform::{TransformState, TransformUniform, FAR_PLANE, NEAR_PLANE};
pub use vertex::Vertex;
