//! GPU seam.
//!
//! The batcher, shader registry and font cache never call a graphics API
//! directly; they go through [`RenderBackend`]. [`WgpuBackend`] renders for
//! real, [`HeadlessBackend`] records what would have been sent.

mod headless;
mod wgpu_backend;

pub use headless::{HeadlessBackend, RecordedDraw, RecordedProgram, RecordedTexture};
pub use wgpu_backend::WgpuBackend;

use crate::paint::Color;

use super::shader::{ProgramLayout, ShaderError};
use super::transform::TransformUniform;
use super::vertex::Vertex;

/// Backend-side linked program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramHandle(pub u32);

/// Backend-side texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureHandle(pub u32);

/// Input to [`RenderBackend::create_program`].
#[derive(Debug, Copy, Clone)]
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub vertex_source: &'a str,
    pub fragment_source: &'a str,
    pub layout: &'a ProgramLayout,
}

/// Single-channel (R8) texture upload, rows tightly packed.
#[derive(Debug, Copy, Clone)]
pub struct TextureDesc<'a> {
    pub label: &'a str,
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
}

/// One flush of the immediate-mode batch.
#[derive(Debug, Copy, Clone)]
pub struct DrawCall<'a> {
    pub program: ProgramHandle,
    /// `None` when the program samples nothing.
    pub texture: Option<TextureHandle>,
    /// Triangle list.
    pub vertices: &'a [Vertex],
}

pub trait RenderBackend {
    /// Compiles both stages and links them.
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramHandle, ShaderError>;

    /// Creates and fills an R8 texture sampled with linear filtering.
    fn create_texture_r8(&mut self, desc: &TextureDesc<'_>) -> TextureHandle;

    /// Largest texture side the backend accepts.
    fn max_texture_dimension(&self) -> u32;

    /// Uploads the transform block of `program`.
    fn set_transform(&mut self, program: ProgramHandle, transform: &TransformUniform);

    /// Clears the current frame target.
    fn clear(&mut self, color: Color);

    /// Uploads `call.vertices` and draws them as triangles.
    fn draw(&mut self, call: &DrawCall<'_>);
}
