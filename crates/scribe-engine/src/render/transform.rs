use bytemuck::{Pod, Zeroable};

use crate::coords::{Mat4, Vec2, Viewport};

/// Near/far planes of the screen-space projection.
pub const NEAR_PLANE: f32 = -1.0;
pub const FAR_PLANE: f32 = 1.0;

/// Uniform block layout shared with the GLSL `Transform` block (128 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TransformUniform {
    pub world_to_view: Mat4,
    pub view_to_projection: Mat4,
}

/// View and projection matrices for screen-space drawing.
///
/// Geometry reaches the GPU in world space with Y already negated by the
/// batch, so window pixel `(x, y)` is world `(x, -y)`. The view matrix shifts
/// that so the window's top-left sits at `(-w/2, +h/2)` in view space, and the
/// orthographic projection maps a `w × h` box centred on the origin onto clip
/// space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TransformState {
    world_to_view: Mat4,
    view_to_projection: Mat4,
}

impl TransformState {
    pub fn new() -> Self {
        Self {
            world_to_view: Mat4::IDENTITY,
            view_to_projection: Mat4::IDENTITY,
        }
    }

    /// Rebuilds both matrices for a window of `viewport` size.
    ///
    /// Returns `false` (and leaves the matrices alone) for a zero or
    /// non-finite size, which is what a minimised window reports.
    pub fn set_viewport_projection(&mut self, viewport: Viewport) -> bool {
        if !viewport.is_valid() {
            return false;
        }
        let half_height = viewport.height / 2.0;
        self.view_to_projection =
            Mat4::ortho(half_height, viewport.aspect(), NEAR_PLANE, FAR_PLANE);
        self.world_to_view = Mat4::translate(Vec2::new(-viewport.width / 2.0, half_height));
        true
    }

    #[inline]
    pub fn world_to_view(&self) -> Mat4 {
        self.world_to_view
    }

    #[inline]
    pub fn view_to_projection(&self) -> Mat4 {
        self.view_to_projection
    }

    #[inline]
    pub fn uniform(&self) -> TransformUniform {
        TransformUniform {
            world_to_view: self.world_to_view,
            view_to_projection: self.view_to_projection,
        }
    }
}

impl Default for TransformState {
    fn default() -> Self {
        Self::new()
    }
}
