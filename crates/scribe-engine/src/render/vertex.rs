use bytemuck::{Pod, Zeroable};

use crate::coords::Vec2;
use crate::paint::Color;

/// Vertex layout shared by every immediate-mode pipeline (32 bytes):
///
///  offset  0  position  [f32; 2]
///  offset  8  color     [f32; 4]
///  offset 24  uv        [f32; 2]
///
/// Shader locations are not fixed here; each program reports its own through
/// [`AttributeLocations`](super::shader::AttributeLocations).
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const POSITION_OFFSET: u64 = 0;
    pub const COLOR_OFFSET: u64 = 8;
    pub const UV_OFFSET: u64 = 24;
    pub const STRIDE: u64 = std::mem::size_of::<Vertex>() as u64;

    #[inline]
    pub fn new(position: Vec2, color: Color, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
            uv: uv.to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_match_repr_c_layout() {
        let v = Vertex::default();
        let base = &v as *const Vertex as usize;
        assert_eq!(v.position.as_ptr() as usize - base, Vertex::POSITION_OFFSET as usize);
        assert_eq!(v.color.as_ptr() as usize - base, Vertex::COLOR_OFFSET as usize);
        assert_eq!(v.uv.as_ptr() as usize - base, Vertex::UV_OFFSET as usize);
        assert_eq!(Vertex::STRIDE, 32);
    }
}
