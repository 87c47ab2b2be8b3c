use bytemuck::{Pod, Zeroable};

use super::Vec2;

/// Column-major 4×4 matrix, laid out the way GLSL `mat4` uniforms expect.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// 2D translation.
    pub const fn translate(offset: Vec2) -> Mat4 {
        Mat4 {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [offset.x, offset.y, 0.0, 1.0],
            ],
        }
    }

    /// Symmetric orthographic projection.
    ///
    /// `size` is the half-height of the visible volume; the half-width is
    /// `size * aspect`. Depth is mapped linearly from `[near, far]` to the
    /// `[0, 1]` clip range wgpu uses.
    pub fn ortho(size: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let depth = far - near;
        Mat4 {
            cols: [
                [1.0 / (size * aspect), 0.0, 0.0, 0.0],
                [0.0, 1.0 / size, 0.0, 0.0],
                [0.0, 0.0, 1.0 / depth, 0.0],
                [0.0, 0.0, -near / depth, 1.0],
            ],
        }
    }

    /// Transforms a point on the z = 0 plane, ignoring the w divide
    /// (all matrices built here are affine).
    #[cfg(test)]
    pub(crate) fn transform_point(&self, p: Vec2) -> Vec2 {
        let c = &self.cols;
        Vec2::new(
            c[0][0] * p.x + c[1][0] * p.y + c[3][0],
            c[0][1] * p.x + c[1][1] * p.y + c[3][1],
        )
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Mat4::IDENTITY
    }
}

#[cfg(test)]
impl core::ops::Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = [[0.0f32; 4]; 4];
        for (col, out_col) in out.iter_mut().enumerate() {
            for (row, cell) in out_col.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.cols[k][row] * rhs.cols[col][k]).sum();
            }
        }
        Mat4 { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-5 && (a.y - b.y).abs() < 1e-5
    }

    #[test]
    fn identity_is_neutral() {
        let t = Mat4::translate(Vec2::new(3.0, -4.0));
        assert_eq!(Mat4::IDENTITY * t, t);
        assert_eq!(t * Mat4::IDENTITY, t);
    }

    #[test]
    fn translate_moves_points() {
        let t = Mat4::translate(Vec2::new(3.0, -4.0));
        assert_eq!(t.transform_point(Vec2::new(1.0, 1.0)), Vec2::new(4.0, -3.0));
    }

    #[test]
    fn ortho_maps_extents_to_unit_square() {
        let p = Mat4::ortho(50.0, 2.0, -1.0, 1.0);
        assert!(approx(p.transform_point(Vec2::new(100.0, 50.0)), Vec2::new(1.0, 1.0)));
        assert!(approx(p.transform_point(Vec2::new(-100.0, -50.0)), Vec2::new(-1.0, -1.0)));
    }

    #[test]
    fn product_applies_right_operand_first() {
        let a = Mat4::translate(Vec2::new(1.0, 0.0));
        let s = Mat4::ortho(2.0, 1.0, -1.0, 1.0);
        let p = (s * a).transform_point(Vec2::new(1.0, 2.0));
        assert!(approx(p, Vec2::new(1.0, 1.0)));
    }
}
