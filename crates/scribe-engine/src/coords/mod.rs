//! Coordinate and geometry types shared by the batcher and text layout.
//!
//! Canonical CPU space:
//! - window pixels
//! - origin top-left
//! - +X right, +Y down
//!
//! The batch negates Y on insertion; the transform state maps the result to
//! clip space.

mod mat4;
mod vec2;
mod viewport;

pub use mat4::Mat4;
pub use vec2::Vec2;
pub use viewport::Viewport;
