//! Font loading, per-size glyph atlases and text layout.

mod atlas;
mod font;
pub mod layout;
mod packer;

pub use atlas::{
    clamp_font_size, estimate_atlas_side, oversample_for_size, FaceMetrics, FontAtlas, Glyph,
    MAX_FONT_SIZE, MIN_FONT_SIZE,
};
pub use font::{Font, FontError};
pub use layout::{measure, PlacedGlyph};
pub use packer::{PackRect, RectPacker};

/// DejaVu Sans Mono, bundled so hosts always have a face to fall back on.
pub const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");

#[cfg(test)]
pub(crate) fn test_font() -> Font {
    Font::load(BUNDLED_FONT).expect("bundled font parses")
}
