//! Cursor walk shared by measurement and emission.
//!
//! Coordinates are window pixels, +Y down. The pen starts one line below the
//! origin (minus the scaled line gap) so the first line's ascenders sit just
//! under `origin.y`. All glyph metrics are scaled by
//! `pixel_height / active_size`, so one atlas serves any requested height.

use crate::coords::Vec2;

use super::atlas::Glyph;
use super::font::Font;

/// Tab stops are this many space advances wide.
const TAB_WIDTH: f32 = 4.0;

/// One drawable glyph positioned in window pixels.
#[derive(Debug, Copy, Clone)]
pub struct PlacedGlyph<'a> {
    pub ch: char,
    pub glyph: &'a Glyph,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// Walks `text` from `origin`, calling `visit` for every glyph with ink.
///
/// Returns the extent reached relative to `origin`: the furthest pen or glyph
/// right edge, and the lowest glyph bottom. A glyph whose left bearing would
/// put ink left of `origin.x` shifts the pen right instead, so every glyph lies
/// in `origin.x..=origin.x + extent.x`. Characters the face cannot resolve are
/// skipped without advancing. With no active atlas nothing is visited and
/// the extent is zero.
pub fn walk<'a>(
    font: &'a Font,
    text: &str,
    origin: Vec2,
    pixel_height: f32,
    mut visit: impl FnMut(&PlacedGlyph<'a>),
) -> Vec2 {
    let Some(atlas) = font.active_atlas() else {
        return Vec2::zero();
    };

    let ratio = pixel_height / atlas.size() as f32;
    let tab = font.find_glyph(' ').map_or(0.0, |g| g.advance) * ratio * TAB_WIDTH;

    let mut x = 0.0f32;
    let mut y = pixel_height - atlas.line_gap() * ratio;
    let mut extent = Vec2::zero();

    for ch in text.chars() {
        match ch {
            '\n' => {
                x = 0.0;
                y += pixel_height;
                continue;
            }
            '\t' => {
                x += tab;
                extent.x = extent.x.max(x);
                continue;
            }
            _ => {}
        }

        let Some(glyph) = font.find_glyph(ch) else {
            continue;
        };

        let mut x0 = x + glyph.bearing.x * ratio;
        if x0 < 0.0 {
            // left overhang pushes the pen so ink never starts before the origin
            x -= x0;
            x0 = 0.0;
        }
        let y0 = y + glyph.bearing.y * ratio;
        let x1 = x0 + glyph.width * ratio;
        let y1 = y0 + glyph.height * ratio;

        x += glyph.advance * ratio;
        extent = extent.max(Vec2::new(x.max(x1), y1));

        if glyph.has_ink() && !ch.is_whitespace() && !ch.is_control() {
            visit(&PlacedGlyph {
                ch,
                glyph,
                x0: origin.x + x0,
                y0: origin.y + y0,
                x1: origin.x + x1,
                y1: origin.y + y1,
            });
        }
    }

    extent
}

/// Extent of `text` at `pixel_height`. Pure read.
pub fn measure(font: &Font, text: &str, pixel_height: f32) -> Vec2 {
    walk(font, text, Vec2::zero(), pixel_height, |_| {})
}
