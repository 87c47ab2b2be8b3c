use crate::coords::Vec2;
use crate::render::backend::{RenderBackend, TextureDesc, TextureHandle};

use super::packer::RectPacker;

/// Smallest pixel size an atlas is built for.
pub const MIN_FONT_SIZE: u32 = 2;
/// Largest pixel size an atlas is built for.
pub const MAX_FONT_SIZE: u32 = 128;

/// Atlas sides are multiples of this, and grow by it when a pack overflows.
const SIDE_STEP: u32 = 128;
/// Sizes at or below this get a fixed `512 × oversample` atlas.
const SMALL_SIZE: u32 = 12;
const SMALL_SIDE: u32 = 512;
/// Gap left to the right of and below every packed glyph.
const GLYPH_PADDING: u32 = 1;

#[inline]
pub fn clamp_font_size(size: u32) -> u32 {
    size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// Rasterisation multiplier for a pixel size; applies to both axes.
pub fn oversample_for_size(size: u32) -> u32 {
    match size {
        0..=8 => 8,
        9..=12 => 4,
        13..=36 => 2,
        _ => 1,
    }
}

/// Font-unit measurements taken once when a face is loaded.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FaceMetrics {
    pub units_per_em: f32,
    pub ascent: f32,
    /// Negative below the baseline.
    pub descent: f32,
    pub line_gap: f32,
    /// Sum of the outline bounding-box areas of every mapped glyph.
    pub outline_area: f64,
}

impl FaceMetrics {
    /// Pixels per font unit for text `size` pixels tall, ascent to descent.
    pub fn pixel_scale(&self, size: u32) -> f32 {
        let extent = self.ascent - self.descent;
        if extent <= 0.0 {
            return size as f32 / self.units_per_em.max(1.0);
        }
        size as f32 / extent
    }
}

/// Square atlas side estimated from total outline area.
///
/// Small sizes use a fixed side. Larger sizes scale the raw area by the
/// oversampled pixel scale, add headroom that shrinks with size, and round
/// up to a multiple of 128.
pub fn estimate_atlas_side(size: u32, oversample: u32, metrics: &FaceMetrics) -> u32 {
    if size <= SMALL_SIZE {
        return SMALL_SIDE * oversample;
    }
    let os = oversample as f64;
    let scale = metrics.pixel_scale(size) as f64;
    let headroom = 1.0 + 1.0 / (size as f64).sqrt();
    let side = (metrics.outline_area * os * os * scale * scale * headroom).sqrt();
    let side = side.ceil().max(1.0) as u32;
    side.div_ceil(SIDE_STEP) * SIDE_STEP
}

/// Placement and metrics of one glyph inside an atlas.
///
/// The rect is in oversampled texels; every other field is in pixels at the
/// atlas size (already divided by the oversample factor).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Glyph {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
    pub width: f32,
    pub height: f32,
    /// Offset from the pen position to the bitmap's top-left, +Y down.
    pub bearing: Vec2,
    pub advance: f32,
}

impl Glyph {
    /// `true` when the glyph has a bitmap to draw.
    #[inline]
    pub fn has_ink(&self) -> bool {
        self.x1 > self.x0 && self.y1 > self.y0
    }
}

/// Rasterised glyph set for one pixel size.
#[derive(Debug)]
pub struct FontAtlas {
    size: u32,
    oversample: u32,
    width: u32,
    height: u32,
    glyphs: Vec<Glyph>,
    texture: TextureHandle,
    ascent: f32,
    descent: f32,
    line_gap: f32,
}

impl FontAtlas {
    /// Rasterises every mapped glyph at `size`, packs them and uploads the
    /// result as one R8 texture.
    pub(crate) fn build<B: RenderBackend + ?Sized>(
        face: &fontdue::Font,
        codepoints: &[Option<char>],
        metrics: &FaceMetrics,
        size: u32,
        backend: &mut B,
    ) -> Self {
        let bitmap = rasterize(face, codepoints, metrics, size, backend.max_texture_dimension());
        let texture = backend.create_texture_r8(&TextureDesc {
            label: &format!("font atlas {size}px"),
            width: bitmap.side,
            height: bitmap.side,
            pixels: &bitmap.pixels,
        });

        let scale = metrics.pixel_scale(size);
        log::debug!(
            "font atlas built: size={size}px oversample={} dims={}x{} glyphs={}",
            bitmap.oversample,
            bitmap.side,
            bitmap.side,
            bitmap.placed,
        );

        Self {
            size,
            oversample: bitmap.oversample,
            width: bitmap.side,
            height: bitmap.side,
            glyphs: bitmap.glyphs,
            texture,
            ascent: metrics.ascent * scale,
            descent: metrics.descent * scale,
            line_gap: metrics.line_gap * scale,
        }
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn oversample(&self) -> u32 {
        self.oversample
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    #[inline]
    pub fn ascent(&self) -> f32 {
        self.ascent
    }

    #[inline]
    pub fn descent(&self) -> f32 {
        self.descent
    }

    #[inline]
    pub fn line_gap(&self) -> f32 {
        self.line_gap
    }

    /// Glyph table indexed by glyph index.
    #[inline]
    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    #[inline]
    pub fn glyph(&self, index: u16) -> Option<&Glyph> {
        self.glyphs.get(index as usize)
    }

    /// Normalised texture coordinates of `glyph`'s top-left and bottom-right.
    pub fn uv_rect(&self, glyph: &Glyph) -> (Vec2, Vec2) {
        let w = self.width as f32;
        let h = self.height as f32;
        (
            Vec2::new(glyph.x0 as f32 / w, glyph.y0 as f32 / h),
            Vec2::new(glyph.x1 as f32 / w, glyph.y1 as f32 / h),
        )
    }

    /// GPU memory held by the atlas texture.
    #[inline]
    pub fn byte_size(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

// ── CPU side ──────────────────────────────────────────────────────────────

/// Packed coverage bitmap plus the glyph table that indexes into it.
pub(crate) struct AtlasBitmap {
    pub side: u32,
    pub oversample: u32,
    pub pixels: Vec<u8>,
    pub glyphs: Vec<Glyph>,
    pub placed: usize,
}

struct Raster {
    index: u16,
    metrics: fontdue::Metrics,
    coverage: Vec<u8>,
}

impl Raster {
    fn is_empty(&self) -> bool {
        self.metrics.width == 0 || self.metrics.height == 0
    }
}

pub(crate) fn rasterize(
    face: &fontdue::Font,
    codepoints: &[Option<char>],
    metrics: &FaceMetrics,
    size: u32,
    max_side: u32,
) -> AtlasBitmap {
    let oversample = oversample_for_size(size);
    let os = oversample as f32;
    let raster_px = metrics.pixel_scale(size) * metrics.units_per_em * os;

    // index 0 is .notdef
    let mut rasters: Vec<Raster> = codepoints
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, cp)| cp.is_some())
        .map(|(index, _)| {
            let index = index as u16;
            let (metrics, coverage) = face.rasterize_indexed(index, raster_px);
            Raster { index, metrics, coverage }
        })
        .collect();
    rasters.sort_by(|a, b| b.metrics.height.cmp(&a.metrics.height));

    let max_side = max_side.max(SIDE_STEP);
    let mut side = estimate_atlas_side(size, oversample, metrics).min(max_side);
    let placements = loop {
        let (placements, missed) = place(&rasters, side);
        if missed == 0 {
            break placements;
        }
        if side >= max_side {
            log::warn!(
                "font atlas {size}px: {missed} glyphs do not fit in {side}x{side}; they will not render"
            );
            break placements;
        }
        side = (side + SIDE_STEP).min(max_side);
    };

    let mut pixels = vec![0u8; side as usize * side as usize];
    let mut glyphs = vec![Glyph::default(); codepoints.len()];
    let mut placed = 0;

    for (raster, placement) in rasters.iter().zip(placements) {
        let m = &raster.metrics;
        let mut glyph = Glyph {
            bearing: Vec2::new(m.xmin as f32 / os, -(m.ymin as f32 + m.height as f32) / os),
            advance: m.advance_width / os,
            ..Glyph::default()
        };

        if let Some((x, y)) = placement.filter(|_| !raster.is_empty()) {
            let w = m.width as u32;
            let h = m.height as u32;
            blit(&mut pixels, side, x, y, w, &raster.coverage);
            glyph.x0 = x;
            glyph.y0 = y;
            glyph.x1 = x + w;
            glyph.y1 = y + h;
            glyph.width = m.width as f32 / os;
            glyph.height = m.height as f32 / os;
            placed += 1;
        }

        glyphs[raster.index as usize] = glyph;
    }

    AtlasBitmap {
        side,
        oversample,
        pixels,
        glyphs,
        placed,
    }
}

/// Packs every raster at `side`; returns per-raster placements and the miss count.
fn place(rasters: &[Raster], side: u32) -> (Vec<Option<(u32, u32)>>, usize) {
    let mut packer = RectPacker::new(side, side);
    let mut missed = 0;
    let placements = rasters
        .iter()
        .map(|raster| {
            if raster.is_empty() {
                return Some((0, 0));
            }
            let w = raster.metrics.width as u32 + GLYPH_PADDING;
            let h = raster.metrics.height as u32 + GLYPH_PADDING;
            let placement = packer.pack(w, h);
            if placement.is_none() {
                missed += 1;
            }
            placement
        })
        .collect();
    (placements, missed)
}

fn blit(dst: &mut [u8], dst_width: u32, x: u32, y: u32, w: u32, coverage: &[u8]) {
    let w = w as usize;
    for (row, src) in coverage.chunks_exact(w).enumerate() {
        let start = (y as usize + row) * dst_width as usize + x as usize;
        dst[start..start + w].copy_from_slice(src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> FaceMetrics {
        FaceMetrics {
            units_per_em: 2048.0,
            ascent: 1900.0,
            descent: -500.0,
            line_gap: 0.0,
            outline_area: 3.0e9,
        }
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp_font_size(0), MIN_FONT_SIZE);
        assert_eq!(clamp_font_size(1), 2);
        assert_eq!(clamp_font_size(64), 64);
        assert_eq!(clamp_font_size(500), 128);
    }

    #[test]
    fn oversample_bands() {
        assert_eq!(oversample_for_size(2), 8);
        assert_eq!(oversample_for_size(8), 8);
        assert_eq!(oversample_for_size(9), 4);
        assert_eq!(oversample_for_size(12), 4);
        assert_eq!(oversample_for_size(13), 2);
        assert_eq!(oversample_for_size(36), 2);
        assert_eq!(oversample_for_size(37), 1);
        assert_eq!(oversample_for_size(128), 1);
    }

    #[test]
    fn small_sizes_use_fixed_side() {
        let m = metrics();
        assert_eq!(estimate_atlas_side(8, 8, &m), 4096);
        assert_eq!(estimate_atlas_side(12, 4, &m), 2048);
    }

    #[test]
    fn estimated_side_is_multiple_of_step() {
        let m = metrics();
        for size in [13, 16, 24, 37, 64, 128] {
            let side = estimate_atlas_side(size, oversample_for_size(size), &m);
            assert!(side > 0 && side % SIDE_STEP == 0, "size {size}: {side}");
        }
    }

    #[test]
    fn estimate_grows_with_size() {
        let m = metrics();
        let a = estimate_atlas_side(40, 1, &m);
        let b = estimate_atlas_side(120, 1, &m);
        assert!(b > a);
    }

    #[test]
    fn zero_area_still_yields_one_step() {
        let m = FaceMetrics { outline_area: 0.0, ..metrics() };
        assert_eq!(estimate_atlas_side(64, 1, &m), SIDE_STEP);
    }

    #[test]
    fn blit_writes_rows_at_offset() {
        let mut dst = vec![0u8; 16];
        blit(&mut dst, 4, 1, 2, 2, &[1, 2, 3, 4]);
        assert_eq!(&dst[8..12], &[0, 1, 2, 0]);
        assert_eq!(&dst[12..16], &[0, 3, 4, 0]);
    }

    #[test]
    fn uv_rect_normalises_by_dimensions() {
        let atlas = FontAtlas {
            size: 16,
            oversample: 2,
            width: 256,
            height: 128,
            glyphs: Vec::new(),
            texture: TextureHandle(0),
            ascent: 0.0,
            descent: 0.0,
            line_gap: 0.0,
        };
        let glyph = Glyph { x0: 64, y0: 32, x1: 128, y1: 64, ..Glyph::default() };
        let (uv0, uv1) = atlas.uv_rect(&glyph);
        assert_eq!(uv0, Vec2::new(0.25, 0.25));
        assert_eq!(uv1, Vec2::new(0.5, 0.5));
    }
}
