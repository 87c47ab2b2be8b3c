use std::collections::BTreeMap;
use std::fmt;

use crate::coords::Vec2;
use crate::render::backend::RenderBackend;

use super::atlas::{clamp_font_size, FaceMetrics, FontAtlas, Glyph};
use super::layout;

/// Highest Unicode scalar value probed when building the codepoint table.
const MAX_CODEPOINT: u32 = 0x10FFFF;

/// Error returned by [`Font::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontError {
    /// fontdue rejected the data.
    Parse(String),
    /// The face maps no codepoint to any glyph.
    NoGlyphs,
    /// The face has no horizontal `hhea`/`OS/2` metrics.
    MissingLineMetrics,
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontError::Parse(msg) => write!(f, "font parse error: {msg}"),
            FontError::NoGlyphs => f.write_str("font has no mapped glyphs"),
            FontError::MissingLineMetrics => f.write_str("font has no horizontal line metrics"),
        }
    }
}

impl std::error::Error for FontError {}

/// A parsed face plus one lazily built atlas per pixel size.
///
/// Atlases are never evicted. Packing a size also makes it the active size,
/// which is the one glyph lookup and layout read from.
pub struct Font {
    face: fontdue::Font,
    /// Glyph index to the first codepoint that maps to it.
    codepoints: Vec<Option<char>>,
    metrics: FaceMetrics,
    atlases: BTreeMap<u32, FontAtlas>,
    active_size: Option<u32>,
}

impl Font {
    /// Parses a TrueType/OpenType face and indexes its codepoints.
    ///
    /// The caller keeps ownership of `bytes`.
    pub fn load(bytes: &[u8]) -> Result<Self, FontError> {
        let face = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontError::Parse(e.to_string()))?;

        let units_per_em = face.units_per_em();
        // line metrics at 1px per unit come back in font units
        let line = face
            .horizontal_line_metrics(units_per_em)
            .ok_or(FontError::MissingLineMetrics)?;

        let codepoints = codepoint_table(&face);
        let mapped = codepoints.iter().filter(|cp| cp.is_some()).count();
        if mapped == 0 {
            return Err(FontError::NoGlyphs);
        }

        let outline_area = outline_area(&face, 0..face.glyph_count());

        log::debug!(
            "font loaded: {} glyphs, {mapped} mapped, units_per_em={units_per_em}",
            face.glyph_count()
        );

        Ok(Self {
            face,
            codepoints,
            metrics: FaceMetrics {
                units_per_em,
                ascent: line.ascent,
                descent: line.descent,
                line_gap: line.line_gap,
                outline_area,
            },
            atlases: BTreeMap::new(),
            active_size: None,
        })
    }

    #[inline]
    pub fn glyph_count(&self) -> usize {
        self.codepoints.len()
    }

    /// Codepoint that resolves to `glyph_index`, if any.
    #[inline]
    pub fn codepoint(&self, glyph_index: u16) -> Option<char> {
        self.codepoints.get(glyph_index as usize).copied().flatten()
    }

    #[inline]
    pub fn metrics(&self) -> &FaceMetrics {
        &self.metrics
    }

    /// Builds the atlas for `size` (clamped to 2..=128) unless it already
    /// exists, and makes it active.
    pub fn pack<B: RenderBackend + ?Sized>(&mut self, size: u32, backend: &mut B) -> &FontAtlas {
        let size = clamp_font_size(size);
        self.active_size = Some(size);
        self.atlases.entry(size).or_insert_with(|| {
            FontAtlas::build(&self.face, &self.codepoints, &self.metrics, size, backend)
        })
    }

    #[inline]
    pub fn active_size(&self) -> Option<u32> {
        self.active_size
    }

    pub fn active_atlas(&self) -> Option<&FontAtlas> {
        self.active_size.and_then(|size| self.atlases.get(&size))
    }

    pub fn atlas_count(&self) -> usize {
        self.atlases.len()
    }

    /// Total texel bytes held by every atlas.
    pub fn atlas_bytes(&self) -> usize {
        self.atlases.values().map(FontAtlas::byte_size).sum()
    }

    /// Glyph for `ch` in the active atlas.
    ///
    /// `None` when no atlas is active or the face has no glyph for `ch`.
    pub fn find_glyph(&self, ch: char) -> Option<&Glyph> {
        let atlas = self.active_atlas()?;
        let index = self.face.lookup_glyph_index(ch);
        if index == 0 {
            return None;
        }
        atlas.glyph(index)
    }

    /// Size of `text` laid out at `pixel_height` against the active atlas.
    pub fn measure(&self, text: &str, pixel_height: f32) -> Vec2 {
        layout::measure(self, text, pixel_height)
    }
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font")
            .field("glyph_count", &self.codepoints.len())
            .field("metrics", &self.metrics)
            .field("atlas_sizes", &self.atlases.keys().collect::<Vec<_>>())
            .field("active_size", &self.active_size)
            .finish()
    }
}

/// Sum of the outline bounding-box areas of `glyphs`, in font units.
fn outline_area(face: &fontdue::Font, glyphs: impl Iterator<Item = u16>) -> f64 {
    let units_per_em = face.units_per_em();
    glyphs
        .map(|index| {
            let bounds = face.metrics_indexed(index, units_per_em).bounds;
            bounds.width as f64 * bounds.height as f64
        })
        .sum()
}

/// Probes the whole codepoint space and records, per glyph index, the first
/// codepoint that resolves to it. Index 0 is never assigned.
fn codepoint_table(face: &fontdue::Font) -> Vec<Option<char>> {
    let mut table = vec![None; face.glyph_count() as usize];
    for ch in (0..=MAX_CODEPOINT).filter_map(char::from_u32) {
        let index = face.lookup_glyph_index(ch) as usize;
        if index == 0 {
            continue;
        }
        if let Some(slot @ None) = table.get_mut(index) {
            *slot = Some(ch);
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::HeadlessBackend;
    use crate::text::test_font;

    #[test]
    fn rejects_garbage() {
        let err = Font::load(&[0u8; 64]).unwrap_err();
        assert!(matches!(err, FontError::Parse(_)));
    }

    #[test]
    fn codepoint_table_maps_ascii() {
        let font = test_font();
        let index = font.face.lookup_glyph_index('A');
        assert_ne!(index, 0);
        assert_eq!(font.codepoint(index), Some('A'));
        assert_eq!(font.codepoint(0), None);
        assert!(font.metrics().outline_area > 0.0);
    }

    #[test]
    fn outline_area_counts_unmapped_glyphs() {
        let font = test_font();
        let count = font.face.glyph_count();
        let mapped = outline_area(&font.face, (0..count).filter(|&i| font.codepoint(i).is_some()));
        let unmapped = outline_area(&font.face, (0..count).filter(|&i| font.codepoint(i).is_none()));

        // .notdef alone has an outline and no codepoint
        assert!(unmapped > 0.0);
        let total = font.metrics().outline_area;
        assert!((total - (mapped + unmapped)).abs() <= total * 1e-9);
        assert!(total > mapped);
    }

    #[test]
    fn no_glyphs_before_pack() {
        let font = test_font();
        assert!(font.active_atlas().is_none());
        assert!(font.find_glyph('A').is_none());
    }

    #[test]
    fn pack_is_idempotent() {
        let mut font = test_font();
        let mut backend = HeadlessBackend::new();

        let first = font.pack(16, &mut backend).glyphs().to_vec();
        assert_eq!(backend.textures().len(), 1);

        let second = font.pack(16, &mut backend).glyphs().to_vec();
        assert_eq!(backend.textures().len(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn pack_clamps_size() {
        let mut font = test_font();
        let mut backend = HeadlessBackend::new();

        assert_eq!(font.pack(1, &mut backend).size(), 2);
        font.pack(2, &mut backend);
        assert_eq!(backend.textures().len(), 1);

        assert_eq!(font.pack(500, &mut backend).size(), 128);
        font.pack(128, &mut backend);
        assert_eq!(backend.textures().len(), 2);
        assert_eq!(font.atlas_count(), 2);
    }

    #[test]
    fn pack_switches_active_size() {
        let mut font = test_font();
        let mut backend = HeadlessBackend::new();
        font.pack(16, &mut backend);
        font.pack(40, &mut backend);
        assert_eq!(font.active_size(), Some(40));
        font.pack(16, &mut backend);
        assert_eq!(font.active_size(), Some(16));
        assert_eq!(backend.textures().len(), 2);
    }

    #[test]
    fn size_16_atlas_dimensions() {
        let mut font = test_font();
        let mut backend = HeadlessBackend::new();
        let atlas = font.pack(16, &mut backend);

        assert_eq!(atlas.oversample(), 2);
        assert!(atlas.ascent() > 0.0 && atlas.descent() < 0.0);
        assert!((atlas.ascent() - atlas.descent() - 16.0).abs() < 1e-3);
        assert!(atlas.width() > 0 && atlas.width() % 128 == 0);
        assert!(atlas.height() > 0 && atlas.height() % 128 == 0);

        let texture = &backend.textures()[0];
        assert_eq!((texture.width, texture.height), (atlas.width(), atlas.height()));
        assert!(texture.coverage > 0);
        assert_eq!(font.atlas_bytes(), (atlas_side(&font) * atlas_side(&font)) as usize);
    }

    fn atlas_side(font: &Font) -> u32 {
        font.active_atlas().map_or(0, FontAtlas::width)
    }

    #[test]
    fn printable_ascii_has_glyphs() {
        let mut font = test_font();
        let mut backend = HeadlessBackend::new();
        let atlas_width = font.pack(16, &mut backend).width();

        for ch in (0x21u8..0x7F).map(char::from) {
            let glyph = font.find_glyph(ch).unwrap_or_else(|| panic!("no glyph for {ch:?}"));
            assert!(glyph.width >= 0.0 && glyph.height >= 0.0, "{ch:?}");
            assert!(glyph.has_ink(), "{ch:?} was not packed");
            assert!(glyph.x1 <= atlas_width, "{ch:?}");
            assert!(glyph.advance > 0.0, "{ch:?}");
        }

        let space = font.find_glyph(' ').unwrap();
        assert!(!space.has_ink());
        assert!(space.advance > 0.0);
    }

    #[test]
    fn glyph_metrics_are_oversample_corrected() {
        let mut font = test_font();
        let mut backend = HeadlessBackend::new();
        let atlas = font.pack(16, &mut backend);
        let os = atlas.oversample() as f32;

        let index = font.face.lookup_glyph_index('M');
        let glyph = font.find_glyph('M').unwrap();
        assert_eq!(glyph.width, (glyph.x1 - glyph.x0) as f32 / os);
        assert_eq!(glyph.height, (glyph.y1 - glyph.y0) as f32 / os);
        // cap height sits above the baseline
        assert!(glyph.bearing.y < 0.0);
        assert!(glyph.height <= 16.0);
        assert_eq!(font.codepoint(index), Some('M'));
    }
}
