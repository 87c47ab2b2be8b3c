use anyhow::Context;

use crate::coords::{Vec2, Viewport};
use crate::paint::Color;
use crate::text::{layout, Font, FontAtlas};

use super::backend::{DrawCall, RenderBackend, TextureHandle};
use super::batch::{GeometryBatch, DEFAULT_BATCH_CAPACITY};
use super::overlay;
use super::shader::{ProgramId, ShaderError, ShaderRegistry};
use super::stats::FrameStats;
use super::transform::TransformState;

/// Built-in program for untextured geometry.
pub const SOLID_SHAPE_SHADER: &str = include_str!("shaders/solid_shape.glsl");
/// Built-in program for atlas-sampled text.
pub const FONT_SHADER: &str = include_str!("shaders/font.glsl");

/// Vertices emitted per glyph or rect.
const QUAD_VERTICES: u32 = 6;

/// Renderer construction parameters.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Vertices held by the immediate-mode batch before it flushes itself.
    ///
    /// Rounded up to a multiple of 3 (at least 3) so an implicit flush never
    /// splits a triangle; [`GeometryBatch::capacity`] reports the value in use.
    pub batch_capacity: usize,
    /// Color used by [`Renderer::frame_begin`].
    pub clear_color: Color,
    /// Draw the stats overlay in [`Renderer::frame_end`].
    pub overlay: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            batch_capacity: DEFAULT_BATCH_CAPACITY,
            clear_color: Color::from_hex_rgb(0x1E1E1E),
            overlay: true,
        }
    }
}

/// Immediate-mode renderer.
///
/// Owns everything the draw path mutates: the vertex batch, the transform
/// matrices, the program registry with its current binding, the per-frame
/// counters and the backend. Fonts stay with the caller and are passed in
/// per call.
///
/// Drawing follows a bind / refresh / begin / emit / flush rhythm:
///
/// ```ignore
/// renderer.bind_shader(renderer.solid_program());
/// renderer.refresh_transformation();
/// renderer.immediate_begin();
/// renderer.immediate_quad(10.0, 10.0, 50.0, 30.0, Color::WHITE);
/// renderer.immediate_flush();
/// ```
///
/// [`draw_rect`](Self::draw_rect) and [`draw_string`](Self::draw_string) wrap
/// that sequence.
pub struct Renderer<B: RenderBackend> {
    backend: B,
    config: RendererConfig,
    batch: GeometryBatch,
    transform: TransformState,
    shaders: ShaderRegistry,
    solid_program: ProgramId,
    font_program: ProgramId,
    texture: Option<TextureHandle>,
    stats: FrameStats,
    viewport: Viewport,
    warned_no_atlas: bool,
}

impl<B: RenderBackend> Renderer<B> {
    /// Loads the built-in programs and sizes the projection to `viewport`.
    ///
    /// Fails if either built-in program does not compile or link.
    pub fn new(mut backend: B, viewport: Viewport, config: RendererConfig) -> anyhow::Result<Self> {
        let mut shaders = ShaderRegistry::new();
        let solid_program = shaders
            .load(&mut backend, "solid_shape", SOLID_SHAPE_SHADER)
            .context("failed to build the solid shape program")?;
        let font_program = shaders
            .load(&mut backend, "font", FONT_SHADER)
            .context("failed to build the font program")?;

        let mut transform = TransformState::new();
        if !transform.set_viewport_projection(viewport) {
            log::warn!("Renderer::new: invalid initial viewport {viewport:?}");
        }

        Ok(Self {
            backend,
            batch: GeometryBatch::with_capacity(config.batch_capacity),
            config,
            transform,
            shaders,
            solid_program,
            font_program,
            texture: None,
            stats: FrameStats::default(),
            viewport,
            warned_no_atlas: false,
        })
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    #[inline]
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    #[inline]
    pub fn shaders(&self) -> &ShaderRegistry {
        &self.shaders
    }

    #[inline]
    pub fn batch(&self) -> &GeometryBatch {
        &self.batch
    }

    #[inline]
    pub fn solid_program(&self) -> ProgramId {
        self.solid_program
    }

    #[inline]
    pub fn font_program(&self) -> ProgramId {
        self.font_program
    }

    // ── programs and transforms ───────────────────────────────────────────

    /// Compiles a single-file program. See [`ShaderRegistry::load`].
    pub fn load_shader(&mut self, label: &str, source: &str) -> Result<ProgramId, ShaderError> {
        self.shaders.load(&mut self.backend, label, source)
    }

    pub fn bind_shader(&mut self, id: ProgramId) {
        self.shaders.bind(id);
    }

    /// Rebuilds the projection for a new window size and refreshes the bound
    /// program. A zero size (minimised window) is ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        let viewport = Viewport::new(width as f32, height as f32);
        if !self.transform.set_viewport_projection(viewport) {
            return;
        }
        self.viewport = viewport;
        self.refresh_transformation();
    }

    /// Pushes both matrices to the bound program, if it declares them.
    pub fn refresh_transformation(&mut self) {
        let Some(program) = self.shaders.current_program() else {
            return;
        };
        if program.layout.has_transform {
            self.backend
                .set_transform(program.handle, &self.transform.uniform());
        }
    }

    /// Texture sampled by textured programs at the next flush.
    pub fn bind_texture(&mut self, texture: Option<TextureHandle>) {
        self.texture = texture;
    }

    // ── immediate mode ────────────────────────────────────────────────────

    pub fn immediate_begin(&mut self) {
        self.batch.begin();
    }

    /// Appends one vertex in window pixels (+Y down).
    ///
    /// A full batch is flushed and restarted first, so vertices are never
    /// dropped.
    pub fn immediate_vertex(&mut self, position: Vec2, color: Color, uv: Vec2) {
        if self.batch.is_full() {
            self.immediate_flush();
            self.immediate_begin();
        }
        self.batch.push(position, color, uv);
    }

    /// Two triangles covering `(x0, y0)-(x1, y1)` with UVs spanning `0..1`.
    pub fn immediate_quad(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Color) {
        self.immediate_quad_uv(x0, y0, x1, y1, Vec2::zero(), Vec2::splat(1.0), color);
    }

    /// Two triangles covering `(x0, y0)-(x1, y1)`, mapping `uv0` to the
    /// `(x0, y0)` corner and `uv1` to `(x1, y1)`.
    #[allow(clippy::too_many_arguments)]
    pub fn immediate_quad_uv(
        &mut self,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        uv0: Vec2,
        uv1: Vec2,
        color: Color,
    ) {
        let corners = [
            (Vec2::new(x0, y0), Vec2::new(uv0.x, uv0.y)),
            (Vec2::new(x0, y1), Vec2::new(uv0.x, uv1.y)),
            (Vec2::new(x1, y0), Vec2::new(uv1.x, uv0.y)),
            (Vec2::new(x0, y1), Vec2::new(uv0.x, uv1.y)),
            (Vec2::new(x1, y1), Vec2::new(uv1.x, uv1.y)),
            (Vec2::new(x1, y0), Vec2::new(uv1.x, uv0.y)),
        ];
        for (position, uv) in corners {
            self.immediate_vertex(position, color, uv);
        }
    }

    /// Draws the batch with the bound program. Empty batches draw nothing.
    ///
    /// # Panics
    ///
    /// If no program is bound.
    pub fn immediate_flush(&mut self) {
        let Some(program) = self.shaders.current_program() else {
            panic!("Renderer::immediate_flush: no shader program is bound");
        };
        if self.batch.is_empty() {
            return;
        }

        let texture = if program.layout.has_texture {
            self.texture
        } else {
            None
        };
        self.backend.draw(&DrawCall {
            program: program.handle,
            texture,
            vertices: self.batch.vertices(),
        });

        self.stats.draw_calls += 1;
        self.stats.vertices_drawn += self.batch.len() as u32;
    }

    /// Emits quads for `text` against `font`'s active atlas, culling glyphs
    /// that fall outside the window.
    ///
    /// Does not bind, begin or flush. Returns the same extent as
    /// [`Font::measure`].
    pub fn immediate_string(
        &mut self,
        font: &Font,
        text: &str,
        x: f32,
        y: f32,
        pixel_height: f32,
        color: Color,
    ) -> Vec2 {
        let Some(atlas) = font.active_atlas() else {
            return Vec2::zero();
        };
        let Viewport { width, height } = self.viewport;

        layout::walk(font, text, Vec2::new(x, y), pixel_height, |placed| {
            if placed.x0 > width
                || placed.x1 < 0.0
                || placed.y0 > height
                || placed.y0 + pixel_height < 0.0
            {
                self.stats.vertices_culled += QUAD_VERTICES;
                return;
            }
            let (uv0, uv1) = atlas.uv_rect(placed.glyph);
            self.immediate_quad_uv(placed.x0, placed.y0, placed.x1, placed.y1, uv0, uv1, color);
        })
    }

    // ── convenience ───────────────────────────────────────────────────────

    /// Fills a rect with the built-in solid program.
    pub fn draw_rect(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Color) {
        self.bind_shader(self.solid_program);
        self.refresh_transformation();
        self.immediate_begin();
        self.immediate_quad(x0, y0, x1, y1, color);
        self.immediate_flush();
    }

    /// Draws `text` with the built-in font program and returns its extent.
    ///
    /// Draws nothing (and warns once) if `font` has no packed size.
    pub fn draw_string(
        &mut self,
        font: &Font,
        text: &str,
        x: f32,
        y: f32,
        pixel_height: f32,
        color: Color,
    ) -> Vec2 {
        let Some(atlas) = font.active_atlas() else {
            if !self.warned_no_atlas {
                log::warn!("Renderer::draw_string: font has no packed size; call pack_font first");
                self.warned_no_atlas = true;
            }
            return Vec2::zero();
        };

        self.bind_shader(self.font_program);
        self.refresh_transformation();
        self.bind_texture(Some(atlas.texture()));
        self.immediate_begin();
        let extent = self.immediate_string(font, text, x, y, pixel_height, color);
        self.immediate_flush();
        extent
    }

    /// Builds (or re-activates) `font`'s atlas for `size` on this backend.
    pub fn pack_font<'f>(&mut self, font: &'f mut Font, size: u32) -> &'f FontAtlas {
        font.pack(size, &mut self.backend)
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Resets the counters and clears the target.
    pub fn frame_begin(&mut self) {
        self.stats.reset();
        self.backend.clear(self.config.clear_color);
    }

    /// Draws the stats overlay with `font`, when enabled and given.
    ///
    /// `dt` is the previous frame's duration in seconds.
    pub fn frame_end(&mut self, font: Option<&Font>, dt: f32) {
        if !self.config.overlay {
            return;
        }
        if let Some(font) = font {
            overlay::draw_overlay(self, font, dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::HeadlessBackend;
    use crate::text::test_font;

    fn renderer_with(capacity: usize) -> Renderer<HeadlessBackend> {
        let config = RendererConfig {
            batch_capacity: capacity,
            ..RendererConfig::default()
        };
        Renderer::new(HeadlessBackend::new(), Viewport::new(800.0, 600.0), config).unwrap()
    }

    fn renderer() -> Renderer<HeadlessBackend> {
        renderer_with(DEFAULT_BATCH_CAPACITY)
    }

    #[test]
    fn new_loads_builtin_programs() {
        let r = renderer();
        assert_eq!(r.shaders().len(), 2);
        assert!(r.shaders().current().is_none());

        let solid = r.shaders().get(r.solid_program()).unwrap();
        assert!(solid.layout.has_transform);
        assert!(!solid.layout.has_texture);
        assert_eq!(solid.layout.attributes.uv, None);

        let font = r.shaders().get(r.font_program()).unwrap();
        assert!(font.layout.has_texture);
        assert_eq!(font.layout.attributes.position, Some(0));
        assert_eq!(font.layout.attributes.color, Some(1));
        assert_eq!(font.layout.attributes.uv, Some(2));
    }

    #[test]
    fn begin_resets_count() {
        let mut r = renderer();
        r.bind_shader(r.solid_program());
        r.immediate_quad(0.0, 0.0, 1.0, 1.0, Color::WHITE);
        assert_eq!(r.batch().len(), 6);
        r.immediate_begin();
        assert_eq!(r.batch().len(), 0);
    }

    #[test]
    fn quad_vertex_order_and_uvs() {
        let mut r = renderer();
        r.immediate_begin();
        r.immediate_quad(10.0, 20.0, 30.0, 40.0, Color::WHITE);

        let got: Vec<([f32; 2], [f32; 2])> =
            r.batch().vertices().iter().map(|v| (v.position, v.uv)).collect();
        assert_eq!(
            got,
            vec![
                ([10.0, -20.0], [0.0, 0.0]),
                ([10.0, -40.0], [0.0, 1.0]),
                ([30.0, -20.0], [1.0, 0.0]),
                ([10.0, -40.0], [0.0, 1.0]),
                ([30.0, -40.0], [1.0, 1.0]),
                ([30.0, -20.0], [1.0, 0.0]),
            ]
        );
    }

    #[test]
    fn overflow_flushes_once_without_loss() {
        let mut r = renderer_with(30);
        r.bind_shader(r.solid_program());
        r.immediate_begin();
        for i in 0..31 {
            r.immediate_vertex(Vec2::new(i as f32, 0.0), Color::WHITE, Vec2::zero());
        }
        assert_eq!(r.backend().draws().len(), 1);
        assert_eq!(r.backend().draws()[0].vertices.len(), 30);
        assert_eq!(r.batch().len(), 1);
        assert_eq!(r.batch().vertices()[0].position, [30.0, 0.0]);

        r.immediate_flush();
        assert_eq!(r.backend().draws().len(), 2);
        assert_eq!(r.stats().draw_calls, 2);
        assert_eq!(r.stats().vertices_drawn, 31);
    }

    #[test]
    fn capacity_is_rounded_to_whole_triangles() {
        let mut r = renderer_with(7);
        assert_eq!(r.batch().capacity(), 9);
        r.bind_shader(r.solid_program());
        r.immediate_begin();
        for _ in 0..9 {
            r.immediate_vertex(Vec2::zero(), Color::WHITE, Vec2::zero());
        }
        assert!(r.backend().draws().is_empty());
        r.immediate_vertex(Vec2::zero(), Color::WHITE, Vec2::zero());
        assert_eq!(r.backend().draws().len(), 1);
        assert_eq!(r.backend().draws()[0].vertices.len(), 9);
        assert_eq!(r.batch().len(), 1);
    }

    #[test]
    fn empty_flush_is_a_noop() {
        let mut r = renderer();
        r.bind_shader(r.solid_program());
        r.immediate_begin();
        r.immediate_flush();
        assert!(r.backend().draws().is_empty());
        assert_eq!(r.stats().draw_calls, 0);
    }

    #[test]
    #[should_panic(expected = "no shader program is bound")]
    fn flush_without_program_panics() {
        let mut r = renderer();
        r.immediate_begin();
        r.immediate_quad(0.0, 0.0, 1.0, 1.0, Color::WHITE);
        r.immediate_flush();
    }

    #[test]
    fn refresh_without_program_is_noop() {
        let mut r = renderer();
        r.refresh_transformation();
        assert!(r.backend().transforms().is_empty());
    }

    #[test]
    fn resize_refreshes_bound_program() {
        let mut r = renderer();
        r.bind_shader(r.solid_program());
        r.resize(1024, 768);
        assert_eq!(r.viewport(), Viewport::new(1024.0, 768.0));
        let (handle, uniform) = *r.backend().transforms().last().unwrap();
        assert_eq!(handle, r.shaders().get(r.solid_program()).unwrap().handle);
        assert_eq!(uniform, r.transform().uniform());
    }

    #[test]
    fn zero_resize_is_ignored() {
        let mut r = renderer();
        let before = *r.transform();
        r.bind_shader(r.solid_program());
        r.resize(0, 0);
        assert_eq!(r.viewport(), Viewport::new(800.0, 600.0));
        assert_eq!(*r.transform(), before);
        assert!(r.backend().transforms().is_empty());
    }

    #[test]
    fn solid_draw_does_not_bind_texture() {
        let mut r = renderer();
        r.bind_texture(Some(TextureHandle(7)));
        r.draw_rect(0.0, 0.0, 5.0, 5.0, Color::BLACK);
        assert_eq!(r.backend().draws()[0].texture, None);
    }

    #[test]
    fn offscreen_glyphs_are_culled() {
        let mut r = renderer();
        let mut font = test_font();
        r.pack_font(&mut font, 16);

        r.draw_string(&font, "A", -1000.0, 10.0, 16.0, Color::WHITE);
        assert!(r.backend().draws().is_empty());
        assert_eq!(r.stats().vertices_culled, 6);
        assert_eq!(r.stats().vertices_drawn, 0);
    }

    #[test]
    fn glyphs_outside_each_edge_are_culled() {
        let mut font = test_font();
        // window is 800x600
        for (x, y) in [(900.0, 10.0), (10.0, 700.0), (10.0, -100.0)] {
            let mut r = renderer();
            r.pack_font(&mut font, 16);
            r.draw_string(&font, "A", x, y, 16.0, Color::WHITE);
            assert!(r.backend().draws().is_empty(), "drawn at ({x}, {y})");
            assert_eq!(r.stats().vertices_culled, 6, "at ({x}, {y})");
            assert_eq!(r.stats().vertices_drawn, 0);
        }
    }

    #[test]
    fn partially_visible_string_culls_per_glyph() {
        let mut r = renderer();
        let mut font = test_font();
        r.pack_font(&mut font, 16);
        let advance = font.find_glyph('M').map_or(0.0, |g| g.advance);

        // first two glyphs visible, the rest past the right edge
        r.draw_string(&font, "MMMMM", 800.0 - 1.5 * advance, 10.0, 16.0, Color::WHITE);
        assert_eq!(r.backend().draws()[0].vertices.len(), 12);
        assert_eq!(r.stats().vertices_culled, 18);
    }

    #[test]
    fn long_string_flushes_with_atlas_bound() {
        let mut r = renderer_with(12);
        let mut font = test_font();
        let atlas_texture = r.pack_font(&mut font, 16).texture();
        let font_handle = r.shaders().get(r.font_program()).unwrap().handle;

        r.draw_string(&font, "ABCDE", 10.0, 10.0, 16.0, Color::WHITE);
        let draws = r.backend().draws();
        assert_eq!(
            draws.iter().map(|d| d.vertices.len()).collect::<Vec<_>>(),
            vec![12, 12, 6]
        );
        for draw in draws {
            assert_eq!(draw.program, font_handle);
            assert_eq!(draw.texture, Some(atlas_texture));
        }
        assert_eq!(r.stats().draw_calls, 3);
        assert_eq!(r.stats().vertices_drawn, 30);
    }

    #[test]
    fn custom_program_draws_through_the_batch() {
        let mut r = renderer();
        let id = r.load_shader("tinted", SOLID_SHAPE_SHADER).unwrap();
        assert_ne!(id, r.solid_program());
        let handle = r.shaders().get(id).unwrap().handle;

        r.bind_shader(id);
        r.refresh_transformation();
        r.immediate_begin();
        r.immediate_quad(0.0, 0.0, 4.0, 4.0, Color::WHITE);
        r.immediate_flush();

        assert_eq!(r.backend().draws()[0].program, handle);
        assert_eq!(r.backend().transforms()[0].0, handle);
    }

    #[test]
    fn failing_custom_program_is_reported() {
        let mut r = renderer();
        let err = r
            .load_shader("bad", "#if VERT\n#error nope\n#endif\n")
            .unwrap_err();
        assert_eq!(err.label, "bad");
        assert!(err.vertex_log.contains("nope"));
        assert_eq!(r.shaders().len(), 2);
    }

    #[test]
    fn string_emits_six_vertices_per_glyph() {
        let mut r = renderer();
        let mut font = test_font();
        let atlas_texture = r.pack_font(&mut font, 16).texture();

        r.draw_string(&font, "ab c", 10.0, 10.0, 16.0, Color::WHITE);
        let draw = &r.backend().draws()[0];
        assert_eq!(draw.vertices.len(), 18);
        assert_eq!(draw.texture, Some(atlas_texture));
        for v in &draw.vertices {
            assert!((0.0..=1.0).contains(&v.uv[0]) && (0.0..=1.0).contains(&v.uv[1]));
        }
    }

    #[test]
    fn emitted_geometry_fits_measure() {
        let mut r = renderer();
        let mut font = test_font();
        r.pack_font(&mut font, 16);

        let text = "The quick brown fox\njumps over\tthe lazy dog";
        let (x, y) = (20.0, 30.0);
        let extent = r.draw_string(&font, text, x, y, 18.0, Color::WHITE);
        assert_eq!(extent, font.measure(text, 18.0));

        for v in &r.backend().draws()[0].vertices {
            assert!(v.position[0] >= x);
            assert!(v.position[0] <= x + extent.x + 1e-3);
            // y is stored negated
            assert!(-v.position[1] <= y + extent.y + 1e-3);
        }
    }

    #[test]
    fn string_without_atlas_draws_nothing() {
        let mut r = renderer();
        let font = test_font();
        let extent = r.draw_string(&font, "hi", 0.0, 0.0, 16.0, Color::WHITE);
        assert_eq!(extent, Vec2::zero());
        assert!(r.backend().draws().is_empty());
    }

    #[test]
    fn frame_begin_resets_stats_and_clears() {
        let mut r = renderer();
        r.draw_rect(0.0, 0.0, 1.0, 1.0, Color::WHITE);
        assert_eq!(r.stats().draw_calls, 1);
        r.frame_begin();
        assert_eq!(*r.stats(), FrameStats::default());
        assert_eq!(r.backend().clears(), &[r.config().clear_color]);
    }
}
