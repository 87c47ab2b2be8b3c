use std::fmt::Write as _;

use crate::coords::Vec2;
use crate::paint::Color;
use crate::text::Font;
use crate::time::fps;

use super::backend::RenderBackend;
use super::renderer::Renderer;
use super::stats::FrameStats;

/// Space between the overlay text and the window edges.
const PADDING: f32 = 10.0;
const BACKGROUND: u32 = 0xAAAAAA;

/// Stats block shown in the top-right corner.
pub fn overlay_text(stats: &FrameStats, dt: f32, font: &Font) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "draw calls: {}", stats.draw_calls);
    let _ = writeln!(text, "vertices: {}", stats.vertices_drawn);
    let _ = writeln!(text, "culled: {}", stats.vertices_culled);
    let _ = writeln!(text, "fps: {:.1}", fps(dt));
    let _ = write!(
        text,
        "atlases: {} ({} KB)",
        font.atlas_count(),
        font.atlas_bytes() / 1024
    );
    text
}

/// Draws the stats overlay at `font`'s active size.
///
/// Counters are captured before anything is drawn, so the overlay's own two
/// draw calls show up in the next frame's numbers.
pub fn draw_overlay<B: RenderBackend>(renderer: &mut Renderer<B>, font: &Font, dt: f32) {
    let Some(size) = font.active_size() else {
        return;
    };
    let pixel_height = size as f32;
    let text = overlay_text(renderer.stats(), dt, font);
    let extent = font.measure(&text, pixel_height);

    let right = renderer.viewport().width;
    let origin = Vec2::new(right - extent.x - PADDING, 0.0);

    renderer.draw_rect(
        origin.x,
        origin.y,
        right,
        origin.y + extent.y + PADDING,
        Color::from_hex_rgb(BACKGROUND),
    );
    renderer.draw_string(
        font,
        &text,
        origin.x + PADDING / 2.0,
        origin.y + PADDING / 2.0,
        pixel_height,
        Color::WHITE,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::HeadlessBackend;
    use crate::text::test_font;

    #[test]
    fn text_lists_counters() {
        let font = test_font();
        let stats = FrameStats {
            draw_calls: 3,
            vertices_drawn: 120,
            vertices_culled: 12,
        };
        let text = overlay_text(&stats, 0.02, &font);
        assert!(text.contains("draw calls: 3"));
        assert!(text.contains("vertices: 120"));
        assert!(text.contains("culled: 12"));
        assert!(text.contains("fps: 50.0"));
        assert!(text.contains("atlases: 0 (0 KB)"));
    }

    #[test]
    fn zero_dt_reports_zero_fps() {
        let font = test_font();
        let text = overlay_text(&FrameStats::default(), 0.0, &font);
        assert!(text.contains("fps: 0.0"));
    }

    #[test]
    fn nothing_drawn_without_active_atlas() {
        let mut renderer = Renderer::new(
            HeadlessBackend::new(),
            crate::coords::Viewport::new(640.0, 480.0),
            Default::default(),
        )
        .unwrap();
        let font = test_font();
        draw_overlay(&mut renderer, &font, 0.016);
        assert!(renderer.backend().draws().is_empty());
    }
}
