use scribe_engine::coords::Viewport;
use scribe_engine::paint::Color;
use scribe_engine::render::{HeadlessBackend, Renderer, RendererConfig};
use scribe_engine::text::{Font, BUNDLED_FONT};

fn setup() -> (Renderer<HeadlessBackend>, Font) {
    let renderer = Renderer::new(
        HeadlessBackend::new(),
        Viewport::new(800.0, 600.0),
        RendererConfig::default(),
    )
    .unwrap();
    let font = Font::load(BUNDLED_FONT).unwrap();
    (renderer, font)
}

#[test]
fn overlay_is_one_rect_and_one_string() {
    let (mut renderer, mut font) = setup();
    renderer.pack_font(&mut font, 14);

    renderer.frame_begin();
    renderer.backend_mut().clear_recording();
    renderer.frame_end(Some(&font), 1.0 / 60.0);

    let draws = renderer.backend().draws();
    assert_eq!(draws.len(), 2);

    let solid = renderer.shaders().get(renderer.solid_program()).unwrap().handle;
    let text = renderer.shaders().get(renderer.font_program()).unwrap().handle;
    assert_eq!(draws[0].program, solid);
    assert_eq!(draws[0].vertices.len(), 6);
    assert_eq!(draws[1].program, text);
    assert!(!draws[1].vertices.is_empty());
    assert_eq!(draws[1].vertices.len() % 6, 0);
}

#[test]
fn overlay_hugs_the_top_right_corner() {
    let (mut renderer, mut font) = setup();
    renderer.pack_font(&mut font, 14);

    renderer.frame_begin();
    renderer.frame_end(Some(&font), 1.0 / 60.0);

    let rect = &renderer.backend().draws()[0];
    let max_x = rect.vertices.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
    let top = rect.vertices.iter().map(|v| -v.position[1]).fold(f32::MAX, f32::min);
    assert_eq!(max_x, 800.0);
    assert_eq!(top, 0.0);

    let grey = Color::from_hex_rgb(0xAAAAAA).to_array();
    assert!(rect.vertices.iter().all(|v| v.color == grey));

    // text sits inside the rect
    let min_rect_x = rect.vertices.iter().map(|v| v.position[0]).fold(f32::MAX, f32::min);
    for v in &renderer.backend().draws()[1].vertices {
        assert!(v.position[0] >= min_rect_x - 1.0);
        assert!(v.position[0] <= 800.0);
    }
}

#[test]
fn overlay_reports_previous_counters() {
    let (mut renderer, mut font) = setup();
    renderer.pack_font(&mut font, 14);

    renderer.frame_begin();
    renderer.draw_rect(0.0, 0.0, 10.0, 10.0, Color::WHITE);
    renderer.draw_string(&font, "off", -1000.0, 0.0, 14.0, Color::WHITE);
    let stats = *renderer.stats();
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.vertices_drawn, 6);
    assert_eq!(stats.vertices_culled, 18);

    renderer.frame_end(Some(&font), 0.0);
    assert_eq!(renderer.stats().draw_calls, 3);

    renderer.frame_begin();
    assert_eq!(renderer.stats().draw_calls, 0);
}

#[test]
fn overlay_disabled_draws_nothing() {
    let config = RendererConfig {
        overlay: false,
        ..RendererConfig::default()
    };
    let mut renderer =
        Renderer::new(HeadlessBackend::new(), Viewport::new(800.0, 600.0), config).unwrap();
    let mut font = Font::load(BUNDLED_FONT).unwrap();
    renderer.pack_font(&mut font, 14);

    renderer.frame_begin();
    renderer.frame_end(Some(&font), 0.016);
    assert!(renderer.backend().draws().is_empty());
}

#[test]
fn no_font_no_overlay() {
    let (mut renderer, _) = setup();
    renderer.frame_begin();
    renderer.frame_end(None, 0.016);
    assert!(renderer.backend().draws().is_empty());
}
