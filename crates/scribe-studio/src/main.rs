use anyhow::Context;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowId;

use scribe_engine::assets::load_file_bytes;
use scribe_engine::core::{App, AppControl, FrameCtx};
use scribe_engine::device::GpuInit;
use scribe_engine::logging::{init_logging, LoggingConfig};
use scribe_engine::paint::Color;
use scribe_engine::render::{Renderer, WgpuBackend};
use scribe_engine::text::{Font, BUNDLED_FONT};
use scribe_engine::window::{Runtime, RuntimeConfig};

const TITLE_SIZE: u32 = 32;
const BODY_SIZE: u32 = 18;
const OVERLAY_SIZE: u32 = 14;

/// Pixels per second of the scrolling ticker.
const TICKER_SPEED: f32 = 120.0;

const SAMPLE: &str = "\
Immediate-mode text on a single batched vertex buffer.
Each size is rasterised once into its own atlas;
\ttabs advance four spaces, newlines drop one line.
Glyphs scrolled off-screen are culled before they reach the GPU.";

const SWATCHES: [u32; 6] = [0xE06C75, 0xE5C07B, 0x98C379, 0x56B6C2, 0x61AFEF, 0xC678DD];

struct Studio {
    font: Font,
    ticker_x: f32,
}

impl Studio {
    fn new(font: Font) -> Self {
        Self {
            font,
            ticker_x: 0.0,
        }
    }
}

impl App for Studio {
    fn on_start(&mut self, renderer: &mut Renderer<WgpuBackend>) -> anyhow::Result<()> {
        for size in [TITLE_SIZE, BODY_SIZE, OVERLAY_SIZE] {
            let atlas = renderer.pack_font(&mut self.font, size);
            log::info!(
                "packed {size}px: {}x{} (oversample {})",
                atlas.width(),
                atlas.height(),
                atlas.oversample()
            );
        }
        Ok(())
    }

    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.logical_key == Key::Named(NamedKey::Escape) =>
            {
                AppControl::Exit
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let r = &mut *ctx.renderer;
        let width = r.viewport().width;
        let height = r.viewport().height;

        // header band fits the title's ascent to descent
        let title = r.pack_font(&mut self.font, TITLE_SIZE);
        let header = 24.0 + title.ascent() - title.descent();
        r.draw_rect(0.0, 0.0, width, header, Color::from_hex_rgb(0x2C313A));
        r.draw_string(&self.font, "scribe studio", 24.0, 12.0, TITLE_SIZE as f32, Color::WHITE);

        // body panel sized to its text
        r.pack_font(&mut self.font, BODY_SIZE);
        let body = self.font.measure(SAMPLE, BODY_SIZE as f32);
        let panel = header + 24.0;
        r.draw_rect(
            16.0,
            panel,
            32.0 + body.x,
            panel + 16.0 + body.y,
            Color::from_hex_rgb(0x3E4451),
        );
        r.draw_string(
            &self.font,
            SAMPLE,
            24.0,
            panel + 8.0,
            BODY_SIZE as f32,
            Color::from_hex_rgb(0xDCDFE4),
        );

        // swatches
        let top = panel + 40.0 + body.y;
        for (i, rgb) in SWATCHES.iter().enumerate() {
            let x = 24.0 + i as f32 * 56.0;
            r.draw_rect(x, top, x + 48.0, top + 48.0, Color::from_hex_rgb(*rgb));
        }

        // ticker wraps around; the part outside the window is culled
        let ticker = "scribe · batched glyphs · per-size atlases · culled off-screen · ";
        let ticker_width = self.font.measure(ticker, BODY_SIZE as f32).x;
        self.ticker_x -= TICKER_SPEED * ctx.time.dt;
        if self.ticker_x < -ticker_width {
            self.ticker_x += ticker_width;
        }
        let baseline = height - 48.0;
        let mut x = self.ticker_x;
        while x < width + ticker_width {
            r.draw_string(&self.font, ticker, x, baseline, BODY_SIZE as f32, Color::WHITE);
            x += ticker_width.max(1.0);
        }

        // overlay reads the active size
        r.pack_font(&mut self.font, OVERLAY_SIZE);

        AppControl::Continue
    }

    fn overlay_font(&self) -> Option<&Font> {
        Some(&self.font)
    }
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let font_bytes = match std::env::args_os().nth(1) {
        Some(path) => load_file_bytes(&path)?,
        None => BUNDLED_FONT.to_vec(),
    };
    let font = Font::load(&font_bytes).context("failed to load font")?;

    let config = RuntimeConfig {
        title: "scribe studio".to_string(),
        ..RuntimeConfig::default()
    };
    let gpu_init = GpuInit {
        prefer_srgb: false,
        ..GpuInit::default()
    };

    Runtime::run(config, gpu_init, Studio::new(font))
}
