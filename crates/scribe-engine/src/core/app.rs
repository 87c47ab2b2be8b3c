use winit::event::WindowEvent;
use winit::window::WindowId;

use crate::render::{Renderer, WgpuBackend};
use crate::text::Font;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by hosts.
pub trait App {
    /// Called once the window and renderer exist, before the first frame.
    ///
    /// Load fonts and custom programs here. An error stops the runtime.
    fn on_start(&mut self, renderer: &mut Renderer<WgpuBackend>) -> anyhow::Result<()> {
        let _ = renderer;
        Ok(())
    }

    /// Called for window events.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called once per frame, between `frame_begin` and `frame_end`.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;

    /// Font the stats overlay is drawn with; `None` hides the overlay.
    fn overlay_font(&self) -> Option<&Font> {
        None
    }
}
