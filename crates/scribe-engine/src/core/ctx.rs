use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use crate::render::{Renderer, WgpuBackend};
use crate::time::FrameTime;

/// The host window.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    /// Drawable size in physical pixels, the same space the renderer draws in.
    pub fn size(&self) -> PhysicalSize<u32> {
        self.window.inner_size()
    }
}

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// The target is already cleared and the counters reset; anything drawn
/// through `renderer` lands in this frame.
pub struct FrameCtx<'a> {
    pub window: WindowCtx<'a>,
    pub renderer: &'a mut Renderer<WgpuBackend>,
    pub time: FrameTime,
}
