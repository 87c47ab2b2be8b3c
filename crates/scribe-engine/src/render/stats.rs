/// Per-frame diagnostic counters, shown by the debug overlay.
///
/// Reset by [`Renderer::frame_begin`](super::Renderer::frame_begin).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub vertices_drawn: u32,
    pub vertices_culled: u32,
}

impl FrameStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
