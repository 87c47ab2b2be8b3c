/// Axis-aligned rectangle in atlas texels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct PackRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Guillotine rectangle packer with best-short-side-fit placement.
///
/// Every placement consumes one free rectangle and splits the remainder along
/// the shorter leftover axis. Free rectangles never overlap, so neither do
/// placements.
#[derive(Debug, Clone)]
pub struct RectPacker {
    width: u32,
    height: u32,
    free: Vec<PackRect>,
}

impl RectPacker {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            free: vec![PackRect { x: 0, y: 0, w: width, h: height }],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reserves a `w × h` region and returns its top-left corner.
    ///
    /// Returns `None` when no free rectangle is large enough. Zero-sized
    /// requests always succeed at the origin without consuming space.
    pub fn pack(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w == 0 || h == 0 {
            return Some((0, 0));
        }

        let mut best: Option<usize> = None;
        let mut best_short = u32::MAX;
        let mut best_long = u32::MAX;

        for (i, r) in self.free.iter().enumerate() {
            if r.w < w || r.h < h {
                continue;
            }
            let leftover_w = r.w - w;
            let leftover_h = r.h - h;
            let short = leftover_w.min(leftover_h);
            let long = leftover_w.max(leftover_h);
            if short < best_short || (short == best_short && long < best_long) {
                best = Some(i);
                best_short = short;
                best_long = long;
            }
        }

        let r = self.free.swap_remove(best?);
        let leftover_w = r.w - w;
        let leftover_h = r.h - h;

        if leftover_w < leftover_h {
            // right strip is glyph-high, bottom strip is full-width
            self.push_free(r.x + w, r.y, leftover_w, h);
            self.push_free(r.x, r.y + h, r.w, leftover_h);
        } else {
            // bottom strip is glyph-wide, right strip is full-height
            self.push_free(r.x, r.y + h, w, leftover_h);
            self.push_free(r.x + w, r.y, leftover_w, r.h);
        }

        Some((r.x, r.y))
    }

    fn push_free(&mut self, x: u32, y: u32, w: u32, h: u32) {
        if w > 0 && h > 0 {
            self.free.push(PackRect { x, y, w, h });
        }
    }
}
