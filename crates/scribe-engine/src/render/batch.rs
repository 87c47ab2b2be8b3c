use crate::coords::Vec2;
use crate::paint::Color;

use super::vertex::Vertex;

/// Default vertex capacity of the immediate-mode batch.
pub const DEFAULT_BATCH_CAPACITY: usize = 30_000;

/// Fixed-capacity CPU vertex store for the immediate-mode batch.
///
/// The batch itself never talks to the GPU. Flushing is driven by
/// [`Renderer`](super::Renderer), which checks [`is_full`](Self::is_full) before
/// every append and flushes + begins when it returns `true`. That keeps
/// `len() <= capacity()` at all times without dropping vertices.
///
/// Y is negated on insertion: callers author in screen space (+Y down) and the
/// stored geometry is in world space (+Y up).
#[derive(Debug)]
pub struct GeometryBatch {
    vertices: Vec<Vertex>,
    capacity: usize,
}

impl GeometryBatch {
    /// Allocates storage for `capacity` vertices up front.
    ///
    /// `capacity` is rounded up to a whole number of triangles and is at least 3.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(3).div_ceil(3) * 3;
        Self {
            vertices: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Empties the batch. No GPU work.
    #[inline]
    pub fn begin(&mut self) {
        self.vertices.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.vertices.len() >= self.capacity
    }

    /// Live vertex range, in insertion order.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Appends one vertex, flipping Y.
    ///
    /// The caller must flush first if the batch is full.
    pub(crate) fn push(&mut self, position: Vec2, color: Color, uv: Vec2) {
        debug_assert!(!self.is_full(), "GeometryBatch::push on a full batch");
        self.vertices
            .push(Vertex::new(Vec2::new(position.x, -position.y), color, uv));
    }
}

impl Default for GeometryBatch {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BATCH_CAPACITY)
    }
}
