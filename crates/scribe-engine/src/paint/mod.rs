//! Color model shared by the batcher, text and overlay.

pub mod color;

pub use color::Color;
