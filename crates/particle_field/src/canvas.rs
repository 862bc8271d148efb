//! The drawing abstraction that a surface hands out for the duration of a frame.

use crate::colour::Colour;
use crate::errors::CanvasError;

/// How new pixels combine with the pixels already on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum CompositeMode {
    /// Replace whatever is underneath, alpha included
    Overwrite,
    /// Alpha-composite on top of whatever is underneath
    #[default]
    Blend,
}

/// The style of a single draw call.
#[derive(Clone, Copy, Debug, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "Paints are built field by field by the renderer"
)]
pub struct Paint {
    /// Colour, including the alpha to draw with
    pub colour: Colour,
    /// Width of stroked shapes, ignored by filled ones
    pub stroke_width: f32,
    /// How the shape combines with the canvas
    pub composite: CompositeMode,
}

impl Paint {
    /// A paint for filling shapes.
    #[must_use]
    pub const fn fill(colour: Colour, composite: CompositeMode) -> Self {
        Self {
            colour,
            stroke_width: 0.0,
            composite,
        }
    }

    /// A paint for stroking lines.
    #[must_use]
    pub const fn stroke(colour: Colour, stroke_width: f32) -> Self {
        Self {
            colour,
            stroke_width,
            composite: CompositeMode::Blend,
        }
    }
}

/// Something that can be drawn on. Coordinates are in pixels with the origin at the top-left.
pub trait Canvas {
    /// Width in pixels
    fn width(&self) -> usize;

    /// Height in pixels
    fn height(&self) -> usize;

    /// Fill the entire canvas with a single colour.
    ///
    /// # Errors
    /// When the implementation can't draw.
    fn clear(&mut self, colour: Colour, composite: CompositeMode) -> Result<(), CanvasError>;

    /// Draw a filled circle.
    ///
    /// # Errors
    /// When the implementation can't draw.
    fn draw_circle(&mut self, x: f32, y: f32, radius: f32, paint: &Paint)
        -> Result<(), CanvasError>;

    /// Draw a straight line of `paint.stroke_width`.
    ///
    /// # Errors
    /// When the implementation can't draw.
    fn draw_line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        paint: &Paint,
    ) -> Result<(), CanvasError>;
}
