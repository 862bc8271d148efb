//! An in-memory pixel buffer that can be drawn on. Useful for any host that wants plain pixels,
//! like a terminal made of half-block characters.

use glam::Vec2;

use crate::canvas::{Canvas, CompositeMode, Paint};
use crate::colour::{Colour, TRANSPARENT};
use crate::errors::{CanvasError, NonFiniteSnafu};

/// Lines thinner than this are still drawn a pixel wide.
const HAIRLINE_HALF_WIDTH: f32 = 0.5;

/// A rectangle of pixels, stored row by row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Framebuffer {
    /// Width in pixels
    width: usize,
    /// Height in pixels
    height: usize,
    /// All the pixels, `width * height` of them
    pixels: Vec<Colour>,
}

impl Framebuffer {
    /// A fully transparent framebuffer.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![TRANSPARENT; width.saturating_mul(height)],
        }
    }

    /// Change the dimensions. Existing pixels are not preserved.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels
            .resize(width.saturating_mul(height), TRANSPARENT);
    }

    /// The colour at the given pixel.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Colour> {
        if x >= self.width {
            return None;
        }
        self.pixels.get(y.saturating_mul(self.width).saturating_add(x)).copied()
    }

    /// All the pixels, row by row.
    #[must_use]
    pub fn pixels(&self) -> &[Colour] {
        &self.pixels
    }

    /// Combine a colour with a single pixel.
    fn plot(&mut self, x: usize, y: usize, colour: Colour, composite: CompositeMode) {
        let index = y.saturating_mul(self.width).saturating_add(x);
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = match composite {
                CompositeMode::Overwrite => colour,
                CompositeMode::Blend => colour.over(*pixel),
            };
        }
    }

    /// Clip a span of float coordinates to pixel indices on an axis of the given length.
    fn clip_span(start: f32, end: f32, length: usize) -> std::ops::Range<usize> {
        #[expect(
            clippy::as_conversions,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss,
            reason = "Values are clamped to the canvas before casting"
        )]
        let span = {
            let limit = length as f32;
            let from = start.floor().clamp(0.0, limit) as usize;
            let to = end.ceil().clamp(0.0, limit) as usize;
            from..to
        };
        span
    }

    /// The centre of a pixel.
    #[expect(
        clippy::as_conversions,
        clippy::cast_precision_loss,
        reason = "Pixel indices are far below f32's exact integer range"
    )]
    fn pixel_centre(x: usize, y: usize) -> Vec2 {
        Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
    }

    /// Plot every pixel inside a bounding box whose centre passes the test.
    fn fill_where(
        &mut self,
        min: Vec2,
        max: Vec2,
        paint: &Paint,
        is_inside: impl Fn(Vec2) -> bool,
    ) {
        let columns = Self::clip_span(min.x, max.x, self.width);
        let rows = Self::clip_span(min.y, max.y, self.height);
        for y in rows {
            for x in columns.clone() {
                if is_inside(Self::pixel_centre(x, y)) {
                    self.plot(x, y, paint.colour, paint.composite);
                }
            }
        }
    }
}

impl Canvas for Framebuffer {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn clear(&mut self, colour: Colour, composite: CompositeMode) -> Result<(), CanvasError> {
        for pixel in &mut self.pixels {
            *pixel = match composite {
                CompositeMode::Overwrite => colour,
                CompositeMode::Blend => colour.over(*pixel),
            };
        }
        Ok(())
    }

    fn draw_circle(
        &mut self,
        x: f32,
        y: f32,
        radius: f32,
        paint: &Paint,
    ) -> Result<(), CanvasError> {
        snafu::ensure!(
            x.is_finite() && y.is_finite() && radius.is_finite(),
            NonFiniteSnafu { shape: "circle" }
        );

        let centre = Vec2::new(x, y);
        let reach = Vec2::splat(radius);
        let radius_squared = radius * radius;
        self.fill_where(centre - reach, centre + reach, paint, |pixel| {
            pixel.distance_squared(centre) <= radius_squared
        });
        Ok(())
    }

    fn draw_line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        paint: &Paint,
    ) -> Result<(), CanvasError> {
        let start = Vec2::from(from);
        let end = Vec2::from(to);
        snafu::ensure!(
            start.is_finite() && end.is_finite() && paint.stroke_width.is_finite(),
            NonFiniteSnafu { shape: "line" }
        );

        let half_width = (paint.stroke_width / 2.0).max(HAIRLINE_HALF_WIDTH);
        let half_width_squared = half_width * half_width;
        let reach = Vec2::splat(half_width);
        let direction = end - start;
        let length_squared = direction.length_squared();

        self.fill_where(
            start.min(end) - reach,
            start.max(end) + reach,
            paint,
            |pixel| {
                let along = if length_squared > 0.0 {
                    ((pixel - start).dot(direction) / length_squared).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let closest = start + direction * along;
                pixel.distance_squared(closest) <= half_width_squared
            },
        );
        Ok(())
    }
}
