//! A particle field surface made of the user's terminal cells. Every cell holds 2 vertically
//! stacked "pixels" drawn with the upper half block character.

use std::sync::{Mutex, PoisonError};

use particle_field::canvas::Canvas as _;
use particle_field::colour::Colour;
use particle_field::errors::{ParticleFieldError, PresentSnafu};
use particle_field::raster::Framebuffer;
use termwiz::surface::Change as TermwizChange;
use termwiz::surface::Position as TermwizPosition;

/// The character that shows the upper pixel as its foreground and the lower pixel as its
/// background.
const UPPER_HALF_BLOCK: &str = "▀";

/// Microseconds in a second.
pub const ONE_MICROSECOND: u64 = 1_000_000;

/// Frames are drawn into a back buffer then sent, as terminal cells, to the renderer.
pub(crate) struct TerminalSurface {
    /// Size in pixels: terminal columns by twice the terminal rows
    size: Mutex<(usize, usize)>,
    /// The buffer handed out for the next frame
    back: Mutex<Option<Framebuffer>>,
    /// Target frames per second
    frame_rate: u32,
    /// When the last frame was handed out
    last_frame_tick: Mutex<std::time::Instant>,
    /// Where finished frames go
    frames_tx: tokio::sync::mpsc::Sender<termwiz::surface::Surface>,
}

impl TerminalSurface {
    /// Instantiate for a terminal of the given size in cells.
    pub fn new(
        columns: usize,
        rows: usize,
        frame_rate: u32,
        frames_tx: tokio::sync::mpsc::Sender<termwiz::surface::Surface>,
    ) -> Self {
        Self {
            size: Mutex::new(Self::pixels_for_cells(columns, rows)),
            back: Mutex::new(None),
            frame_rate: frame_rate.max(1),
            last_frame_tick: Mutex::new(std::time::Instant::now()),
            frames_tx,
        }
    }

    /// The pixel dimensions of a terminal of the given size in cells.
    pub const fn pixels_for_cells(columns: usize, rows: usize) -> (usize, usize) {
        (columns, rows.saturating_mul(2))
    }

    /// Sleep until it's time for the next frame.
    fn wait_for_next_frame(&self) {
        let mut last_frame_tick = self
            .last_frame_tick
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let target = ONE_MICROSECOND.wrapping_div(self.frame_rate.into());
        let target_frame_rate_micro = std::time::Duration::from_micros(target);
        if let Some(wait) = target_frame_rate_micro.checked_sub(last_frame_tick.elapsed()) {
            std::thread::sleep(wait);
        }
        *last_frame_tick = std::time::Instant::now();
    }

    /// Convert pixels to terminal cells.
    pub fn to_half_blocks(framebuffer: &Framebuffer) -> termwiz::surface::Surface {
        let columns = framebuffer.width();
        let rows = framebuffer.height().div_ceil(2);
        let mut surface = termwiz::surface::Surface::new(columns, rows);

        for row in 0..rows {
            let upper_y = row.saturating_mul(2);
            let lower_y = upper_y.saturating_add(1);
            let mut changes = Vec::with_capacity(columns.saturating_mul(3).saturating_add(1));
            changes.push(TermwizChange::CursorPosition {
                x: TermwizPosition::Absolute(0),
                y: TermwizPosition::Absolute(row),
            });
            for x in 0..columns {
                let upper = Self::make_colour_attribute(framebuffer.pixel(x, upper_y));
                let lower = Self::make_colour_attribute(framebuffer.pixel(x, lower_y));
                changes.push(TermwizChange::Attribute(
                    termwiz::cell::AttributeChange::Foreground(upper),
                ));
                changes.push(TermwizChange::Attribute(
                    termwiz::cell::AttributeChange::Background(lower),
                ));
                changes.push(UPPER_HALF_BLOCK.into());
            }
            surface.add_changes(changes);
        }

        surface
    }

    /// Make a Termwiz colour attribute. Missing and fully transparent pixels show the terminal's
    /// default colour.
    fn make_colour_attribute(maybe_colour: Option<Colour>) -> termwiz::color::ColorAttribute {
        match maybe_colour {
            Some(colour) if colour.alpha() > 0 => {
                let [alpha, red, green, blue] = colour.channels();
                termwiz::color::ColorAttribute::TrueColorWithDefaultFallback(
                    termwiz::color::SrgbaTuple(
                        f32::from(red) / 255.0,
                        f32::from(green) / 255.0,
                        f32::from(blue) / 255.0,
                        f32::from(alpha) / 255.0,
                    ),
                )
            }
            Some(_) | None => termwiz::color::ColorAttribute::Default,
        }
    }
}

impl particle_field::surface::Surface for TerminalSurface {
    type Canvas = Framebuffer;

    fn lock(&self) -> Option<Self::Canvas> {
        self.wait_for_next_frame();

        let (width, height) = *self.size.lock().unwrap_or_else(PoisonError::into_inner);
        if width == 0 || height == 0 {
            return None;
        }

        let spare = self
            .back
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let mut framebuffer = spare.unwrap_or_else(|| Framebuffer::new(width, height));
        if framebuffer.width() != width || framebuffer.height() != height {
            framebuffer.resize(width, height);
        }
        Some(framebuffer)
    }

    fn unlock_and_present(&self, canvas: Self::Canvas) -> Result<(), ParticleFieldError> {
        let frame = Self::to_half_blocks(&canvas);
        *self.back.lock().unwrap_or_else(PoisonError::into_inner) = Some(canvas);

        match self.frames_tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(tokio::sync::mpsc::error::TrySendError::Full(_)) => {
                tracing::trace!("Renderer is busy, dropping frame");
                Ok(())
            }
            Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) => PresentSnafu {
                message: "the renderer has gone",
            }
            .fail(),
        }
    }

    fn resize(&self, width: usize, height: usize) {
        *self.size.lock().unwrap_or_else(PoisonError::into_inner) = (width, height);
    }
}
