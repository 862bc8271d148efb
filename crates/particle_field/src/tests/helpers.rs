//! Test helpers

#![expect(clippy::unwrap_used, reason = "It's for use in tests only")]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::canvas::{Canvas, CompositeMode, Paint};
use crate::colour::Colour;
use crate::errors::{CanvasError, ParticleFieldError};
use crate::surface::Surface;

/// A single call made on a [`RecordingCanvas`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[non_exhaustive]
pub enum DrawCall {
    /// `Canvas::clear()`
    Clear(Colour, CompositeMode),
    /// `Canvas::draw_line()`
    Line((f32, f32), (f32, f32), Paint),
    /// `Canvas::draw_circle()`
    Circle(f32, f32, f32, Paint),
}

impl DrawCall {
    /// A short name for the call, telling erasing circles apart from filling ones.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Clear(..) => "clear",
            Self::Line(..) => "line",
            Self::Circle(_, _, _, paint) => match paint.composite {
                CompositeMode::Overwrite => "erase",
                CompositeMode::Blend => "fill",
            },
        }
    }
}

/// A canvas that just remembers what was drawn on it.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct RecordingCanvas {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Every successful draw call, in order
    pub calls: Vec<DrawCall>,
    /// Make every draw call return an error
    pub fail: bool,
    /// Make every draw call panic
    pub panic: bool,
}

impl RecordingCanvas {
    /// Instantiate
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Record a call, or fail in the requested way.
    fn record(&mut self, call: DrawCall) -> Result<(), CanvasError> {
        assert!(!self.panic, "Recording canvas told to panic");
        if self.fail {
            snafu::whatever!("Recording canvas told to fail");
        }
        self.calls.push(call);
        Ok(())
    }
}

impl Canvas for RecordingCanvas {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn clear(&mut self, colour: Colour, composite: CompositeMode) -> Result<(), CanvasError> {
        self.record(DrawCall::Clear(colour, composite))
    }

    fn draw_circle(
        &mut self,
        x: f32,
        y: f32,
        radius: f32,
        paint: &Paint,
    ) -> Result<(), CanvasError> {
        self.record(DrawCall::Circle(x, y, radius, *paint))
    }

    fn draw_line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        paint: &Paint,
    ) -> Result<(), CanvasError> {
        self.record(DrawCall::Line(from, to, *paint))
    }
}

/// A surface that hands out [`RecordingCanvas`]es and counts how it's used.
#[derive(Debug)]
#[non_exhaustive]
pub struct RecordingSurface {
    /// Width of the canvases handed out
    pub width: usize,
    /// Height of the canvases handed out
    pub height: usize,
    /// Whether `lock()` returns a canvas at all
    pub has_canvas: AtomicBool,
    /// Whether canvases should fail to draw
    pub fail_drawing: AtomicBool,
    /// Whether canvases should panic when drawn on
    pub panic_drawing: AtomicBool,
    /// Whether presenting should fail
    pub fail_presenting: AtomicBool,
    /// How many times `lock()` has been called
    pub locks: AtomicUsize,
    /// How many frames have been presented
    pub presents: AtomicUsize,
    /// The last presented frame
    pub last_frame: Mutex<Option<RecordingCanvas>>,
    /// The latest size the surface was told about
    pub resized_to: Mutex<Option<(usize, usize)>>,
}

impl RecordingSurface {
    /// Instantiate
    #[must_use]
    pub const fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            has_canvas: AtomicBool::new(true),
            fail_drawing: AtomicBool::new(false),
            panic_drawing: AtomicBool::new(false),
            fail_presenting: AtomicBool::new(false),
            locks: AtomicUsize::new(0),
            presents: AtomicUsize::new(0),
            last_frame: Mutex::new(None),
            resized_to: Mutex::new(None),
        }
    }

    /// How many times `lock()` has been called.
    #[must_use]
    pub fn lock_count(&self) -> usize {
        self.locks.load(Ordering::SeqCst)
    }

    /// How many frames have been presented.
    #[must_use]
    pub fn present_count(&self) -> usize {
        self.presents.load(Ordering::SeqCst)
    }

    /// Wait for `lock()` to have been called more than `count` times.
    ///
    /// # Panics
    /// If it doesn't happen within a few seconds.
    pub fn wait_for_locks_beyond(&self, count: usize) {
        Self::wait_for(|| self.lock_count() > count, "lock calls");
    }

    /// Wait for more than `count` frames to have been presented.
    ///
    /// # Panics
    /// If it doesn't happen within a few seconds.
    pub fn wait_for_presents_beyond(&self, count: usize) {
        Self::wait_for(|| self.present_count() > count, "presented frames");
    }

    /// Poll a condition until it passes.
    fn wait_for(condition: impl Fn() -> bool, what: &str) {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while !condition() {
            assert!(
                std::time::Instant::now() < deadline,
                "Timed out waiting for {what}"
            );
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
    }
}

impl Surface for RecordingSurface {
    type Canvas = RecordingCanvas;

    fn lock(&self) -> Option<Self::Canvas> {
        self.locks.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(1));
        if !self.has_canvas.load(Ordering::SeqCst) {
            return None;
        }

        let mut canvas = RecordingCanvas::new(self.width, self.height);
        canvas.fail = self.fail_drawing.load(Ordering::SeqCst);
        canvas.panic = self.panic_drawing.load(Ordering::SeqCst);
        Some(canvas)
    }

    fn unlock_and_present(&self, canvas: Self::Canvas) -> Result<(), ParticleFieldError> {
        if self.fail_presenting.load(Ordering::SeqCst) {
            snafu::whatever!("Recording surface told to fail presenting");
        }
        *self.last_frame.lock().unwrap() = Some(canvas);
        self.presents.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn resize(&self, width: usize, height: usize) {
        *self.resized_to.lock().unwrap() = Some((width, height));
    }
}
