//! Where frames end up. A host provides a surface, the render thread borrows a canvas from it
//! once per frame and hands it back to be shown.

use crate::canvas::Canvas;
use crate::errors::ParticleFieldError;

/// A drawable output that can be shared with the render thread.
pub trait Surface: Send + Sync + 'static {
    /// The canvas handed out for a single frame.
    type Canvas: Canvas + Send;

    /// Borrow a canvas for the next frame. `None` means there's nothing to draw on right now
    /// and the frame should be skipped.
    fn lock(&self) -> Option<Self::Canvas>;

    /// Show a finished frame and give the canvas back.
    ///
    /// # Errors
    /// When the frame can't be shown.
    fn unlock_and_present(&self, canvas: Self::Canvas) -> Result<(), ParticleFieldError>;

    /// The host's drawable area changed size. Canvases handed out after this should have the
    /// new dimensions.
    fn resize(&self, _width: usize, _height: usize) {}
}
