//! Errors for this library

/// All the known errors returned by this crate.
#[derive(Debug, snafu::Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum ParticleFieldError {
    #[snafu(display("Canvas Error"))]
    /// Any error that occurs whilst drawing onto a canvas
    Canvas {
        /// The parent error type
        source: CanvasError,
    },

    #[snafu(display("Couldn't present frame: {message}"))]
    /// A surface failed to show a finished frame
    Present {
        /// What went wrong
        message: String,
    },

    /// General errors that don't need to be matched on
    #[snafu(whatever, display("{message}"))]
    Whatever {
        /// A helpful message acompanying the error
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync>, Some)))]
        /// The parent error type
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Errors raised by [`crate::canvas::Canvas`] implementations.
#[derive(Debug, snafu::Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum CanvasError {
    #[snafu(display("Non-finite coordinate for {shape}"))]
    /// A shape was requested at `NaN` or infinite coordinates
    NonFinite {
        /// The kind of shape being drawn
        shape: &'static str,
    },

    /// General errors that don't need to be matched on
    #[snafu(whatever, display("{message}"))]
    Whatever {
        /// A helpful message acompanying the error
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync>, Some)))]
        /// The parent error type
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}
