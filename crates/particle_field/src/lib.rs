//! # Particle Field
//! An animated field of drifting particles that are joined by lines when they get close to each
//! other. Lines fade and thin out with distance.
//!
//! A host supplies a [`surface::Surface`] and reports its lifecycle to a [`field::ParticleField`],
//! which runs a dedicated render thread whenever there's both a surface and a request to draw.
//! Settings live in a [`config::ParticleConfig`] that can be changed from any thread while frames
//! are being drawn. Every value is clamped into a valid range as it's set.
//!
//! The simulation itself ([`simulation::Simulation`]) and the painter ([`renderer::Renderer`])
//! don't know anything about threads, so they can also be driven directly, one frame at a time.

pub mod canvas;
pub mod colour;
pub mod config;
pub mod errors;
pub mod field;
pub mod frame_loop;
pub mod particle;
pub mod raster;
pub mod renderer;
pub mod simulation;
pub mod surface;

/// Helpers for testing code that uses this library.
pub mod tests {
    pub mod helpers;
}
