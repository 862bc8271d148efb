//! A single drifting particle.

use rand::Rng as _;

/// The lowest alpha a freshly spawned particle can have.
const MIN_SPAWN_ALPHA: u8 = 180;

/// Alphas are drawn from `[MIN_SPAWN_ALPHA, MAX_SPAWN_ALPHA)`, so a particle is never fully opaque.
const MAX_SPAWN_ALPHA: u8 = 255;

/// `Particle`
#[derive(Clone, Copy, Debug, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "Hosts and tests place particles by hand"
)]
pub struct Particle {
    /// Radius in pixels, always greater than 0
    pub radius: f32,
    /// Horizontal position of the centre
    pub x: f32,
    /// Vertical position of the centre
    pub y: f32,
    /// Horizontal velocity, in pixels per time unit
    pub vx: f32,
    /// Vertical velocity, in pixels per time unit
    pub vy: f32,
    /// Opacity of the particle's fill
    pub alpha: u8,
}

impl Particle {
    /// Spawn a particle somewhere on a canvas of the given size.
    ///
    /// Positions and radii are whole numbers. A zero-sized axis pins the particle to 0 on
    /// that axis.
    #[must_use]
    pub fn random(
        settings: &crate::config::Settings,
        width: usize,
        height: usize,
        rng: &mut impl rand::Rng,
    ) -> Self {
        let radius = if settings.min_radius < settings.max_radius {
            rng.gen_range(settings.min_radius..settings.max_radius)
        } else {
            settings.min_radius.max(1)
        };
        let x = if width == 0 { 0 } else { rng.gen_range(0..width) };
        let y = if height == 0 { 0 } else { rng.gen_range(0..height) };

        #[expect(
            clippy::as_conversions,
            clippy::cast_precision_loss,
            reason = "Canvas dimensions and radii are far below f32's exact integer range"
        )]
        let particle = Self {
            radius: radius as f32,
            x: x as f32,
            y: y as f32,
            vx: (rng.gen::<f32>() - 0.5) * settings.velocity,
            vy: (rng.gen::<f32>() - 0.5) * settings.velocity,
            alpha: rng.gen_range(MIN_SPAWN_ALPHA..MAX_SPAWN_ALPHA),
        };
        particle
    }
}
