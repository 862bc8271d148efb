//! Move the particles and work out which of them are close enough to be linked.

use crate::config::Settings;
use crate::particle::Particle;

/// `cos(1°)`
pub const ROTATION_COS: f32 = 0.999_847_6;

/// `sin(1°)`
pub const ROTATION_SIN: f32 = 0.017_452_4;

/// Links closer than this ratio of their full reach are drawn at full width.
const FULL_WIDTH_RATIO: f32 = 0.65;

/// How much thinner links get a head start on their width.
const THIN_LINK_BOOST: f32 = 0.2;

/// The rotation threshold is the squared line length divided by this.
const HALF_LENGTH_DIVISOR: i64 = 16;

/// Values derived from the configuration when the simulation is set up.
#[derive(Clone, Copy, Debug, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "There's nothing else to derive from the line length"
)]
pub struct Geometry {
    /// The square of the maximum line length
    pub line_max_length_squared: f32,
    /// Particles closer than this (squared) distance rotate each other
    pub line_half_length: f32,
}

impl Geometry {
    /// Square the line length exactly once.
    #[must_use]
    pub fn from_line_max_length(line_max_length: i32) -> Self {
        let length = i64::from(line_max_length);
        let squared = length.saturating_mul(length);

        #[expect(
            clippy::as_conversions,
            clippy::cast_precision_loss,
            reason = "Distances are compared as floats anyway"
        )]
        let geometry = Self {
            line_max_length_squared: squared as f32,
            line_half_length: squared.wrapping_div(HALF_LENGTH_DIVISOR) as f32,
        };
        geometry
    }
}

/// Whether the one-off setup has happened.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[non_exhaustive]
pub enum SetupState {
    /// No particles yet
    #[default]
    Uninitialized,
    /// Particles are spawned and the line geometry is fixed
    Ready(Geometry),
}

/// A pair of particles that are close enough to be joined by a line this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "A link is fully described by its ends and its style"
)]
pub struct Link {
    /// Index of the first particle
    pub a: usize,
    /// Index of the second particle, always greater than `a`
    pub b: usize,
    /// Opacity of the line
    pub alpha: u8,
    /// Width of the line
    pub stroke_width: f32,
}

/// The measurements of a pair of particles that are within reach of each other.
#[derive(Clone, Copy, Debug, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "It's just the output of `measure_link`"
)]
pub struct LinkMeasure {
    /// Squared distance between the centres
    pub distance_squared: f32,
    /// `(max² - distance²) / max²`, in `(0, 1]`
    pub ratio: f32,
    /// Opacity of the line
    pub alpha: u8,
    /// Width of the line
    pub stroke_width: f32,
}

/// All the particles and this frame's links.
#[derive(Debug, Default)]
pub struct Simulation {
    /// Every particle, only the first `particle_count` are active
    particles: Vec<Particle>,
    /// Links found on the latest tick, ordered by `a` then `b`
    links: Vec<Link>,
    /// One-off setup state
    state: SetupState,
}

impl Simulation {
    /// Instantiate an empty, not yet set up, simulation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Has the one-off setup happened?
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.state, SetupState::Ready(_))
    }

    /// The current setup state.
    #[must_use]
    pub const fn state(&self) -> SetupState {
        self.state
    }

    /// The line geometry, only available once set up.
    #[must_use]
    pub const fn geometry(&self) -> Option<Geometry> {
        match self.state {
            SetupState::Ready(geometry) => Some(geometry),
            SetupState::Uninitialized => None,
        }
    }

    /// Every particle.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Direct access to the particles, for hosts that want to place them by hand.
    pub fn particles_mut(&mut self) -> &mut Vec<Particle> {
        &mut self.particles
    }

    /// The links found on the latest tick.
    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Square the line length and spawn the particles. Only does anything the first time it's
    /// called, returns whether it did anything.
    pub fn setup(&mut self, settings: &Settings, width: usize, height: usize) -> bool {
        if self.is_ready() {
            return false;
        }

        let geometry = Geometry::from_line_max_length(settings.line_max_length);
        let count = usize::try_from(settings.particle_count).unwrap_or_default();
        let mut rng = rand::thread_rng();
        self.particles = (0..count)
            .map(|_| Particle::random(settings, width, height, &mut rng))
            .collect();
        self.links.clear();
        self.state = SetupState::Ready(geometry);

        tracing::debug!(
            "Simulation set up with {count} particles on a {width}x{height} canvas: {geometry:?}"
        );
        true
    }

    /// Forget all particles so that the next setup starts afresh.
    pub fn reset(&mut self) {
        self.particles.clear();
        self.links.clear();
        self.state = SetupState::Uninitialized;
        tracing::debug!("Simulation reset");
    }

    /// How many particles take part in a frame.
    #[must_use]
    pub fn active_count(&self, settings: &Settings) -> usize {
        usize::try_from(settings.particle_count)
            .unwrap_or_default()
            .min(self.particles.len())
    }

    /// Advance the simulation by `dt` time units on a canvas of the given size.
    pub fn tick(&mut self, dt: f32, settings: &Settings, width: f32, height: f32) {
        self.links.clear();
        let Some(geometry) = self.geometry() else {
            return;
        };

        let active = self.active_count(settings);
        for particle in self.particles.iter_mut().take(active) {
            particle.x += particle.vx * dt;
            particle.y += particle.vy * dt;
            particle.x = wrap(particle.x, particle.radius, width);
            particle.y = wrap(particle.y, particle.radius, height);
        }

        if settings.lines_enabled {
            self.link_particles(active, settings, geometry);
        }
    }

    /// Check every pair of active particles, recording links and rotating particles that are
    /// almost touching.
    fn link_particles(&mut self, active: usize, settings: &Settings, geometry: Geometry) {
        for i in 0..active {
            for j in i.saturating_add(1)..active {
                let (Some(first), Some(second)) =
                    (self.particles.get(i).copied(), self.particles.get(j).copied())
                else {
                    continue;
                };
                let Some(measure) = measure_link(&first, &second, settings, geometry) else {
                    continue;
                };

                self.links.push(Link {
                    a: i,
                    b: j,
                    alpha: measure.alpha,
                    stroke_width: measure.stroke_width,
                });

                if settings.rotation_enabled
                    && measure.distance_squared < geometry.line_half_length
                {
                    for index in [i, j] {
                        if let Some(particle) = self.particles.get_mut(index) {
                            (particle.vx, particle.vy) = rotate(particle.vx, particle.vy);
                        }
                    }
                }
            }
        }
    }
}

/// Teleport a coordinate that has drifted off one edge to the other edge.
///
/// A particle has to be completely off the low edge before it moves, but it reappears at the
/// high edge itself. Likewise off the high edge it reappears at exactly 0.
#[must_use]
pub fn wrap(position: f32, radius: f32, bound: f32) -> f32 {
    if position < -radius {
        bound
    } else if position > bound + radius {
        0.0
    } else {
        position
    }
}

/// Work out whether 2 particles are linked, and if so, how the line between them looks.
#[must_use]
pub fn measure_link(
    first: &Particle,
    second: &Particle,
    settings: &Settings,
    geometry: Geometry,
) -> Option<LinkMeasure> {
    let dx = first.x - second.x;
    let dy = first.y - second.y;
    let distance_squared = dx * dx + dy * dy;
    let max = geometry.line_max_length_squared;
    if distance_squared >= max {
        return None;
    }

    let ratio = (max - distance_squared) / max;
    let alpha_range = settings.line_max_alpha - settings.line_min_alpha;

    #[expect(
        clippy::as_conversions,
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        reason = "Alphas are tiny integers and the result is meant to be truncated"
    )]
    let faded_alpha = (settings.line_min_alpha as f32 + alpha_range as f32 * ratio) as i32;
    let capped_alpha = faded_alpha
        .min(i32::from(first.alpha.min(second.alpha)))
        .max(0);
    let alpha = u8::try_from(capped_alpha).unwrap_or(u8::MAX);

    let width_multiplier = if ratio < FULL_WIDTH_RATIO {
        ratio + THIN_LINK_BOOST
    } else {
        1.0
    };
    let stroke_width = settings.line_width.min(first.radius.min(second.radius)) * width_multiplier;

    Some(LinkMeasure {
        distance_squared,
        ratio,
        alpha,
        stroke_width,
    })
}

/// Turn a velocity by roughly 1°.
///
/// Note that the y component is `vx·sin − vy·cos` rather than the textbook `vx·sin + vy·cos`,
/// so as well as turning, the vertical direction flips each time. That's the look the effect
/// has always had, so it's kept.
#[must_use]
pub fn rotate(vx: f32, vy: f32) -> (f32, f32) {
    (
        vx * ROTATION_COS - vy * ROTATION_SIN,
        vx * ROTATION_SIN - vy * ROTATION_COS,
    )
}
