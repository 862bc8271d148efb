//! All the variables that can be configured for the particle field.
//!
//! Every value is clamped on assignment, out of range input is corrected and never rejected.
//! Fields are stored as individual atomics so that a host thread can tweak the field whilst the
//! render thread is reading it. A reader may see a value one frame late, but never a torn one.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

use crate::colour::{Colour, BLACK, WHITE};

/// The most particles a field will ever simulate.
pub const MAX_PARTICLE_COUNT: i32 = 50;

/// The most opaque a line can be.
pub const MAX_LINE_ALPHA: i32 = 255;

/// Plain values for every setting. This is both the format that hosts supply settings in and
/// the per-frame snapshot that the render thread works from.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
#[expect(
    clippy::exhaustive_structs,
    reason = "Hosts build settings with struct update syntax"
)]
pub struct Settings {
    /// How many particles to spawn
    pub particle_count: i32,
    /// Smallest particle radius, in pixels
    pub min_radius: i32,
    /// Largest particle radius (exclusive), in pixels
    pub max_radius: i32,
    /// The range of a particle's initial speed on each axis
    pub velocity: f32,
    /// The widest a line between particles can be
    pub line_width: f32,
    /// The alpha of a line at the very edge of its reach
    pub line_min_alpha: i32,
    /// The alpha of a line between touching particles
    pub line_max_alpha: i32,
    /// The furthest apart 2 particles can be whilst still being linked
    pub line_max_length: i32,
    /// The colour the surface is cleared to every frame
    #[serde(alias = "background_color")]
    pub background_colour: Colour,
    /// The fill colour of particles
    #[serde(alias = "particle_color")]
    pub particle_colour: Colour,
    /// The colour of lines between particles
    #[serde(alias = "line_color")]
    pub line_colour: Colour,
    /// Whether lines between nearby particles are drawn
    pub lines_enabled: bool,
    /// Whether nearby particles nudge each other's direction
    pub rotation_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            particle_count: 20,
            min_radius: 10,
            max_radius: 25,
            velocity: 1.5,
            line_width: 15.0,
            line_min_alpha: 0,
            line_max_alpha: MAX_LINE_ALPHA,
            line_max_length: 220,
            background_colour: BLACK,
            particle_colour: WHITE,
            line_colour: WHITE,
            lines_enabled: true,
            rotation_enabled: false,
        }
    }
}

/// An `f32` that can be shared between threads.
#[derive(Debug, Default)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    /// Instantiate
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    /// Read the current value.
    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Replace the current value.
    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// The live, validated configuration of a particle field.
#[derive(Debug)]
pub struct ParticleConfig {
    /// See [`Settings::particle_count`]
    particle_count: AtomicI32,
    /// See [`Settings::min_radius`]
    min_radius: AtomicI32,
    /// See [`Settings::max_radius`]
    max_radius: AtomicI32,
    /// See [`Settings::velocity`]
    velocity: AtomicF32,
    /// See [`Settings::line_width`]
    line_width: AtomicF32,
    /// See [`Settings::line_min_alpha`]
    line_min_alpha: AtomicI32,
    /// See [`Settings::line_max_alpha`]
    line_max_alpha: AtomicI32,
    /// See [`Settings::line_max_length`]
    line_max_length: AtomicI32,
    /// See [`Settings::background_colour`]
    background_colour: AtomicU32,
    /// See [`Settings::particle_colour`]
    particle_colour: AtomicU32,
    /// See [`Settings::line_colour`]
    line_colour: AtomicU32,
    /// See [`Settings::lines_enabled`]
    lines_enabled: AtomicBool,
    /// See [`Settings::rotation_enabled`]
    rotation_enabled: AtomicBool,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        let defaults = Settings::default();
        Self {
            particle_count: AtomicI32::new(defaults.particle_count),
            min_radius: AtomicI32::new(defaults.min_radius),
            max_radius: AtomicI32::new(defaults.max_radius),
            velocity: AtomicF32::new(defaults.velocity),
            line_width: AtomicF32::new(defaults.line_width),
            line_min_alpha: AtomicI32::new(defaults.line_min_alpha),
            line_max_alpha: AtomicI32::new(defaults.line_max_alpha),
            line_max_length: AtomicI32::new(defaults.line_max_length),
            background_colour: AtomicU32::new(defaults.background_colour.0),
            particle_colour: AtomicU32::new(defaults.particle_colour.0),
            line_colour: AtomicU32::new(defaults.line_colour.0),
            lines_enabled: AtomicBool::new(defaults.lines_enabled),
            rotation_enabled: AtomicBool::new(defaults.rotation_enabled),
        }
    }
}

impl ParticleConfig {
    /// Start from the defaults and then assign every supplied value through its setter.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let config = Self::default();
        config.apply(settings);
        config
    }

    /// Assign every value, in the same order that a host would read them from its attributes.
    pub fn apply(&self, settings: &Settings) {
        self.set_particle_count(settings.particle_count);
        self.set_min_radius(settings.min_radius);
        self.set_max_radius(settings.max_radius);
        self.set_velocity(settings.velocity);
        self.set_line_width(settings.line_width);
        self.set_line_min_alpha(settings.line_min_alpha);
        self.set_line_max_alpha(settings.line_max_alpha);
        self.set_line_max_length(settings.line_max_length);
        self.set_background_colour(settings.background_colour);
        self.set_particle_colour(settings.particle_colour);
        self.set_line_colour(settings.line_colour);
        self.set_lines_enabled(settings.lines_enabled);
        self.set_rotation_enabled(settings.rotation_enabled);
    }

    /// Read every value. Each read is atomic on its own, not as a whole.
    #[must_use]
    pub fn snapshot(&self) -> Settings {
        Settings {
            particle_count: self.particle_count(),
            min_radius: self.min_radius(),
            max_radius: self.max_radius(),
            velocity: self.velocity(),
            line_width: self.line_width(),
            line_min_alpha: self.line_min_alpha(),
            line_max_alpha: self.line_max_alpha(),
            line_max_length: self.line_max_length(),
            background_colour: self.background_colour(),
            particle_colour: self.particle_colour(),
            line_colour: self.line_colour(),
            lines_enabled: self.lines_enabled(),
            rotation_enabled: self.rotation_enabled(),
        }
    }

    /// How many particles to spawn.
    #[must_use]
    pub fn particle_count(&self) -> i32 {
        self.particle_count.load(Ordering::Relaxed)
    }

    /// Set the particle count, clamped to `[0, 50]`.
    pub fn set_particle_count(&self, value: i32) {
        let clamped = value.clamp(0, MAX_PARTICLE_COUNT);
        self.particle_count.store(clamped, Ordering::Relaxed);
        tracing::debug!("particle_count set: {clamped}");
    }

    /// Smallest particle radius.
    #[must_use]
    pub fn min_radius(&self) -> i32 {
        self.min_radius.load(Ordering::Relaxed)
    }

    /// Set the smallest radius. Anything not positive, or not below the current maximum,
    /// becomes 1.
    pub fn set_min_radius(&self, value: i32) {
        let clamped = if value <= 0 || value >= self.max_radius() {
            1
        } else {
            value
        };
        self.min_radius.store(clamped, Ordering::Relaxed);
        tracing::debug!("min_radius set: {clamped}");
    }

    /// Largest particle radius.
    #[must_use]
    pub fn max_radius(&self) -> i32 {
        self.max_radius.load(Ordering::Relaxed)
    }

    /// Set the largest radius. Anything not above the current minimum becomes `minimum + 1`.
    pub fn set_max_radius(&self, value: i32) {
        let min = self.min_radius();
        let clamped = if value <= min {
            min.saturating_add(1)
        } else {
            value
        };
        self.max_radius.store(clamped, Ordering::Relaxed);
        tracing::debug!("max_radius set: {clamped}");
    }

    /// The range of a particle's initial speed.
    #[must_use]
    pub fn velocity(&self) -> f32 {
        self.velocity.load()
    }

    /// Set the velocity. Anything not positive, or not finite, becomes 1.
    pub fn set_velocity(&self, value: f32) {
        let clamped = if !value.is_finite() || value <= 0.0 {
            1.0
        } else {
            value
        };
        self.velocity.store(clamped);
        tracing::debug!("velocity set: {clamped}");
    }

    /// The widest a line can be.
    #[must_use]
    pub fn line_width(&self) -> f32 {
        self.line_width.load()
    }

    /// Set the line width. Anything negative, or not finite, becomes 0.
    pub fn set_line_width(&self, value: f32) {
        let clamped = if !value.is_finite() || value < 0.0 {
            0.0
        } else {
            value
        };
        self.line_width.store(clamped);
        tracing::debug!("line_width set: {clamped}");
    }

    /// The alpha of a line at the edge of its reach.
    #[must_use]
    pub fn line_min_alpha(&self) -> i32 {
        self.line_min_alpha.load(Ordering::Relaxed)
    }

    /// Set the minimum line alpha. Negative values become 0. Values not below the current
    /// maximum fall back to 1, or to 0 when the maximum is itself 1.
    pub fn set_line_min_alpha(&self, value: i32) {
        let max = self.line_max_alpha();
        let clamped = if value < 0 {
            0
        } else if value >= max {
            1.min(max.saturating_sub(1)).max(0)
        } else {
            value.min(MAX_LINE_ALPHA)
        };
        self.line_min_alpha.store(clamped, Ordering::Relaxed);
        tracing::debug!("line_min_alpha set: {clamped}");
    }

    /// The alpha of a line between touching particles.
    #[must_use]
    pub fn line_max_alpha(&self) -> i32 {
        self.line_max_alpha.load(Ordering::Relaxed)
    }

    /// Set the maximum line alpha. Values above 255 become 255, values not above the current
    /// minimum become `minimum + 1`. So a value equal to the minimum is not stored as is, which
    /// keeps the maximum strictly above the minimum.
    pub fn set_line_max_alpha(&self, value: i32) {
        let min = self.line_min_alpha();
        let clamped = if value > MAX_LINE_ALPHA {
            MAX_LINE_ALPHA
        } else if value <= min {
            min.saturating_add(1).min(MAX_LINE_ALPHA)
        } else {
            value
        };
        self.line_max_alpha.store(clamped, Ordering::Relaxed);
        tracing::debug!("line_max_alpha set: {clamped}");
    }

    /// The furthest apart 2 linked particles can be. This is the raw length, it is only squared
    /// by the simulation when it is set up.
    #[must_use]
    pub fn line_max_length(&self) -> i32 {
        self.line_max_length.load(Ordering::Relaxed)
    }

    /// Set the maximum line length. Anything not positive becomes 0.
    pub fn set_line_max_length(&self, value: i32) {
        let clamped = value.max(0);
        self.line_max_length.store(clamped, Ordering::Relaxed);
        tracing::debug!("line_max_length set: {clamped}");
    }

    /// The colour the surface is cleared to.
    #[must_use]
    pub fn background_colour(&self) -> Colour {
        Colour(self.background_colour.load(Ordering::Relaxed))
    }

    /// Set the background colour. This is also the colour that particles are erased with.
    pub fn set_background_colour(&self, colour: Colour) {
        self.background_colour.store(colour.0, Ordering::Relaxed);
        tracing::debug!("background_colour set: {colour}");
    }

    /// The fill colour of particles.
    #[must_use]
    pub fn particle_colour(&self) -> Colour {
        Colour(self.particle_colour.load(Ordering::Relaxed))
    }

    /// Set the particle fill colour.
    pub fn set_particle_colour(&self, colour: Colour) {
        self.particle_colour.store(colour.0, Ordering::Relaxed);
        tracing::debug!("particle_colour set: {colour}");
    }

    /// The colour of lines between particles.
    #[must_use]
    pub fn line_colour(&self) -> Colour {
        Colour(self.line_colour.load(Ordering::Relaxed))
    }

    /// Set the line colour.
    pub fn set_line_colour(&self, colour: Colour) {
        self.line_colour.store(colour.0, Ordering::Relaxed);
        tracing::debug!("line_colour set: {colour}");
    }

    /// Whether lines are drawn.
    #[must_use]
    pub fn lines_enabled(&self) -> bool {
        self.lines_enabled.load(Ordering::Relaxed)
    }

    /// Turn lines on or off.
    pub fn set_lines_enabled(&self, enabled: bool) {
        self.lines_enabled.store(enabled, Ordering::Relaxed);
        tracing::debug!("lines_enabled set: {enabled}");
    }

    /// Whether nearby particles rotate each other.
    #[must_use]
    pub fn rotation_enabled(&self) -> bool {
        self.rotation_enabled.load(Ordering::Relaxed)
    }

    /// Turn rotation on or off.
    pub fn set_rotation_enabled(&self, enabled: bool) {
        self.rotation_enabled.store(enabled, Ordering::Relaxed);
        tracing::debug!("rotation_enabled set: {enabled}");
    }
}
