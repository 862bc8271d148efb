//! Paint a frame of the simulation onto a canvas.

use snafu::ResultExt as _;

use crate::canvas::{Canvas, CompositeMode, Paint};
use crate::config::Settings;
use crate::errors::{CanvasSnafu, ParticleFieldError};
use crate::simulation::Simulation;

/// The paints used for a frame, derived from the configured colours.
#[derive(Clone, Copy, Debug, PartialEq)]
#[non_exhaustive]
pub struct Paints {
    /// Fills particles on top of whatever is underneath
    pub particle: Paint,
    /// Punches a background coloured hole where a particle is about to be drawn
    pub erase: Paint,
    /// Strokes links
    pub line: Paint,
}

impl Paints {
    /// Build the paints from the latest settings.
    #[must_use]
    pub const fn new(settings: &Settings) -> Self {
        Self {
            particle: Paint::fill(settings.particle_colour, CompositeMode::Blend),
            erase: Paint::fill(settings.background_colour, CompositeMode::Overwrite),
            line: Paint::stroke(settings.line_colour, 0.0),
        }
    }
}

/// `Renderer`
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct Renderer;

impl Renderer {
    /// Paint a whole frame.
    ///
    /// For each particle in order: its links to all later particles, then an erasing circle,
    /// then the particle itself. Erasing first means a link that was just drawn under the
    /// particle can't show through it.
    ///
    /// # Errors
    /// When the canvas fails to draw.
    pub fn paint(
        canvas: &mut impl Canvas,
        simulation: &Simulation,
        settings: &Settings,
    ) -> Result<(), ParticleFieldError> {
        let paints = Paints::new(settings);

        canvas
            .clear(settings.background_colour, CompositeMode::Overwrite)
            .context(CanvasSnafu)?;

        let particles = simulation.particles();
        let active = simulation.active_count(settings);
        let mut links = simulation.links().iter().peekable();

        for (index, particle) in particles.iter().enumerate().take(active) {
            while let Some(link) = links.next_if(|link| link.a == index) {
                if !settings.lines_enabled {
                    continue;
                }
                let (Some(first), Some(second)) =
                    (particles.get(link.a), particles.get(link.b))
                else {
                    continue;
                };
                let paint = Paint {
                    colour: paints.line.colour.with_alpha(link.alpha),
                    stroke_width: link.stroke_width,
                    ..paints.line
                };
                canvas
                    .draw_line((first.x, first.y), (second.x, second.y), &paint)
                    .context(CanvasSnafu)?;
            }

            canvas
                .draw_circle(particle.x, particle.y, particle.radius, &paints.erase)
                .context(CanvasSnafu)?;

            let fill = Paint {
                colour: paints.particle.colour.with_alpha(particle.alpha),
                ..paints.particle
            };
            canvas
                .draw_circle(particle.x, particle.y, particle.radius, &fill)
                .context(CanvasSnafu)?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[expect(clippy::indexing_slicing, reason = "Tests aren't so strict")]
mod test {
    use super::*;
    use crate::colour::{Colour, BLACK, WHITE};
    use crate::particle::Particle;
    use crate::raster::Framebuffer;
    use crate::tests::helpers::{DrawCall, RecordingCanvas};

    fn particle(x: f32, y: f32, alpha: u8) -> Particle {
        Particle {
            radius: 2.0,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            alpha,
        }
    }

    fn simulation(particles: Vec<Particle>, settings: &Settings) -> Simulation {
        let mut simulation = Simulation::new();
        simulation.setup(settings, 50, 50);
        *simulation.particles_mut() = particles;
        simulation.tick(0.0, settings, 50.0, 50.0);
        simulation
    }

    #[test]
    fn draws_links_then_erase_then_fill_for_each_particle() {
        let settings = Settings {
            particle_count: 3,
            ..Settings::default()
        };
        let simulation = simulation(
            vec![
                particle(10.0, 10.0, 200),
                particle(12.0, 10.0, 210),
                particle(14.0, 10.0, 220),
            ],
            &settings,
        );
        let mut canvas = RecordingCanvas::new(50, 50);
        Renderer::paint(&mut canvas, &simulation, &settings).unwrap();

        let kinds: Vec<&str> = canvas.calls.iter().map(DrawCall::kind).collect();
        assert_eq!(
            kinds,
            vec![
                "clear", "line", "line", "erase", "fill", "line", "erase", "fill", "erase", "fill"
            ]
        );
    }

    #[test]
    fn uses_the_configured_colours_and_alphas() {
        let settings = Settings {
            particle_count: 2,
            background_colour: Colour(0xFF11_2233),
            particle_colour: Colour(0xFFAA_0000),
            line_colour: Colour(0xFF00_BB00),
            ..Settings::default()
        };
        let simulation = simulation(
            vec![particle(10.0, 10.0, 190), particle(10.0, 10.0, 240)],
            &settings,
        );
        let mut canvas = RecordingCanvas::new(50, 50);
        Renderer::paint(&mut canvas, &simulation, &settings).unwrap();

        assert_eq!(
            canvas.calls[0],
            DrawCall::Clear(Colour(0xFF11_2233), CompositeMode::Overwrite)
        );
        let DrawCall::Line(_, _, line) = canvas.calls[1] else {
            panic!("Expected a line, got {:?}", canvas.calls[1]);
        };
        assert_eq!(line.colour, Colour(0xBE00_BB00));
        assert_eq!(line.stroke_width, 2.0);
        let DrawCall::Circle(_, _, _, erase) = canvas.calls[2] else {
            panic!("Expected a circle");
        };
        assert_eq!(erase.colour, Colour(0xFF11_2233));
        assert_eq!(erase.composite, CompositeMode::Overwrite);
        let DrawCall::Circle(_, _, _, fill) = canvas.calls[3] else {
            panic!("Expected a circle");
        };
        assert_eq!(fill.colour, Colour(0xBEAA_0000));
        assert_eq!(fill.composite, CompositeMode::Blend);
    }

    #[test]
    fn no_lines_when_disabled() {
        let settings = Settings {
            particle_count: 2,
            lines_enabled: false,
            ..Settings::default()
        };
        let simulation = simulation(
            vec![particle(10.0, 10.0, 200), particle(11.0, 10.0, 200)],
            &settings,
        );
        let mut canvas = RecordingCanvas::new(50, 50);
        Renderer::paint(&mut canvas, &simulation, &settings).unwrap();
        assert!(canvas.calls.iter().all(|call| call.kind() != "line"));
        assert_eq!(canvas.calls.len(), 5);
    }

    #[test]
    fn a_failing_canvas_is_an_error() {
        let settings = Settings::default();
        let simulation = simulation(vec![particle(1.0, 1.0, 200)], &settings);
        let mut canvas = RecordingCanvas::new(50, 50);
        canvas.fail = true;
        let error = Renderer::paint(&mut canvas, &simulation, &settings).unwrap_err();
        assert_eq!(error.to_string(), "Canvas Error");
    }

    #[test]
    fn paints_real_pixels() {
        let settings = Settings {
            particle_count: 1,
            ..Settings::default()
        };
        let simulation = simulation(vec![particle(5.0, 5.0, 180)], &settings);
        let mut framebuffer = Framebuffer::new(10, 10);
        Renderer::paint(&mut framebuffer, &simulation, &settings).unwrap();
        assert_eq!(framebuffer.pixel(0, 0), Some(BLACK));
        let centre = framebuffer.pixel(5, 5).unwrap();
        assert_eq!(centre.alpha(), 255);
        assert_ne!(centre, BLACK);
        assert_ne!(centre, WHITE);
    }
}
