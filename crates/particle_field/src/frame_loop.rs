//! The dedicated render thread. Every iteration it measures elapsed time, borrows a canvas from
//! the surface, advances the simulation, paints it and presents the result.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use snafu::ResultExt as _;

use crate::canvas::Canvas as _;
use crate::config::ParticleConfig;
use crate::errors::ParticleFieldError;
use crate::renderer::Renderer;
use crate::simulation::Simulation;
use crate::surface::Surface;

/// Name given to the render thread, handy in logs and debuggers.
pub const THREAD_NAME: &str = "particle-render";

/// Simulation time units per second. Velocities are in pixels per unit, so one unit is 10ms.
pub const TIME_UNITS_PER_SECOND: f32 = 100.0;

/// Measures the time between frames in simulation units.
#[derive(Debug)]
pub struct FrameClock {
    /// When the previous frame started
    previous: std::time::Instant,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Start measuring from now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            previous: std::time::Instant::now(),
        }
    }

    /// Time units elapsed since the last call, or since the clock was created.
    pub fn tick(&mut self) -> f32 {
        let now = std::time::Instant::now();
        let elapsed = now.saturating_duration_since(self.previous);
        self.previous = now;
        elapsed.as_secs_f32() * TIME_UNITS_PER_SECOND
    }
}

/// Everything a frame needs. Shared between the controller and the render thread.
pub struct FrameContext<S: Surface> {
    /// Where frames are drawn
    pub surface: Arc<S>,
    /// Live settings
    pub config: Arc<ParticleConfig>,
    /// Particle state, which outlives any single render thread
    pub simulation: Arc<Mutex<Simulation>>,
}

impl<S: Surface> Clone for FrameContext<S> {
    fn clone(&self) -> Self {
        Self {
            surface: Arc::clone(&self.surface),
            config: Arc::clone(&self.config),
            simulation: Arc::clone(&self.simulation),
        }
    }
}

impl<S: Surface> std::fmt::Debug for FrameContext<S> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("FrameContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: Surface> FrameContext<S> {
    /// Run a single frame. Returns whether the surface gave us anything to draw on.
    ///
    /// Nothing that goes wrong during a frame is fatal. Errors and panics are logged and the
    /// canvas is always handed back to the surface.
    pub fn frame(&self, dt: f32) -> bool {
        let Some(mut canvas) = self.surface.lock() else {
            tracing::trace!("Surface has no canvas, skipping frame");
            return false;
        };

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| self.draw(&mut canvas, dt)));
        match outcome {
            Ok(Ok(())) => (),
            Ok(Err(error)) => tracing::error!("Frame failed: {error:?}"),
            Err(payload) => tracing::error!("Frame panicked: {}", panic_message(&*payload)),
        }

        if let Err(error) = self.surface.unlock_and_present(canvas) {
            tracing::error!("Presenting frame failed: {error:?}");
        }

        true
    }

    /// Set up if needed, step and paint.
    fn draw(&self, canvas: &mut S::Canvas, dt: f32) -> Result<(), ParticleFieldError> {
        let settings = self.config.snapshot();
        let width = canvas.width();
        let height = canvas.height();

        let mut simulation = self
            .simulation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        simulation.setup(&settings, width, height);

        #[expect(
            clippy::as_conversions,
            clippy::cast_precision_loss,
            reason = "Canvas dimensions are far below f32's exact integer range"
        )]
        let (width_f32, height_f32) = (width as f32, height as f32);
        simulation.tick(dt, &settings, width_f32, height_f32);
        Renderer::paint(canvas, &simulation, &settings)
    }
}

/// Get something readable out of a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else {
        "Caught a panic with an unknown type."
    }
}

/// A running render thread. Dropping it stops the thread and waits for it.
#[derive(Debug)]
pub struct RenderThread {
    /// Cleared to ask the loop to finish its current frame and exit
    running: Arc<AtomicBool>,
    /// The thread itself
    handle: Option<std::thread::JoinHandle<()>>,
}

impl RenderThread {
    /// Spawn the render loop.
    ///
    /// # Errors
    /// If the OS refuses to spawn a thread.
    pub fn start<S: Surface>(context: FrameContext<S>) -> Result<Self, ParticleFieldError> {
        let running = Arc::new(AtomicBool::new(true));
        let running_for_thread = Arc::clone(&running);

        let handle = std::thread::Builder::new()
            .name(THREAD_NAME.to_owned())
            .spawn(move || Self::run(&context, &running_for_thread))
            .with_whatever_context(|error| format!("Couldn't spawn render thread: {error:?}"))?;
        tracing::debug!("Render thread spawned");

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// The render loop.
    fn run<S: Surface>(context: &FrameContext<S>, running: &AtomicBool) {
        tracing::debug!("Starting render loop");
        let mut clock = FrameClock::new();
        while running.load(Ordering::Acquire) {
            let dt = clock.tick();
            context.frame(dt);
            std::thread::yield_now();
        }
        tracing::debug!("Leaving render loop");
    }

    /// Whether the loop is still going.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self
                .handle
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    /// Ask the loop to stop and block until the thread has exited. Once this returns no more
    /// canvases will be borrowed from the surface.
    pub fn request_exit_and_wait(mut self) {
        self.stop();
    }

    /// Stop and join, at most once.
    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Render thread exited by panicking");
            }
            tracing::debug!("Render thread joined");
        }
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Settings;
    use crate::tests::helpers::RecordingSurface;

    fn context(surface: RecordingSurface) -> FrameContext<RecordingSurface> {
        let settings = Settings {
            particle_count: 5,
            ..Settings::default()
        };
        FrameContext {
            surface: Arc::new(surface),
            config: Arc::new(ParticleConfig::from_settings(&settings)),
            simulation: Arc::new(Mutex::new(Simulation::new())),
        }
    }

    #[test]
    fn a_frame_sets_up_steps_and_presents() {
        let context = context(RecordingSurface::new(40, 30));
        assert!(context.frame(1.0));

        assert!(context.simulation.lock().unwrap().is_ready());
        assert_eq!(context.simulation.lock().unwrap().particles().len(), 5);
        assert_eq!(context.surface.present_count(), 1);
        let frame = context.surface.last_frame.lock().unwrap().take().unwrap();
        assert_eq!(frame.calls.first().map(|call| call.kind()), Some("clear"));
        let circles = frame
            .calls
            .iter()
            .filter(|call| call.kind() == "fill")
            .count();
        assert_eq!(circles, 5);
    }

    #[test]
    fn no_canvas_means_no_frame() {
        let surface = RecordingSurface::new(40, 30);
        surface.has_canvas.store(false, Ordering::SeqCst);
        let context = context(surface);

        assert!(!context.frame(1.0));
        assert_eq!(context.surface.lock_count(), 1);
        assert_eq!(context.surface.present_count(), 0);
        assert!(!context.simulation.lock().unwrap().is_ready());
    }

    #[test]
    fn drawing_errors_still_present_the_canvas() {
        let surface = RecordingSurface::new(40, 30);
        surface.fail_drawing.store(true, Ordering::SeqCst);
        let context = context(surface);

        assert!(context.frame(1.0));
        assert!(context.frame(1.0));
        assert_eq!(context.surface.present_count(), 2);
    }

    #[test]
    fn panics_are_contained_and_the_state_survives() {
        let surface = RecordingSurface::new(40, 30);
        surface.panic_drawing.store(true, Ordering::SeqCst);
        let context = context(surface);

        assert!(context.frame(1.0));
        assert_eq!(context.surface.present_count(), 1);

        context.surface.panic_drawing.store(false, Ordering::SeqCst);
        assert!(context.frame(1.0));
        assert_eq!(context.surface.present_count(), 2);
        let frame = context.surface.last_frame.lock().unwrap().take().unwrap();
        assert!(!frame.calls.is_empty());
    }

    #[test]
    fn presenting_errors_are_not_fatal() {
        let surface = RecordingSurface::new(40, 30);
        surface.fail_presenting.store(true, Ordering::SeqCst);
        let context = context(surface);

        assert!(context.frame(1.0));
        assert!(context.frame(1.0));
        assert_eq!(context.surface.lock_count(), 2);
    }

    #[test]
    fn the_thread_loops_until_asked_to_stop() {
        let context = context(RecordingSurface::new(20, 20));
        let surface = Arc::clone(&context.surface);

        let thread = RenderThread::start(context).unwrap();
        surface.wait_for_presents_beyond(3);
        assert!(thread.is_running());
        thread.request_exit_and_wait();

        let locks = surface.lock_count();
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(surface.lock_count(), locks);
    }

    #[test]
    fn dropping_the_thread_stops_it() {
        let context = context(RecordingSurface::new(20, 20));
        let surface = Arc::clone(&context.surface);

        let thread = RenderThread::start(context).unwrap();
        surface.wait_for_locks_beyond(0);
        drop(thread);

        let locks = surface.lock_count();
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(surface.lock_count(), locks);
    }

    #[test]
    fn clock_measures_in_hundredths_of_a_second() {
        let mut clock = FrameClock::new();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let dt = clock.tick();
        assert!(dt >= 2.0, "dt: {dt}");
        assert!(clock.tick() < dt);
    }

    #[test]
    fn panic_messages_are_readable() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*payload), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*payload), "bang");
        let payload: Box<dyn std::any::Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(&*payload), "Caught a panic with an unknown type.");
    }
}
