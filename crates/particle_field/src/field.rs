//! The lifecycle controller. A host reports its lifecycle and surface events here and the
//! controller decides when a render thread should exist.
//!
//! The render thread only runs when a surface is available *and* something asked for it to
//! start. A surface becoming available counts as asking, so a field starts drawing as soon as
//! it has somewhere to draw. Pausing always stops the thread and blocks until it has exited.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::ParticleConfig;
use crate::errors::ParticleFieldError;
use crate::frame_loop::{FrameContext, RenderThread};
use crate::simulation::Simulation;
use crate::surface::Surface;

/// Whether a render thread should be running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum LoopState {
    /// No thread
    Stopped,
    /// A thread is drawing frames
    Running,
}

impl LoopState {
    /// The single rule for running: there's a surface and a start was requested.
    #[must_use]
    pub const fn decide(surface_available: bool, start_requested: bool) -> Self {
        if surface_available && start_requested {
            Self::Running
        } else {
            Self::Stopped
        }
    }
}

/// What the controller currently holds in the way of a render thread.
#[derive(Debug)]
enum Worker<S: Surface> {
    /// Created by a resume, waiting for a surface before it can start
    Pending(FrameContext<S>),
    /// Drawing frames
    Running(RenderThread),
}

/// An animated field of drifting particles drawn onto a host's surface.
#[derive(Debug)]
pub struct ParticleField<S: Surface> {
    /// Everything the render thread needs
    context: FrameContext<S>,
    /// The host has a surface we can draw on
    surface_available: bool,
    /// Something asked for drawing to start
    start_requested: bool,
    /// The current render thread, if any
    worker: Option<Worker<S>>,
}

impl<S: Surface> ParticleField<S> {
    /// Instantiate. Nothing is drawn until the surface becomes available or `resume()` is
    /// called with a surface already available.
    #[must_use]
    pub fn new(surface: Arc<S>, config: Arc<ParticleConfig>) -> Self {
        Self {
            context: FrameContext {
                surface,
                config,
                simulation: Arc::new(Mutex::new(Simulation::new())),
            },
            surface_available: false,
            start_requested: false,
            worker: None,
        }
    }

    /// The live configuration. Changes are picked up by the next frame.
    #[must_use]
    pub const fn config(&self) -> &Arc<ParticleConfig> {
        &self.context.config
    }

    /// The surface frames are drawn on.
    #[must_use]
    pub const fn surface(&self) -> &Arc<S> {
        &self.context.surface
    }

    /// Lock the particle state, to inspect it or to reset it.
    pub fn simulation(&self) -> MutexGuard<'_, Simulation> {
        self.context
            .simulation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// What the current flags say should be happening.
    #[must_use]
    pub const fn desired_state(&self) -> LoopState {
        LoopState::decide(self.surface_available, self.start_requested)
    }

    /// Whether a render thread is currently drawing frames.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(&self.worker, Some(Worker::Running(thread)) if thread.is_running())
    }

    /// The host is in the foreground. Start drawing if there's a surface, otherwise get ready
    /// to start as soon as there is one.
    ///
    /// # Errors
    /// If the render thread can't be spawned.
    pub fn resume(&mut self) -> Result<(), ParticleFieldError> {
        tracing::debug!("Resuming particle field");
        self.start_requested = true;
        if self.worker.is_none() {
            self.worker = Some(Worker::Pending(self.context.clone()));
        }
        self.sync()
    }

    /// The host is in the background. Stop drawing and wait for the render thread to exit.
    pub fn pause(&mut self) {
        tracing::debug!("Pausing particle field");
        self.start_requested = false;
        self.stop_worker();
    }

    /// The host now has a surface. Drawing starts straight away.
    ///
    /// # Errors
    /// If the render thread can't be spawned.
    pub fn on_surface_available(&mut self) -> Result<(), ParticleFieldError> {
        tracing::debug!("Surface available");
        self.surface_available = true;
        self.start_requested = true;
        self.sync()
    }

    /// The host's surface is gone. Stop drawing and wait for the render thread to exit.
    pub fn on_surface_lost(&mut self) {
        tracing::debug!("Surface lost");
        self.surface_available = false;
        self.stop_worker();
    }

    /// The surface changed size. Particles keep their positions and wrap at the new edges.
    pub fn on_surface_resized(&self, width: usize, height: usize) {
        tracing::debug!("Surface resized to {width}x{height}");
        self.context.surface.resize(width, height);
    }

    /// Make the worker match the desired state.
    fn sync(&mut self) -> Result<(), ParticleFieldError> {
        match self.desired_state() {
            LoopState::Running => {
                let thread = match self.worker.take() {
                    Some(Worker::Running(thread)) => thread,
                    Some(Worker::Pending(context)) => RenderThread::start(context)?,
                    None => RenderThread::start(self.context.clone())?,
                };
                self.worker = Some(Worker::Running(thread));
            }
            LoopState::Stopped => {
                if matches!(self.worker, Some(Worker::Running(_))) {
                    self.stop_worker();
                }
            }
        }
        Ok(())
    }

    /// Drop any worker, joining a running thread.
    fn stop_worker(&mut self) {
        if let Some(Worker::Running(thread)) = self.worker.take() {
            thread.request_exit_and_wait();
        }
    }
}

impl<S: Surface> Drop for ParticleField<S> {
    fn drop(&mut self) {
        self.stop_worker();
    }
}
