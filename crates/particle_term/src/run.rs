//! Main entrypoint for running Particle Term

use std::sync::Arc;

use clap::Parser as _;
use color_eyre::eyre::{ContextCompat as _, Result};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, Layer as _};

use particle_field::config::ParticleConfig;
use particle_field::field::ParticleField;

use crate::cli_args::CliArgs;
use crate::config::{AppConfig, LogLevel};
use crate::input::{Action, Input};
use crate::renderer::Renderer;
use crate::terminal_surface::TerminalSurface;

/// Commands to control the various tasks/threads
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum Protocol {
    /// The entire application is exiting.
    End,
    /// User's TTY is resized.
    Resize {
        /// Width of new terminal.
        width: u16,
        /// Height of new terminal.
        height: u16,
    },
    /// A key bound to an action was pressed.
    Input(Action),
}

/// Main entrypoint. Returns the path of the log file if logs were written.
pub(crate) async fn run() -> Result<Option<std::path::PathBuf>> {
    let (cli_args, config, log_path) = setup()?;
    let (protocol_tx, _) = tokio::sync::broadcast::channel(64);
    let mut protocol_rx = protocol_tx.subscribe();

    let tty_size = Renderer::get_users_tty_size()?;
    let frame_rate = cli_args.frame_rate.unwrap_or(config.frame_rate);
    tracing::debug!(
        "Terminal is {}x{}, drawing at {frame_rate}fps",
        tty_size.cols,
        tty_size.rows
    );

    let (frames_tx, frames_rx) = tokio::sync::mpsc::channel(1);
    let particle_config = Arc::new(ParticleConfig::from_settings(&config.particles));
    let surface = Arc::new(TerminalSurface::new(
        tty_size.cols,
        tty_size.rows,
        frame_rate,
        frames_tx,
    ));
    let mut field = ParticleField::new(surface, Arc::clone(&particle_config));

    let renderer = Renderer::start(frames_rx, protocol_tx.clone());
    let config_handle = AppConfig::watch(
        config_path(&cli_args)?,
        Arc::clone(&particle_config),
        &protocol_tx,
    );
    let input_thread_handle = Input::start(protocol_tx.clone());

    override_on_panic_behaviour();
    field.on_surface_available()?;

    loop {
        let message = match protocol_rx.recv().await {
            Ok(message) => message,
            Err(tokio::sync::broadcast::error::RecvError::Lagged(count)) => {
                tracing::warn!("Main loop missed {count} protocol messages");
                continue;
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        };

        match message {
            Protocol::End => break,
            Protocol::Resize { width, height } => {
                let (pixel_width, pixel_height) =
                    TerminalSurface::pixels_for_cells(width.into(), height.into());
                field.on_surface_resized(pixel_width, pixel_height);
            }
            Protocol::Input(action) => {
                if !handle_action(action, &mut field, &protocol_tx)? {
                    break;
                }
            }
        }
    }

    tracing::debug!("Left main loop, exiting Particle Term...");
    tokio::task::block_in_place(|| field.pause());
    drop(field);
    broadcast_protocol_end(&protocol_tx);

    if input_thread_handle.is_finished() {
        // The STDIN loop doesn't listen to the protocol, so it can't exit its loop. Therefore we
        // should only join it if it finished due to its own error.
        input_thread_handle
            .join()
            .map_err(|err| color_eyre::eyre::eyre!("STDIN handle: {err:?}"))??;
    }
    renderer.await??;
    config_handle.await??;

    tracing::trace!("Leaving Particle Term's main `run()` function");
    Ok(log_path)
}

/// React to a key press. Returns whether to keep running.
fn handle_action(
    action: Action,
    field: &mut ParticleField<TerminalSurface>,
    protocol_tx: &tokio::sync::broadcast::Sender<Protocol>,
) -> Result<bool> {
    let config = Arc::clone(field.config());
    match action {
        Action::Quit => {
            broadcast_protocol_end(protocol_tx);
            return Ok(false);
        }
        Action::TogglePause => {
            if field.is_running() {
                // Pausing waits for the render thread to finish its frame.
                tokio::task::block_in_place(|| field.pause());
            } else {
                field.resume()?;
            }
        }
        Action::ToggleLines => config.set_lines_enabled(!config.lines_enabled()),
        Action::ToggleRotation => config.set_rotation_enabled(!config.rotation_enabled()),
    }

    Ok(true)
}

/// The default behaviour prints all panics to the CLI, which would scribble over the particles
/// and the user's terminal. So at least a log is made instead.
fn override_on_panic_behaviour() {
    std::panic::set_hook(Box::new(|info| {
        let message = particle_field::frame_loop::panic_message(info.payload());
        let location = match info.location() {
            Some(location) => format!(
                "{}@{}:{}",
                location.file(),
                location.line(),
                location.column()
            ),
            None => "Unknown location".to_owned(),
        };
        tracing::error!("Caught panic ({}): {message:?}", location);
    }));
}

/// Signal all task/thread loops to exit.
///
/// We keep it in its own function because we need to handle the error separately. If the error
/// were to be bubbled with `?` as usual, there's a chance it would never be logged, because the
/// protocol end signal is itself what allows the central error handler to even be reached.
pub(crate) fn broadcast_protocol_end(protocol_tx: &tokio::sync::broadcast::Sender<Protocol>) {
    tracing::debug!("Broadcasting the protocol `End` message to all listeners");
    let result = protocol_tx.send(Protocol::End);
    if let Err(error) = result {
        tracing::error!("{error:?}");
    }
}

/// The full path to the main config file.
fn config_path(cli_args: &CliArgs) -> Result<std::path::PathBuf> {
    let directory = AppConfig::setup_directory(cli_args.config_dir.clone())?;
    Ok(directory.join(&cli_args.main_config))
}

/// Prepare the application to start.
fn setup() -> Result<(CliArgs, AppConfig, Option<std::path::PathBuf>)> {
    let cli_args = CliArgs::parse();

    let path = match config_path(&cli_args) {
        Ok(path) => path,
        Err(directory_error) => {
            color_eyre::eyre::bail!("Error setting up config directory: {directory_error:?}");
        }
    };

    let (config, maybe_config_error) = AppConfig::load_or_default(&path);
    let log_path = setup_logging(&cli_args, &config)?;

    if let Some(config_error) = maybe_config_error {
        tracing::error!(
            "Bad config file, using defaults: {config_error:?}\n\nConfig path: {}",
            path.display()
        );
    }

    tracing::info!("Starting Particle Term");
    tracing::debug!("Loaded config: {config:?}");

    Ok((cli_args, config, log_path))
}

/// Setup logging. Returns the log file path if logging is enabled.
fn setup_logging(cli_args: &CliArgs, config: &AppConfig) -> Result<Option<std::path::PathBuf>> {
    let are_log_filters_manually_set = std::env::var("PARTICLE_TERM_LOG").is_ok();
    let path = cli_args
        .log_path
        .clone()
        .unwrap_or_else(|| config.log_path.clone());
    let level = cli_args
        .log_level
        .clone()
        .unwrap_or_else(|| config.log_level.clone());
    let level_as_string = format!("{level:?}").to_lowercase();

    let is_loggable = !matches!(level, LogLevel::Off) || are_log_filters_manually_set;
    if !is_loggable {
        return Ok(None);
    }

    let directory = path.parent().context("Couldn't get log path's parent")?;
    std::fs::create_dir_all(directory)?;
    let file = std::fs::File::create(&path)?;

    let filters = if are_log_filters_manually_set {
        if let Ok(user_filters) = std::env::var("PARTICLE_TERM_LOG") {
            std::env::set_var("RUST_LOG", user_filters);
        }

        tracing_subscriber::EnvFilter::builder()
            .with_default_directive("error".parse()?)
            .from_env_lossy()
    } else {
        tracing_subscriber::EnvFilter::builder()
            .with_default_directive("off".parse()?)
            .from_env_lossy()
            .add_directive(format!("particle_field={level_as_string}").parse()?)
            .add_directive(format!("particle_term={level_as_string}").parse()?)
    };

    let logfile_layer = tracing_subscriber::fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_filter(filters);

    tracing_subscriber::registry().with(logfile_layer).init();

    Ok(Some(path))
}
