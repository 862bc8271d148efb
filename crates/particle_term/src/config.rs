//! All of the user config for Particle Term.

use std::sync::Arc;

use color_eyre::eyre::{ContextCompat as _, Result};
use particle_field::config::{ParticleConfig, Settings};

/// A copy of the default config file. It gets copied to the user's config folder the first time
/// they start Particle Term.
static DEFAULT_CONFIG: &str = include_str!("../default_config.toml");

/// The valid log levels. Based on our `tracing` crate.
#[derive(serde::Serialize, serde::Deserialize, clap::ValueEnum, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error
    Error,
    /// Warnings
    Warn,
    /// Info
    Info,
    /// Debug
    Debug,
    /// Trace
    Trace,
    /// No logging
    Off,
}

/// Managing user config.
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// The maximum log level
    pub log_level: LogLevel,
    /// The location of the log file.
    pub log_path: std::path::PathBuf,
    /// Target frame rate
    pub frame_rate: u32,
    /// Everything about the particles themselves
    pub particles: Settings,
}

impl Default for AppConfig {
    fn default() -> Self {
        let log_directory = match dirs::state_dir() {
            Some(directory) => directory,
            None => std::path::PathBuf::new().join("./"),
        };
        let log_path = log_directory
            .join("particle-term")
            .join("particle-term.log");

        Self {
            log_level: LogLevel::Off,
            log_path,
            frame_rate: 30,
            particles: Settings::default(),
        }
    }
}

impl AppConfig {
    /// Get the stable location of Particle Term's config directory on the user's system.
    pub fn default_directory() -> Result<std::path::PathBuf> {
        Ok(dirs::config_dir()
            .context("Couldn't get standard config directory")?
            .join("particle-term"))
    }

    /// Figure out where our config is being stored, and create the directory if needed.
    pub fn setup_directory(
        maybe_custom_path: Option<std::path::PathBuf>,
    ) -> Result<std::path::PathBuf> {
        let path = match maybe_custom_path {
            None => Self::default_directory()?,
            Some(path) => path,
        };

        std::fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Load the main config. The shipped default is written out first if the user doesn't have a
    /// config file by the default name yet.
    pub fn load(config_path: &std::path::Path) -> Result<Self> {
        let config_file_name = config_path
            .file_name()
            .context("Couldn't get file name from config path")?;
        let is_default_config = config_file_name == crate::cli_args::DEFAULT_CONFIG_FILE_NAME;
        if is_default_config && !config_path.exists() {
            tracing::info!("Writing default config to: {config_path:?}");
            std::fs::write(config_path, DEFAULT_CONFIG)?;
        }

        tracing::info!("(Re)loading the main Particle Term config from: {config_path:?}");
        match std::fs::read_to_string(config_path) {
            Ok(data) => {
                tracing::trace!("Using config file:\n{data}");
                Ok(toml::from_str::<Self>(&data)?)
            }
            Err(error) => {
                tracing::error!("Loading config: {error:?}");
                color_eyre::eyre::bail!("Couldn't load config at {config_path:?}: {error}");
            }
        }
    }

    /// Parse the shipped default config.
    pub fn parse_default_config() -> Result<Self> {
        Ok(toml::from_str::<Self>(DEFAULT_CONFIG)?)
    }

    /// The config to start with. A broken config file shouldn't stop the particles, so any
    /// problem is returned alongside the shipped defaults, to be logged once logging is set up.
    pub fn load_or_default(config_path: &std::path::Path) -> (Self, Option<color_eyre::eyre::Report>) {
        match Self::load(config_path) {
            Ok(config) => (config, None),
            Err(error) => {
                let fallback = Self::parse_default_config().unwrap_or_default();
                (fallback, Some(error))
            }
        }
    }

    /// Read the config file again and push its particle settings into the live config. Every
    /// value goes through the clamping setters.
    pub fn reload(
        config_path: &std::path::Path,
        particle_config: &ParticleConfig,
    ) -> Result<Self> {
        let config = Self::load(config_path)?;
        particle_config.apply(&config.particles);
        tracing::debug!("Applied reloaded particle settings: {:?}", config.particles);
        Ok(config)
    }

    /// Watch the config file for any changes and then automatically update the live particle
    /// config with the contents of the new config file.
    pub fn watch(
        config_path: std::path::PathBuf,
        particle_config: Arc<ParticleConfig>,
        protocol_tx: &tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> tokio::task::JoinHandle<Result<()>> {
        let mut protocol_rx = protocol_tx.subscribe();
        tokio::spawn(async move {
            let directory = config_path
                .parent()
                .context("Couldn't get config file's directory")?
                .to_path_buf();
            tracing::debug!("Watching config ({directory:?}) for changes.");

            let (config_file_change_tx, mut config_file_change_rx) = tokio::sync::mpsc::channel(1);

            let mut debouncer = notify_debouncer_full::new_debouncer(
                std::time::Duration::from_millis(100),
                None,
                move |result: notify_debouncer_full::DebounceEventResult| match result {
                    Ok(events) => {
                        for event in events {
                            let send_result = config_file_change_tx.blocking_send(event);
                            if let Err(error) = send_result {
                                tracing::error!(
                                    "Sending config file watcher notification: {error:?}"
                                );
                            }
                        }
                    }
                    Err(error) => tracing::error!("File watcher: {error:?}"),
                },
            )?;
            debouncer.watch(
                &directory,
                notify_debouncer_full::notify::RecursiveMode::NonRecursive,
            )?;

            #[expect(
                clippy::integer_division_remainder_used,
                reason = "This is caused by the `tokio::select!`"
            )]
            loop {
                tokio::select! {
                    Some(event) = config_file_change_rx.recv() => {
                        Self::handle_file_change_event(&event, &config_path, &particle_config);
                    },
                    Ok(message) = protocol_rx.recv() => {
                        if matches!(message, crate::run::Protocol::End) {
                            break;
                        }
                    }
                }
            }

            tracing::debug!("Leaving config watcher loop");
            Ok(())
        })
    }

    /// Handle an event from the config file watcher. Only data changes to our own config file
    /// cause a reload.
    fn handle_file_change_event(
        event: &notify_debouncer_full::DebouncedEvent,
        config_path: &std::path::Path,
        particle_config: &ParticleConfig,
    ) {
        use notify_debouncer_full::notify::event as notify_event;
        let notify_event::EventKind::Modify(kind) = event.kind else {
            return;
        };
        let notify_event::ModifyKind::Data(_) = kind else {
            return;
        };
        if !Self::is_about(event, config_path) {
            return;
        }

        tracing::debug!("Config file change detected ({:?}), reloading.", event.paths);
        if let Err(error) = Self::reload(config_path, particle_config) {
            tracing::error!("Config update error: {error:?}");
        }
    }

    /// Whether a watcher event concerns the given file.
    fn is_about(event: &notify_debouncer_full::DebouncedEvent, config_path: &std::path::Path) -> bool {
        event
            .paths
            .iter()
            .any(|path| path.file_name() == config_path.file_name())
    }
}
