//! All the CLI arguments for Particle Term

/// The default name of the main config file.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "config.toml";

/// Drifting particles, joined by fading lines, drawn behind your terminal.
#[derive(clap::Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
#[non_exhaustive]
pub struct CliArgs {
    /// Name of the config file to use, relative to the config directory.
    #[arg(long("config"), default_value = DEFAULT_CONFIG_FILE_NAME)]
    pub main_config: std::path::PathBuf,

    /// Use a different config directory. Defaults to your system's standard config directory.
    #[arg(long)]
    pub config_dir: Option<std::path::PathBuf>,

    /// The maximum log level. Overrides the config file.
    #[arg(long, value_enum)]
    pub log_level: Option<crate::config::LogLevel>,

    /// Where to write logs. Overrides the config file.
    #[arg(long)]
    pub log_path: Option<std::path::PathBuf>,

    /// Target frames per second. Overrides the config file.
    #[arg(long)]
    pub frame_rate: Option<u32>,
}

#[cfg(test)]
mod test {
    use clap::Parser as _;

    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from(["particle-term"]).unwrap();
        assert_eq!(
            args.main_config,
            std::path::PathBuf::from(DEFAULT_CONFIG_FILE_NAME)
        );
        assert_eq!(args.config_dir, None);
        assert_eq!(args.log_level, None);
        assert_eq!(args.frame_rate, None);
    }

    #[test]
    fn overrides() {
        let args = CliArgs::try_parse_from([
            "particle-term",
            "--config",
            "calm.toml",
            "--config-dir",
            "/tmp/particles",
            "--log-level",
            "debug",
            "--log-path",
            "/tmp/particles.log",
            "--frame-rate",
            "60",
        ])
        .unwrap();
        assert_eq!(args.main_config, std::path::PathBuf::from("calm.toml"));
        assert_eq!(
            args.config_dir,
            Some(std::path::PathBuf::from("/tmp/particles"))
        );
        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert_eq!(
            args.log_path,
            Some(std::path::PathBuf::from("/tmp/particles.log"))
        );
        assert_eq!(args.frame_rate, Some(60));
    }

    #[test]
    fn rejects_unknown_log_levels() {
        assert!(CliArgs::try_parse_from(["particle-term", "--log-level", "loud"]).is_err());
    }
}
