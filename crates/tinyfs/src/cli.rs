//! Command-line interface.
//!
//! Server knobs resolve as command line, then `TINYFS_*` environment
//! variables, then built-in defaults.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tinyfs_server::ServerConfig;
use tinyfs_telemetry::{LogConfig, LogFormat};

/// Log output format accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    /// One JSON object per line.
    Json,
    /// Human-readable output.
    Pretty,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Json => Self::Json,
            LogFormatArg::Pretty => Self::Pretty,
        }
    }
}

/// TinyFS: serve a directory over HTTP.
#[derive(Parser, Debug)]
#[command(name = "tinyfs", author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to serve files from (created if missing).
    #[arg(short, long, value_name = "DIR")]
    pub storage: PathBuf,

    /// Address to bind to [env: TINYFS_ADDRESS] [default: 0.0.0.0]
    #[arg(long)]
    pub address: Option<String>,

    /// Port to listen on [env: TINYFS_PORT] [default: 8888]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Shutdown poll interval in milliseconds [env: TINYFS_POLL_MS] [default: 100]
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_ms: Option<u64>,

    /// Largest servable file in megabytes [env: TINYFS_MAX_FILE_MB] [default: 100]
    #[arg(long, value_name = "MB", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_file_mb: Option<u64>,

    /// Log output format.
    #[arg(long, value_enum, env = "TINYFS_LOG_FORMAT", default_value_t = LogFormatArg::Pretty)]
    pub log_format: LogFormatArg,

    /// Log filter directive; `RUST_LOG` takes precedence when set.
    #[arg(long, env = "TINYFS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Returns the logging configuration.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig::default()
            .with_level(self.log_level.clone())
            .with_format(self.log_format.into())
    }

    /// Builds the server configuration from the process environment.
    #[must_use]
    pub fn server_config(&self, storage_root: PathBuf) -> ServerConfig {
        self.server_config_from(storage_root, |key| std::env::var(key).ok())
    }

    /// Builds the server configuration with an explicit environment lookup.
    pub fn server_config_from<F>(&self, storage_root: PathBuf, lookup: F) -> ServerConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = ServerConfig::builder()
            .storage_root(storage_root)
            .with_overrides_from(lookup);

        if let Some(address) = &self.address {
            builder = builder.address(address.clone());
        }
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let Some(ms) = self.poll_ms {
            builder = builder.shutdown_poll_interval(std::time::Duration::from_millis(ms));
        }
        if let Some(mb) = self.max_file_mb {
            builder = builder.max_file_size_mb(mb);
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use std::time::Duration;
    use tinyfs_server::{megabytes, DEFAULT_ADDRESS, DEFAULT_PORT};

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_storage_is_required() {
        let err = Cli::try_parse_from(["tinyfs"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_help_flag() {
        let err = Cli::try_parse_from(["tinyfs", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn test_short_storage_flag() {
        let cli = Cli::try_parse_from(["tinyfs", "-s", "/srv/files"]).unwrap();
        assert_eq!(cli.storage, PathBuf::from("/srv/files"));
        assert!(cli.port.is_none());
    }

    #[test]
    fn test_defaults_without_overrides() {
        let cli = Cli::try_parse_from(["tinyfs", "--storage", "data"]).unwrap();
        let config = cli.server_config_from(PathBuf::from("/abs/data"), no_env);

        assert_eq!(config.address(), DEFAULT_ADDRESS);
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(config.shutdown_poll_interval(), Duration::from_millis(100));
        assert_eq!(config.max_file_size(), megabytes(100));
        assert_eq!(config.storage_root(), std::path::Path::new("/abs/data"));
    }

    #[test]
    fn test_env_overrides_defaults() {
        let cli = Cli::try_parse_from(["tinyfs", "-s", "data"]).unwrap();
        let config = cli.server_config_from(PathBuf::from("data"), |key| match key {
            "TINYFS_PORT" => Some("9000".to_string()),
            "TINYFS_MAX_FILE_MB" => Some("2".to_string()),
            _ => None,
        });

        assert_eq!(config.port(), 9000);
        assert_eq!(config.max_file_size(), megabytes(2));
    }

    #[test]
    fn test_cli_overrides_env() {
        let cli = Cli::try_parse_from([
            "tinyfs",
            "-s",
            "data",
            "--port",
            "7000",
            "--address",
            "127.0.0.1",
            "--poll-ms",
            "25",
        ])
        .unwrap();
        let config = cli.server_config_from(PathBuf::from("data"), |key| match key {
            "TINYFS_PORT" => Some("9000".to_string()),
            "TINYFS_ADDRESS" => Some("10.0.0.1".to_string()),
            _ => None,
        });

        assert_eq!(config.port(), 7000);
        assert_eq!(config.address(), "127.0.0.1");
        assert_eq!(config.shutdown_poll_interval(), Duration::from_millis(25));
    }

    #[test]
    fn test_rejects_zero_poll_interval() {
        let err = Cli::try_parse_from(["tinyfs", "-s", "d", "--poll-ms", "0"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_log_format_arg() {
        let cli = Cli::try_parse_from(["tinyfs", "-s", "d", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_config().format, LogFormat::Json);

        let err = Cli::try_parse_from(["tinyfs", "-s", "d", "--log-format", "xml"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_command_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
