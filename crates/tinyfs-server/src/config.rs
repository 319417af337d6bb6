//! Server configuration types.
//!
//! Configuration is assembled once at startup and shared read-only by every
//! connection for the lifetime of the process.
//!
//! # Example
//!
//! ```rust
//! use tinyfs_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::builder()
//!     .address("127.0.0.1")
//!     .port(3000)
//!     .shutdown_poll_interval(Duration::from_millis(50))
//!     .build();
//!
//! assert_eq!(config.port(), 3000);
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ServerError, ServerResult};

/// Default bind address.
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8888;

/// Default shutdown poll interval in milliseconds.
pub const DEFAULT_SHUTDOWN_POLL_MS: u64 = 100;

/// Default maximum servable file size in megabytes.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 100;

/// Default time to wait for in-flight connections once shutdown begins.
pub const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the bind address.
pub const ENV_ADDRESS: &str = "TINYFS_ADDRESS";

/// Environment variable overriding the port.
pub const ENV_PORT: &str = "TINYFS_PORT";

/// Environment variable overriding the shutdown poll interval (ms).
pub const ENV_POLL_MS: &str = "TINYFS_POLL_MS";

/// Environment variable overriding the max file size (MB).
pub const ENV_MAX_FILE_MB: &str = "TINYFS_MAX_FILE_MB";

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Converts a size in megabytes to bytes, saturating on overflow.
#[must_use]
pub fn megabytes(mb: u64) -> u64 {
    mb.saturating_mul(BYTES_PER_MB)
}

/// Server configuration.
///
/// Use [`ServerConfig::builder()`] to construct instances.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory files are served from
    storage_root: PathBuf,

    /// Bind address (IP literal)
    address: String,

    /// Listening port
    port: u16,

    /// How often the accept loop checks the shutdown signal
    shutdown_poll_interval: Duration,

    /// Largest file the reader will load, in bytes
    max_file_size: u64,

    /// How long to wait for in-flight connections during shutdown
    drain_timeout: Duration,
}

impl ServerConfig {
    /// Creates a new server configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns the storage root.
    #[must_use]
    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Returns the bind address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the listening port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Parses `address:port` into a `SocketAddr`.
    ///
    /// IPv6 literals are accepted with or without brackets.
    pub fn socket_addr(&self) -> ServerResult<SocketAddr> {
        let host = self.address.trim_start_matches('[').trim_end_matches(']');
        let addr = if host.contains(':') {
            format!("[{}]:{}", host, self.port)
        } else {
            format!("{}:{}", host, self.port)
        };
        addr.parse()
            .map_err(|source| ServerError::InvalidAddress { addr, source })
    }

    /// Returns the shutdown poll interval.
    #[must_use]
    pub fn shutdown_poll_interval(&self) -> Duration {
        self.shutdown_poll_interval
    }

    /// Returns the maximum file size in bytes.
    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Returns the connection drain timeout.
    #[must_use]
    pub fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }

    /// Checks the values the server cannot run with.
    pub fn validate(&self) -> ServerResult<()> {
        if self.address.trim().is_empty() {
            return Err(ServerError::config("bind address cannot be empty"));
        }
        if self.shutdown_poll_interval.is_zero() {
            return Err(ServerError::config(
                "shutdown poll interval must be greater than zero",
            ));
        }
        if self.max_file_size == 0 {
            return Err(ServerError::config(
                "max file size must be greater than zero",
            ));
        }
        if self.storage_root.as_os_str().is_empty() {
            return Err(ServerError::config("storage directory cannot be empty"));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    storage_root: PathBuf,
    address: String,
    port: u16,
    shutdown_poll_interval: Duration,
    max_file_size: u64,
    drain_timeout: Duration,
}

impl ServerConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage_root: PathBuf::from("."),
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            shutdown_poll_interval: Duration::from_millis(DEFAULT_SHUTDOWN_POLL_MS),
            max_file_size: megabytes(DEFAULT_MAX_FILE_SIZE_MB),
            drain_timeout: Duration::from_secs(DEFAULT_DRAIN_TIMEOUT_SECS),
        }
    }

    /// Sets the directory to serve.
    #[must_use]
    pub fn storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = root.into();
        self
    }

    /// Sets the bind address (e.g. "0.0.0.0", "127.0.0.1", "::1").
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Sets the listening port. Port 0 asks the OS for an ephemeral port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets how often the accept loop checks for shutdown.
    #[must_use]
    pub fn shutdown_poll_interval(mut self, interval: Duration) -> Self {
        self.shutdown_poll_interval = interval;
        self
    }

    /// Sets the maximum file size in bytes.
    #[must_use]
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Sets the maximum file size in megabytes.
    #[must_use]
    pub fn max_file_size_mb(mut self, mb: u64) -> Self {
        self.max_file_size = megabytes(mb);
        self
    }

    /// Sets how long shutdown waits for in-flight connections.
    #[must_use]
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Applies `TINYFS_*` overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies `TINYFS_*` overrides from an arbitrary lookup.
    ///
    /// Values that fail to parse are ignored and the current value kept.
    #[must_use]
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = lookup(ENV_ADDRESS) {
            self.address = address;
        }

        if let Some(port) = lookup(ENV_PORT) {
            match port.trim().parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid {}", ENV_PORT),
            }
        }

        if let Some(poll) = lookup(ENV_POLL_MS) {
            match poll.trim().parse::<u64>() {
                Ok(ms) => self.shutdown_poll_interval = Duration::from_millis(ms),
                Err(_) => tracing::warn!(value = %poll, "Ignoring invalid {}", ENV_POLL_MS),
            }
        }

        if let Some(max) = lookup(ENV_MAX_FILE_MB) {
            match max.trim().parse::<u64>() {
                Ok(mb) => self.max_file_size = megabytes(mb),
                Err(_) => tracing::warn!(value = %max, "Ignoring invalid {}", ENV_MAX_FILE_MB),
            }
        }

        self
    }

    /// Builds the [`ServerConfig`].
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            storage_root: self.storage_root,
            address: self.address,
            port: self.port,
            shutdown_poll_interval: self.shutdown_poll_interval,
            max_file_size: self.max_file_size,
            drain_timeout: self.drain_timeout,
        }
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
