//! Error types for the TinyFS server.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop the server from starting or running.
///
/// Per-request failures never surface here; the router turns them into
/// HTTP responses.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address could not be parsed.
    #[error("Invalid address '{addr}': {source}")]
    InvalidAddress {
        /// The address string that failed to parse.
        addr: String,
        /// Underlying parse error.
        #[source]
        source: std::net::AddrParseError,
    },

    /// Failed to bind the listening socket.
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        /// The address we tried to bind.
        addr: std::net::SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error during server operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Reasons a bounded file read can fail.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The file could not be opened.
    #[error("Failed to open file {path}: {source}")]
    Open {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file size could not be determined.
    #[error("Failed to get file size for {path}: {source}")]
    Metadata {
        /// File whose metadata failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is larger than the configured maximum.
    #[error("File too large: {path} ({size} bytes, max {max} bytes)")]
    TooLarge {
        /// Oversized file.
        path: PathBuf,
        /// Actual size in bytes.
        size: u64,
        /// Configured limit in bytes.
        max: u64,
    },

    /// Reading the contents failed part-way.
    #[error("Failed to read file {path}: {source}")]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
