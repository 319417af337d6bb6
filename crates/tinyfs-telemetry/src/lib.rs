//! Logging setup for TinyFS.
//!
//! Every crate in the workspace logs through `tracing` macros with
//! structured fields. This crate owns the one place where a subscriber is
//! installed, so the binary decides the output format and level while the
//! libraries stay subscriber-agnostic.
//!
//! # Example
//!
//! ```rust,no_run
//! use tinyfs_telemetry::{init_logging, LogConfig, LogFormat};
//!
//! let config = LogConfig::default()
//!     .with_level("debug")
//!     .with_format(LogFormat::Json);
//!
//! init_logging(&config).expect("Failed to init logging");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
