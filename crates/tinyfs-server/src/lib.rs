//! # TinyFS Server
//!
//! Static file HTTP server engine for TinyFS.
//!
//! This crate provides everything below the command line:
//!
//! - HTTP/1.1 via Hyper, one request per connection
//! - Mapping request targets onto a storage root
//! - Directory listings and `index.html` fallback
//! - Extension-based MIME resolution
//! - Graceful shutdown with connection draining
//!
//! ## Example
//!
//! ```rust,no_run
//! use tinyfs_server::{Server, ServerConfig, ShutdownSignal};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::builder()
//!         .storage_root("/srv/files")
//!         .with_env_overrides()
//!         .build();
//!
//!     let server = Server::bind(config).await?;
//!     server.run(ShutdownSignal::with_os_signals()?).await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/tinyfs-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod connection;
mod error;
pub mod listing;
pub mod mime;
pub mod reader;
pub mod response;
mod router;
mod server;
mod shutdown;

pub use config::{
    megabytes, ServerConfig, ServerConfigBuilder, DEFAULT_ADDRESS, DEFAULT_DRAIN_TIMEOUT_SECS,
    DEFAULT_MAX_FILE_SIZE_MB, DEFAULT_PORT, DEFAULT_SHUTDOWN_POLL_MS, ENV_ADDRESS,
    ENV_MAX_FILE_MB, ENV_POLL_MS, ENV_PORT,
};
pub use connection::serve_connection;
pub use error::{ReadError, ServerError, ServerResult};
pub use router::{Router, INDEX_FILE};
pub use server::{worker_threads, Server, ServerHandle, ServerState};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
