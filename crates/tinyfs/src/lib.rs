//! # TinyFS
//!
//! Command-line front end for the TinyFS static file server.
//!
//! The binary parses arguments, prepares the storage directory, installs
//! logging and then drives a [`tinyfs_server::Server`] on a multi-threaded
//! runtime sized to the machine until SIGINT or SIGTERM arrives.

#![doc(html_root_url = "https://docs.rs/tinyfs/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod bootstrap;
pub mod cli;

use std::time::Duration;

use anyhow::{Context, Result};
use tinyfs_server::{worker_threads, Server, ShutdownSignal};

pub use cli::Cli;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How long runtime shutdown waits for blocking-pool threads.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs the server until shutdown.
///
/// Returns once the server reached the stopped state and the runtime has
/// shut down. The async worker threads are joined. Blocking-pool threads
/// still routing a request (only possible for connections abandoned at the
/// drain timeout) get [`RUNTIME_SHUTDOWN_TIMEOUT`] and are then detached,
/// not joined.
///
/// # Errors
///
/// Returns an error for fatal startup failures: the storage directory
/// cannot be prepared, the runtime cannot start, signal handlers cannot be
/// registered or the listening socket cannot be bound.
pub fn run(cli: &Cli) -> Result<()> {
    let storage_root = bootstrap::prepare_storage(&cli.storage)?;
    let config = cli.server_config(storage_root);

    let workers = worker_threads();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .thread_name("tinyfs-worker")
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    tracing::info!(workers, version = VERSION, "Starting TinyFS");

    let result = runtime.block_on(async {
        let shutdown =
            ShutdownSignal::with_os_signals().context("Failed to register signal handlers")?;
        let server = Server::bind(config).await?;
        server.run(shutdown).await?;
        Ok::<_, anyhow::Error>(())
    });

    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    tracing::debug!("Runtime shut down");

    result
}
