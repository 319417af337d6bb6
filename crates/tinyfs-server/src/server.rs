//! The accept loop and server lifecycle.
//!
//! # Architecture
//!
//! - TCP listener bound to the configured address
//! - One task per accepted connection, running [`serve_connection`]
//! - Routing on the blocking pool (see [`Router`])
//! - Cooperative shutdown through a polled [`ShutdownSignal`]
//!
//! The server moves through [`ServerState::Running`],
//! [`ServerState::ShuttingDown`] and [`ServerState::Stopped`], in that order
//! and exactly once each.
//!
//! # Example
//!
//! ```rust,no_run
//! use tinyfs_server::{Server, ServerConfig, ShutdownSignal};
//!
//! # async fn run() -> Result<(), tinyfs_server::ServerError> {
//! let config = ServerConfig::builder().storage_root("./public").build();
//! let server = Server::bind(config).await?;
//! server.run(ShutdownSignal::with_os_signals()?).await
//! # }
//! ```

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::connection::serve_connection;
use crate::error::{ServerError, ServerResult};
use crate::router::Router;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Lifecycle state of a [`Server`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerState {
    /// Listening and accepting connections.
    Running = 0,
    /// Shutdown observed; no new connections, draining in-flight ones.
    ShuttingDown = 1,
    /// Listener closed and in-flight connections finished or abandoned.
    Stopped = 2,
}

impl ServerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Running,
            1 => Self::ShuttingDown,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "running",
            Self::ShuttingDown => "shutting_down",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Read-only view of a server's state, usable after `run` consumed it.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    state: Arc<AtomicU8>,
    local_addr: SocketAddr,
}

impl ServerHandle {
    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ServerState {
        ServerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Returns the address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// The TinyFS HTTP server.
///
/// Created bound and [`ServerState::Running`]; [`Server::run`] drives the
/// accept loop until the shutdown signal is observed.
pub struct Server {
    config: ServerConfig,
    listener: TcpListener,
    router: Arc<Router>,
    state: Arc<AtomicU8>,
    local_addr: SocketAddr,
}

impl Server {
    /// Validates `config` and binds the listening socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the address
    /// cannot be bound.
    pub async fn bind(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let addr = config.socket_addr()?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        tracing::info!(address = %local_addr, "TinyFS HTTP Server starting");
        tracing::info!(storage = %config.storage_root().display(), "Serving files");

        Ok(Self {
            router: Arc::new(Router::from_config(&config)),
            config,
            listener,
            state: Arc::new(AtomicU8::new(ServerState::Running as u8)),
            local_addr,
        })
    }

    /// Returns the address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ServerState {
        ServerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Returns a handle that keeps observing the state after `run`.
    #[must_use]
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            state: Arc::clone(&self.state),
            local_addr: self.local_addr,
        }
    }

    fn set_state(&self, state: ServerState) {
        self.state.store(state as u8, Ordering::SeqCst);
        tracing::debug!(state = %state, "Server state changed");
    }

    /// Accepts connections until `shutdown` is observed, then drains.
    ///
    /// Each accepted connection is handled on its own task; there is no
    /// connection limit and no per-request timeout. Once shutdown is seen
    /// the listener is closed and in-flight connections get up to the
    /// configured drain timeout to finish.
    pub async fn run(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        let tracker = ConnectionTracker::new();
        let poll_interval = self.config.shutdown_poll_interval();

        let stop = shutdown.wait_polling(poll_interval);
        tokio::pin!(stop);

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            if shutdown.is_shutdown() {
                                // Accepted in the race with shutdown: refuse it.
                                drop(stream);
                                break;
                            }

                            let router = Arc::clone(&self.router);
                            let token = tracker.acquire();

                            tokio::spawn(async move {
                                serve_connection(stream, remote_addr, router).await;
                                drop(token);
                            });
                        }
                        Err(e) => {
                            if shutdown.is_shutdown() {
                                break;
                            }
                            tracing::error!(error = %e, "Accept error");
                        }
                    }
                }

                () = &mut stop => {
                    break;
                }
            }
        }

        self.set_state(ServerState::ShuttingDown);
        tracing::info!("Shutting down server...");

        let Self {
            listener, config, state, ..
        } = self;
        drop(listener);

        let drain_timeout = config.drain_timeout();
        let active = tracker.active_connections();
        if active > 0 {
            tracing::info!(
                connections = active,
                timeout_ms = u64::try_from(drain_timeout.as_millis()).unwrap_or(u64::MAX),
                "Waiting for in-flight connections"
            );
        }

        if tokio::time::timeout(drain_timeout, tracker.wait_idle())
            .await
            .is_err()
        {
            tracing::warn!(
                connections = tracker.active_connections(),
                "Drain timeout reached, abandoning connections"
            );
        }

        state.store(ServerState::Stopped as u8, Ordering::SeqCst);
        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", &self.local_addr)
            .field("state", &self.state())
            .field("storage_root", &self.config.storage_root())
            .finish_non_exhaustive()
    }
}

/// Number of runtime worker threads: the available hardware parallelism.
#[must_use]
pub fn worker_threads() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}
