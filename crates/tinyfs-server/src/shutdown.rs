//! Graceful shutdown coordination.
//!
//! A [`ShutdownSignal`] is a write-once flag shared by constructor
//! injection: the OS signal listener sets it, the accept loop polls it.
//! In-flight connections are counted by a [`ConnectionTracker`] so the
//! server can wait for them before reporting itself stopped.
//!
//! # Example
//!
//! ```rust
//! use tinyfs_server::ShutdownSignal;
//!
//! let shutdown = ShutdownSignal::new();
//! let observer = shutdown.clone();
//!
//! shutdown.trigger();
//! assert!(observer.is_shutdown());
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

/// A cloneable, write-once shutdown flag.
///
/// All clones observe the same flag. Once set it never resets.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Creates a new, untriggered shutdown signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag. Only the first call has any effect.
    pub fn trigger(&self) {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            tracing::debug!("Shutdown flag set");
        }
    }

    /// Returns `true` if shutdown has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Waits for shutdown by checking the flag every `interval`.
    ///
    /// This is the cooperative observation the accept loop uses: a trigger
    /// is noticed at most one interval late.
    pub async fn wait_polling(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if self.is_shutdown() {
                return;
            }
        }
    }

    /// Creates a signal that is triggered by SIGINT or SIGTERM.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal handlers cannot be registered.
    pub fn with_os_signals() -> std::io::Result<Self> {
        let signal = Self::new();
        let listener = OsSignals::register()?;
        let trigger = signal.clone();

        tokio::spawn(async move {
            listener.wait().await;
            trigger.trigger();
        });

        Ok(signal)
    }
}

/// Registered OS shutdown signal streams.
struct OsSignals {
    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,
}

impl OsSignals {
    fn register() -> std::io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            Ok(Self {
                sigterm: signal(SignalKind::terminate())?,
                sigint: signal(SignalKind::interrupt())?,
            })
        }

        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    async fn wait(self) {
        #[cfg(unix)]
        {
            let Self {
                mut sigterm,
                mut sigint,
            } = self;
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!(signal = "SIGTERM", "Received signal, initiating graceful shutdown");
                }
                _ = sigint.recv() => {
                    tracing::info!(signal = "SIGINT", "Received signal, initiating graceful shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Received Ctrl+C, initiating graceful shutdown"),
                Err(e) => tracing::error!(error = %e, "Failed to wait for Ctrl+C"),
            }
        }
    }
}

/// Counts in-flight connections.
///
/// Each connection holds a [`ConnectionToken`]; dropping the last token
/// wakes anyone in [`ConnectionTracker::wait_idle`].
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl ConnectionTracker {
    /// Creates a new connection tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires a token for one connection.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionToken {
            active: Arc::clone(&self.active),
            notify: Arc::clone(&self.notify),
        }
    }

    /// Returns the number of active connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Waits until no connections are active.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent drop is not missed.
            notified.as_mut().enable();
            if self.active.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// A token representing an active connection.
#[derive(Debug)]
pub struct ConnectionToken {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notify.notify_waiters();
        }
    }
}
