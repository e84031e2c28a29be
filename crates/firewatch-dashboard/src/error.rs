//! Error types for the dashboard binary.
//!
//! [`DashboardError`] wraps every failure mode of startup and shutdown so
//! the wiring code can propagate with `?`.

/// Top-level error for the dashboard binary.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: firewatch_sync::ConfigError,
    },

    /// The observer API server failed.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: firewatch_observer::ServerError,
    },

    /// The observer task panicked or was cancelled.
    #[error("observer task failed: {message}")]
    ObserverTask {
        /// Description of the join failure.
        message: String,
    },

    /// Installing the shutdown signal handler failed.
    #[error("signal error: {message}")]
    Signal {
        /// Description of the signal failure.
        message: String,
    },
}
