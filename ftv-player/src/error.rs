//! Error types for ftv-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for ftv-player
#[derive(Error, Debug)]
pub enum Error {
    /// Errors from the shared library (configuration, I/O)
    #[error(transparent)]
    Common(#[from] ftv_common::Error),

    /// Channel name not present in the configured channel list
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    /// Player widget could not be created or refused a request
    #[error("Player error: {0}")]
    Player(String),

    /// Metadata lookup over HTTP failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The controller task is no longer running
    #[error("Controller closed")]
    ControllerClosed,
}

/// Convenience Result type using ftv-player Error
pub type Result<T> = std::result::Result<T, Error>;
