//! Demo error types.

use ambit_core::{ControllerError, MethodError, ViewError};
use thiserror::Error;

/// Failures of the browser outside the controller core.
#[derive(Debug, Error)]
pub enum DemoError {
    /// Config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    FileSystem {
        /// Config path.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`DemoConfig`](crate::config::DemoConfig).
    #[error("failed to parse config file {path}: {message}")]
    Configuration {
        /// Config path.
        path: String,
        /// Parser message.
        message: String,
    },

    /// A posts source failed.
    #[error("fetching r/{reddit} failed: {message}")]
    Fetch {
        /// Subreddit requested.
        reddit: String,
        /// Failure description.
        message: String,
    },

    /// Mounting failed.
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// Rendering failed.
    #[error(transparent)]
    View(#[from] ViewError),

    /// A controller method rejected.
    #[error(transparent)]
    Method(#[from] MethodError),
}

impl From<DemoError> for MethodError {
    fn from(error: DemoError) -> Self {
        match error {
            DemoError::Method(error) => error,
            other => MethodError::failed(other),
        }
    }
}
