//! Errors raised while assembling the player core.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid tuning or logging setup.
    #[error("Invalid player configuration: {0}")]
    Config(String),

    /// A required host bridge was not injected.
    #[error("Host bridge missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// The fallback SQLite store could not be opened.
    #[error("Default store at {} unavailable: {message}", path.display())]
    DefaultStore { path: PathBuf, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Missing bridges are programming errors in the host, not runtime faults.
    pub fn is_capability_missing(&self) -> bool {
        matches!(self, Error::CapabilityMissing { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
