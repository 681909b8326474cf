//! Error taxonomy shared by every sink and source
//!
//! Errors never cross a dispatch boundary: the dispatcher folds them into a
//! failure record (see [`crate::result`]).

use crate::config::ConfigError;
use crate::sources::capabilities::Feature;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Unknown redis command \"{0}\".")]
    UnknownCommand(String),

    #[error(
        "This platform does not specify whether {0} is supported or not. \
         Please report an issue against this platform's cliconf plugin."
    )]
    CapabilityUndeclared(Feature),

    #[error("Option {0} is not supported on this platform")]
    CapabilityUnsupported(Feature),

    /// The remote answered, but with a status >= 300
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    #[error("{0}")]
    Transport(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DispatchError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// True for errors raised before any external I/O was attempted
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter(_)
                | Self::InvalidParameter { .. }
                | Self::UnknownCommand(_)
                | Self::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
