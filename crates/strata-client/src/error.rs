//! Error types for the strata client

use crate::config::ConfigError;
use crate::transport::TransportError;
use thiserror::Error;

/// Client error type
#[derive(Error, Debug)]
pub enum ClientError {
    /// The transport failed or the server rejected the request
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
