//! Runtime error types.

use plexus_core::DispatchError;
use plexus_framework::RegistryError;
use thiserror::Error;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors that can occur while assembling or using a [`Host`](crate::Host).
#[derive(Error, Debug)]
pub enum HostError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A registry lookup failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Tokio channel dispatch was requested outside a Tokio runtime.
    #[error("Channel dispatcher unavailable: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;
