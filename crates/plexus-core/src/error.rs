//! Shared error and task types for the Plexus core.

use thiserror::Error;

/// Boxed, thread-safe error carried by providers and subscribers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A type-erased unit of work, executed exactly once.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Errors raised while setting up a dispatcher.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// No Tokio runtime is active on the calling thread.
    #[error("no tokio runtime available: {0}")]
    NoRuntime(String),
}

/// Result type for dispatcher construction.
pub type DispatchResult<T> = Result<T, DispatchError>;
