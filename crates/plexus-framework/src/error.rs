//! Error types for the Plexus framework.

use thiserror::Error;

/// Errors surfaced by method invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MethodError {
    /// Every provider failed, or none is registered.
    ///
    /// `diagnostics` holds each provider's error text in visitation order.
    #[error(
        "No Result Available, All providers returned exceptions[{}]",
        .diagnostics.join("\",\"")
    )]
    NoResult {
        /// Per-provider error messages, in the order providers were tried.
        diagnostics: Vec<String>,
    },
}

impl MethodError {
    /// Returns the collected per-provider diagnostics.
    pub fn diagnostics(&self) -> &[String] {
        match self {
            Self::NoResult { diagnostics } => diagnostics,
        }
    }
}

/// What a registry entry was created as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A [`Method`](crate::Method).
    Method,
    /// A [`Channel`](crate::Channel).
    Channel,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Method => f.write_str("method"),
            Self::Channel => f.write_str("channel"),
        }
    }
}

/// Errors raised by [`Registry`](crate::Registry) lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The tag already names an entry of a different type.
    #[error("tag '{tag}' is registered as a {registered}, requested as a {requested}")]
    TagMismatch {
        /// Type name of the tag.
        tag: &'static str,
        /// What the existing entry was created as.
        registered: EntryKind,
        /// What the caller asked for.
        requested: EntryKind,
    },
}

/// Result type for method invocation under the default policy.
pub type MethodResult<T> = Result<T, MethodError>;

/// Result type for registry lookups.
pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_result_message_joins_diagnostics() {
        let err = MethodError::NoResult {
            diagnostics: vec!["disk full".into(), "timeout".into()],
        };
        assert_eq!(
            err.to_string(),
            "No Result Available, All providers returned exceptions[disk full\",\"timeout]"
        );
    }

    #[test]
    fn test_no_result_message_empty() {
        let err = MethodError::NoResult {
            diagnostics: Vec::new(),
        };
        assert_eq!(
            err.to_string(),
            "No Result Available, All providers returned exceptions[]"
        );
        assert!(err.diagnostics().is_empty());
    }
}
