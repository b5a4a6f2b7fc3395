//! Plexus Runtime - host assembly for the Plexus plugin framework.
//!
//! This crate provides:
//! - Host assembly: one task queue plus one registry ([`Host`], [`HostBuilder`])
//! - Layered configuration via figment ([`ConfigLoader`], [`PlexusConfig`])
//! - Logging configuration ([`LoggingBuilder`], [`logging::init_from_config`])
//!
//! # Configuration
//!
//! ```toml
//! # plexus.toml
//! [logging]
//! level = "info"
//! format = "compact"
//!
//! [logging.filters]
//! plexus_framework = "debug"
//!
//! [executor]
//! channel_dispatch = "queue"   # or "tokio"
//! channel_priority = 50
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod logging;

pub use config::{
    ChannelDispatch, ConfigError, ConfigLoader, ConfigResult, ExecutorConfig, LoggingConfig,
    PlexusConfig,
};
pub use error::{HostError, HostResult};
pub use host::{Host, HostBuilder};
pub use logging::{LoggingBuilder, SpanEvents};

// Re-export tracing for use by plugins
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}
