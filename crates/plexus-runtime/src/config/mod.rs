//! Configuration module for the Plexus runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for logging and task scheduling options.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    ChannelDispatch, ExecutorConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, PlexusConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
