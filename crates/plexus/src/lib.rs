//! # Plexus
//!
//! A decoupled, priority-scheduled plugin framework for Rust.
//!
//! ## Overview
//!
//! Plugins in a Plexus application never import each other. They meet on
//! *methods* (synchronous calls with any number of prioritised providers) and
//! *channels* (asynchronous broadcasts), both looked up by tag type in a
//! shared registry. Deferred work runs from a single priority queue that the
//! application drains from its own loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  invoke   ┌──────────────┐  providers (lowest priority first)
//! │ plugin A │──────────▶│  Method<T>   │──────────▶ plugin B, plugin C …
//! └──────────┘           └──────────────┘
//! ┌──────────┐  publish  ┌──────────────┐  post   ┌───────────────┐  drain  ┌──────────┐
//! │ plugin A │──────────▶│  Channel<T>  │────────▶│ PriorityQueue │◀────────│ run loop │
//! └──────────┘           └──────────────┘         └───────┬───────┘         └──────────┘
//!                                                         └──▶ subscribers
//! ```
//!
//! - **Core**: priority queue, executor bindings, dispatcher seam
//! - **Framework**: methods, channels, subscriptions, registry
//! - **Runtime**: host assembly, configuration, logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use plexus::prelude::*;
//!
//! method_decl!(pub fn Balance(String) -> u64);
//! channel_decl!(pub NewBlock: u64);
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = Host::builder().build()?;
//!
//!     let _provider = host
//!         .method::<Balance>()?
//!         .register(|(who,): &(String,)| Ok::<_, BoxError>(who.len() as u64));
//!     let _listener = host
//!         .channel::<NewBlock>()?
//!         .subscribe(|height: &u64| info!(height, "New block"));
//!
//!     host.channel::<NewBlock>()?.publish(&1);
//!     host.queue().execute_all();
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use plexus_core as core;
pub use plexus_framework as framework;
pub use plexus_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use plexus::prelude::*;
/// ```
pub mod prelude {
    // Host - main entry point
    pub use plexus_runtime::{Host, HostBuilder, HostError, PlexusConfig};

    // Scheduling
    pub use plexus_core::priority::{self, HIGH, LOW, MEDIUM};
    pub use plexus_core::{
        BoxError, Dispatcher, Executor, Priority, PriorityExecutor, PriorityQueue,
        TokioDispatcher,
    };

    // Methods, channels and their declarations
    pub use plexus_framework::{
        Channel, ChannelDecl, CollectAll, DropErrors, FirstSuccess, Method, MethodDecl,
        MethodError, Subscription, channel_decl, method_decl,
    };

    // Logging macros
    pub use plexus_runtime::prelude::*;
}
