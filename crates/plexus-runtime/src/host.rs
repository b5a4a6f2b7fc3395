//! The [`Host`]: one task queue plus one registry, wired from configuration.
//!
//! The host owns no run loop. The embedding application decides when to
//! drain [`Host::queue`], typically once per frame or tick:
//!
//! ```rust,ignore
//! use plexus_runtime::Host;
//!
//! let host = Host::builder().profile("production").build()?;
//! let _p = host.method::<Balance>()?.register(|(who,): &(String,)| lookup(who));
//!
//! loop {
//!     host.queue().execute_all();
//! }
//! ```

use std::sync::Arc;

use plexus_core::{BoxedDispatcher, Priority, PriorityExecutor, PriorityQueue, TokioDispatcher};
use plexus_framework::{ChannelDecl, ChannelOf, MethodDecl, MethodOf, Registry};
use tracing::info;

use crate::config::{ChannelDispatch, ConfigLoader, PlexusConfig};
use crate::error::HostResult;
use crate::logging;

/// A task queue and the method/channel registry that schedules onto it.
pub struct Host {
    config: PlexusConfig,
    queue: Arc<PriorityQueue>,
    registry: Registry,
}

impl Host {
    /// Creates a host from an owned configuration.
    ///
    /// Initializes logging from `config.logging` unless a subscriber is
    /// already installed. Fails if Tokio channel dispatch is configured and
    /// the caller is not inside a Tokio runtime.
    pub fn new(config: PlexusConfig) -> HostResult<Self> {
        logging::init_from_config(&config.logging);

        let queue = Arc::new(PriorityQueue::new());
        let dispatcher: BoxedDispatcher = match config.executor.channel_dispatch {
            ChannelDispatch::Queue => {
                Arc::new(queue.executor(config.executor.channel_priority))
            }
            ChannelDispatch::Tokio => Arc::new(TokioDispatcher::current()?),
        };

        info!(
            log_level = %config.logging.level,
            channel_dispatch = ?config.executor.channel_dispatch,
            channel_priority = config.executor.channel_priority,
            "Host initialized from configuration"
        );

        Ok(Self {
            config,
            queue,
            registry: Registry::new(dispatcher),
        })
    }

    /// Creates a host from a borrowed configuration.
    pub fn from_config(config: &PlexusConfig) -> HostResult<Self> {
        Self::new(config.clone())
    }

    /// Creates a builder that loads configuration before assembling the host.
    pub fn builder() -> HostBuilder {
        HostBuilder::new()
    }

    /// Returns the configuration the host was built from.
    pub fn config(&self) -> &PlexusConfig {
        &self.config
    }

    /// Returns the task queue. Draining it is the caller's job.
    pub fn queue(&self) -> &Arc<PriorityQueue> {
        &self.queue
    }

    /// Returns the method and channel registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the method declared by tag `T`.
    pub fn method<T: MethodDecl>(&self) -> HostResult<Arc<MethodOf<T>>> {
        Ok(self.registry.method::<T>()?)
    }

    /// Returns the channel declared by tag `T`.
    pub fn channel<T: ChannelDecl>(&self) -> HostResult<Arc<ChannelOf<T>>> {
        Ok(self.registry.channel::<T>()?)
    }

    /// Queues `function` at `priority`.
    pub fn post<F>(&self, priority: Priority, function: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.add(priority, function);
    }

    /// Returns an executor bound to the host's queue at `priority`.
    pub fn executor(&self, priority: Priority) -> PriorityExecutor {
        self.queue.executor(priority)
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("queued", &self.queue.len())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// HostBuilder
// =============================================================================

/// Builder for a [`Host`] with configuration loaded through [`ConfigLoader`].
///
/// ```rust,ignore
/// let host = Host::builder()
///     .config_file("config/plexus.toml")
///     .without_env()
///     .build()?;
/// ```
pub struct HostBuilder {
    config_loader: ConfigLoader,
}

impl HostBuilder {
    /// Creates a builder that searches the default locations.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration values programmatically.
    pub fn merge(mut self, config: PlexusConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads the configuration and builds the host.
    pub fn build(self) -> HostResult<Host> {
        let config = self.config_loader.load()?;
        Host::new(config)
    }
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self::new()
    }
}
