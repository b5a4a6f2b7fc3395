//! Methods: synchronous, multi-provider calls between plugins.
//!
//! A [`Method`] lets one plugin call functionality another plugin provides
//! without either knowing about the other. Providers register with a
//! priority; **lower priority values are tried first** (the opposite direction
//! from the task queue, where higher runs first). Invocation runs on the
//! caller's thread and returns whatever the method's [`DispatchPolicy`]
//! makes of the providers' outcomes.
//!
//! ```rust,ignore
//! use plexus_core::BoxError;
//! use plexus_framework::Method;
//!
//! let validate: Method<(String,), bool> = Method::new();
//!
//! let _strict = validate.register_provider(
//!     |(input,): &(String,)| {
//!         if input.is_empty() { Err("empty input") } else { Ok(true) }
//!     },
//!     0,
//! );
//! let _lenient = validate.register_provider(|_: &(String,)| Ok::<_, BoxError>(false), 10);
//!
//! assert_eq!(validate.invoke(&("".into(),)), Ok(false));
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use plexus_core::{BoxError, Priority};
use tracing::debug;

use crate::policy::{DispatchPolicy, FirstSuccess};
use crate::slot::SlotList;
use crate::subscription::Subscription;

type ProviderFn<Args, R> = dyn Fn(&Args) -> Result<R, BoxError> + Send + Sync;

/// A loosely bound application-level function with any number of providers.
///
/// - `Args`: the argument tuple passed (by reference) to every provider
/// - `R`: what a successful provider returns
/// - `P`: the [`DispatchPolicy`], [`FirstSuccess`] by default
pub struct Method<Args, R, P = FirstSuccess> {
    name: &'static str,
    providers: Arc<SlotList<ProviderFn<Args, R>>>,
    policy: RwLock<P>,
}

impl<Args, R, P> Method<Args, R, P>
where
    Args: 'static,
    R: 'static,
    P: DispatchPolicy<R>,
{
    /// Creates a method with the default policy.
    pub fn new() -> Self
    where
        P: Default,
    {
        Self::with_policy(P::default())
    }

    /// Creates a method with an explicit policy value.
    pub fn with_policy(policy: P) -> Self {
        Self {
            name: "method",
            providers: SlotList::new(),
            policy: RwLock::new(policy),
        }
    }

    /// Sets the name reported in log output.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Returns the name reported in log output.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registers `provider` at `priority`; lower priorities are tried first.
    ///
    /// Providers with equal priority are tried in registration order. The
    /// provider stays registered until the returned handle is unregistered or
    /// dropped.
    pub fn register_provider<F, E>(&self, provider: F, priority: Priority) -> Subscription
    where
        F: Fn(&Args) -> Result<R, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let boxed: Box<ProviderFn<Args, R>> =
            Box::new(move |args: &Args| provider(args).map_err(Into::into));
        let handle = self.providers.connect(priority, boxed);
        debug!(method = self.name, priority, "Provider registered");
        handle
    }

    /// Registers `provider` at priority `0`.
    pub fn register<F, E>(&self, provider: F) -> Subscription
    where
        F: Fn(&Args) -> Result<R, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.register_provider(provider, 0)
    }

    /// Calls the method on the current thread.
    ///
    /// Providers run lazily in priority order as the policy asks for them.
    /// A provider that unregisters itself or a sibling during the call is
    /// honoured: entries disconnected before their turn are skipped.
    pub fn invoke(&self, args: &Args) -> P::Output {
        let policy = self.policy.read().clone();
        let calls = self
            .providers
            .live()
            .map(move |slot| (slot.callback())(args));
        policy.dispatch(calls)
    }

    /// Returns `true` if at least one provider is registered.
    pub fn has_providers(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Returns the number of registered providers.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Replaces the dispatch policy used by subsequent invocations.
    pub fn set_policy(&self, policy: P) {
        *self.policy.write() = policy;
    }

    /// Returns a copy of the current dispatch policy.
    pub fn policy(&self) -> P {
        self.policy.read().clone()
    }

    /// Disconnects every provider. Outstanding handles become inert.
    pub fn clear(&self) {
        self.providers.clear();
    }
}

impl<Args, R, P> Default for Method<Args, R, P>
where
    Args: 'static,
    R: 'static,
    P: DispatchPolicy<R> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Args, R, P> std::fmt::Debug for Method<Args, R, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
