//! Type-erased registry of every method and channel in an application.
//!
//! Methods and channels are identified by zero-sized *tag* types that carry
//! the entry's signature as associated types. The registry creates each entry
//! the first time its tag is looked up and hands out the same shared instance
//! from then on, so plugins that never import each other still meet on the
//! same [`Method`] or [`Channel`].
//!
//! ```rust,ignore
//! use plexus_framework::{Registry, method_decl, channel_decl};
//!
//! method_decl!(pub fn Balance(String) -> u64);
//! channel_decl!(pub NewBlock: u64);
//!
//! let registry = Registry::new(dispatcher);
//! let _p = registry.method::<Balance>()?.register(|(who,): &(String,)| lookup(who));
//! registry.channel::<NewBlock>()?.publish(&42);
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use plexus_core::BoxedDispatcher;
use tracing::debug;

use crate::channel::Channel;
use crate::error::{EntryKind, RegistryError, RegistryResult};
use crate::method::Method;
use crate::policy::{ChannelPolicy, DispatchPolicy};

/// Declares a method tag: its argument tuple, success type and policy.
///
/// Usually implemented through [`method_decl!`](crate::method_decl).
pub trait MethodDecl: 'static {
    /// Argument tuple passed to every provider.
    type Args: 'static;
    /// Value a successful provider returns.
    type Output: 'static;
    /// How provider outcomes are combined.
    type Policy: DispatchPolicy<Self::Output> + Default;
}

/// Declares a channel tag: its payload type and delivery policy.
///
/// Usually implemented through [`channel_decl!`](crate::channel_decl).
pub trait ChannelDecl: 'static {
    /// Payload carried by each publish.
    type Data: Send + Sync + 'static;
    /// How subscriber outcomes are handled.
    type Policy: ChannelPolicy + Default;
}

/// The [`Method`] type a tag resolves to.
pub type MethodOf<T> =
    Method<<T as MethodDecl>::Args, <T as MethodDecl>::Output, <T as MethodDecl>::Policy>;

/// The [`Channel`] type a tag resolves to.
pub type ChannelOf<T> = Channel<<T as ChannelDecl>::Data, <T as ChannelDecl>::Policy>;

struct Entry {
    kind: EntryKind,
    instance: Arc<dyn Any + Send + Sync>,
}

/// Owns every method and channel, keyed by tag type.
pub struct Registry {
    dispatcher: BoxedDispatcher,
    entries: RwLock<HashMap<TypeId, Entry>>,
}

impl Registry {
    /// Creates an empty registry. Channels it creates schedule fan-out
    /// through `dispatcher`.
    pub fn new(dispatcher: BoxedDispatcher) -> Self {
        Self {
            dispatcher,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the method declared by tag `T`, creating it on first use.
    pub fn method<T: MethodDecl>(&self) -> RegistryResult<Arc<MethodOf<T>>> {
        self.lookup::<T, MethodOf<T>>(EntryKind::Method, || {
            MethodOf::<T>::new().named(short_name::<T>())
        })
    }

    /// Returns the channel declared by tag `T`, creating it on first use.
    pub fn channel<T: ChannelDecl>(&self) -> RegistryResult<Arc<ChannelOf<T>>> {
        let dispatcher = Arc::clone(&self.dispatcher);
        self.lookup::<T, ChannelOf<T>>(EntryKind::Channel, || {
            ChannelOf::<T>::new(dispatcher).named(short_name::<T>())
        })
    }

    /// Returns `true` if an entry exists for tag `T`.
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.read().contains_key(&TypeId::of::<T>())
    }

    /// Returns the dispatcher handed to new channels.
    pub fn dispatcher(&self) -> &BoxedDispatcher {
        &self.dispatcher
    }

    /// Returns the number of entries created so far.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if no entry has been created.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops every entry.
    ///
    /// Shared handles obtained earlier stay usable but are no longer reachable
    /// through the registry; the next lookup creates a fresh entry.
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.entries.write());
        debug!(entries = removed.len(), "Registry cleared");
    }

    fn lookup<T, E>(&self, kind: EntryKind, create: impl FnOnce() -> E) -> RegistryResult<Arc<E>>
    where
        T: 'static,
        E: Send + Sync + 'static,
    {
        let key = TypeId::of::<T>();

        if let Some(entry) = self.entries.read().get(&key) {
            return downcast::<T, E>(entry, kind);
        }

        let mut entries = self.entries.write();
        let entry = entries.entry(key).or_insert_with(|| {
            debug!(tag = type_name::<T>(), %kind, "Registry entry created");
            Entry {
                kind,
                instance: Arc::new(create()),
            }
        });
        downcast::<T, E>(entry, kind)
    }
}

fn downcast<T: 'static, E: Send + Sync + 'static>(
    entry: &Entry,
    requested: EntryKind,
) -> RegistryResult<Arc<E>> {
    Arc::clone(&entry.instance)
        .downcast::<E>()
        .map_err(|_| RegistryError::TagMismatch {
            tag: type_name::<T>(),
            registered: entry.kind,
            requested,
        })
}

/// The tag's type name without its module path, used as the entry's log name.
///
/// Generic arguments are kept as written: `a::Foo<b::Bar>` becomes `Foo<b::Bar>`.
fn short_name<T>() -> &'static str {
    strip_path(type_name::<T>())
}

fn strip_path(full: &'static str) -> &'static str {
    let base = full.find('<').map_or(full, |generics| &full[..generics]);
    let start = base.rfind("::").map_or(0, |sep| sep + 2);
    &full[start..]
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}
