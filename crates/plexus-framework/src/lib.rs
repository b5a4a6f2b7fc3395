//! # Plexus Framework
//!
//! Loosely bound calls between plugins that never import each other.
//!
//! This layer provides:
//! - **Methods**: synchronous calls answered by any number of prioritised
//!   providers, combined by a [`DispatchPolicy`] ([`Method`])
//! - **Channels**: asynchronous broadcast to every subscriber, scheduled
//!   through a [`Dispatcher`](plexus_core::Dispatcher) ([`Channel`])
//! - **Subscriptions**: RAII handles that own a registration ([`Subscription`])
//! - **Registry**: one shared method or channel per declared tag type
//!   ([`Registry`], [`method_decl!`], [`channel_decl!`])

mod macros;

pub mod channel;
pub mod error;
pub mod method;
pub mod policy;
pub mod registry;
pub mod subscription;

mod slot;

pub use channel::{Channel, SubscriberOutcome};
pub use error::{EntryKind, MethodError, MethodResult, RegistryError, RegistryResult};
pub use method::Method;
pub use policy::{ChannelPolicy, CollectAll, DispatchPolicy, DropErrors, FirstSuccess};
pub use registry::{ChannelDecl, ChannelOf, MethodDecl, MethodOf, Registry};
pub use subscription::Subscription;

/// Prelude for common imports.
pub mod prelude {
    pub use super::channel::Channel;
    pub use super::method::Method;
    pub use super::policy::{CollectAll, DropErrors, FirstSuccess};
    pub use super::registry::{ChannelDecl, MethodDecl, Registry};
    pub use super::subscription::Subscription;
    pub use crate::{channel_decl, method_decl};
}
