//! # Plexus Core
//!
//! The scheduling substrate of the Plexus plugin framework.
//!
//! This crate provides:
//! - **Priority Task Queue**: a max-heap of pending callbacks drained
//!   cooperatively by the host's run loop ([`PriorityQueue`])
//! - **Executor bindings**: queue + priority values exposing the
//!   `dispatch` / `post` / `defer` verbs ([`PriorityExecutor`], [`Executor`])
//! - **Dispatcher seam**: the single `post` operation channels schedule their
//!   fan-out through ([`Dispatcher`], [`TokioDispatcher`])
//!
//! ## Scheduling Model
//!
//! Nothing submitted here runs inline. Work waits in the queue until the run
//! loop calls one of the drain operations:
//!
//! ```text
//!  plugin ──dispatch/post/defer──▶ PriorityExecutor ──add──▶ ┌───────────────┐
//!  plugin ─────────────add────────────────────────────────▶ │ PriorityQueue │
//!                                                            └───────┬───────┘
//!  run loop ──execute_all / execute_highest / execute_high──────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use plexus_core::{PriorityQueue, priority};
//!
//! let queue = Arc::new(PriorityQueue::new());
//! let executor = queue.executor(priority::MEDIUM);
//!
//! executor.post(|| println!("later"));
//! queue.add(priority::HIGH, || println!("first"));
//!
//! queue.execute_all();
//! ```

pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod priority;
pub mod queue;

pub use dispatcher::{BoxedDispatcher, Dispatcher, TokioDispatcher};
pub use error::{BoxError, DispatchError, DispatchResult, Task};
pub use executor::{Executor, PriorityExecutor, Wrapped};
pub use priority::Priority;
pub use queue::{PriorityQueue, QueuedTask};

/// Prelude for common imports.
pub mod prelude {
    pub use super::dispatcher::{Dispatcher, TokioDispatcher};
    pub use super::executor::{Executor, PriorityExecutor};
    pub use super::priority::{self, Priority};
    pub use super::queue::PriorityQueue;
}
