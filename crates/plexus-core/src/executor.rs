//! Executor bindings over the [`PriorityQueue`].
//!
//! A [`PriorityExecutor`] is a small value that pairs a queue with a priority.
//! It is the shape host async-task code expects from an executor: three
//! submission verbs, work-tracking hooks, and identity comparison.
//!
//! All three verbs behave the same way: they queue the task at the bound
//! priority. [`dispatch`](PriorityExecutor::dispatch) in particular never runs
//! the task inline, even when called from inside a drain. Every task's
//! execution point is decided by the run loop alone.

use std::sync::Arc;

use tracing::trace;

use crate::priority::Priority;
use crate::queue::PriorityQueue;

/// Capability interface required from an executor by host task code.
///
/// Two executors compare equal when submitting to either one is
/// indistinguishable.
pub trait Executor: Clone + PartialEq + Send + Sync + 'static {
    /// Requests execution of `function`, possibly immediately.
    fn dispatch<F>(&self, function: F)
    where
        F: FnOnce() + Send + 'static;

    /// Requests deferred execution of `function`.
    fn post<F>(&self, function: F)
    where
        F: FnOnce() + Send + 'static;

    /// Requests deferred execution of `function` as a continuation of the
    /// current task.
    fn defer<F>(&self, function: F)
    where
        F: FnOnce() + Send + 'static;

    /// Called when outstanding work is created against this executor.
    fn on_work_started(&self) {}

    /// Called when outstanding work against this executor completes.
    fn on_work_finished(&self) {}
}

/// A queue reference plus a priority.
///
/// Cheap to clone; carries no state besides the priority and an optional
/// description used in trace output.
#[derive(Clone)]
pub struct PriorityExecutor {
    queue: Arc<PriorityQueue>,
    priority: Priority,
    description: Option<Arc<str>>,
}

impl PriorityExecutor {
    /// Binds `priority` to `queue`.
    pub fn new(queue: Arc<PriorityQueue>, priority: Priority) -> Self {
        Self {
            queue,
            priority,
            description: None,
        }
    }

    /// Attaches a description reported by the work-tracking hooks.
    pub fn with_description(mut self, description: impl Into<Arc<str>>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the queue this executor submits to.
    pub fn context(&self) -> &Arc<PriorityQueue> {
        &self.queue
    }

    /// Returns the bound priority.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Queues `function` at the bound priority. Never runs inline.
    pub fn dispatch<F>(&self, function: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.add(self.priority, function);
    }

    /// Queues `function` at the bound priority.
    pub fn post<F>(&self, function: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.add(self.priority, function);
    }

    /// Queues `function` at the bound priority.
    pub fn defer<F>(&self, function: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.add(self.priority, function);
    }

    /// Work-tracking hook; emits a trace event only.
    pub fn on_work_started(&self) {
        trace!(
            priority = self.priority,
            description = self.description().unwrap_or(""),
            "Work started"
        );
    }

    /// Work-tracking hook; emits a trace event only.
    pub fn on_work_finished(&self) {
        trace!(
            priority = self.priority,
            description = self.description().unwrap_or(""),
            "Work finished"
        );
    }
}

impl Executor for PriorityExecutor {
    fn dispatch<F>(&self, function: F)
    where
        F: FnOnce() + Send + 'static,
    {
        PriorityExecutor::dispatch(self, function);
    }

    fn post<F>(&self, function: F)
    where
        F: FnOnce() + Send + 'static,
    {
        PriorityExecutor::post(self, function);
    }

    fn defer<F>(&self, function: F)
    where
        F: FnOnce() + Send + 'static,
    {
        PriorityExecutor::defer(self, function);
    }

    fn on_work_started(&self) {
        PriorityExecutor::on_work_started(self);
    }

    fn on_work_finished(&self) {
        PriorityExecutor::on_work_finished(self);
    }
}

/// Same queue and same priority. The description does not take part.
impl PartialEq for PriorityExecutor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.queue, &other.queue) && self.priority == other.priority
    }
}

impl Eq for PriorityExecutor {}

impl std::fmt::Debug for PriorityExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityExecutor")
            .field("priority", &self.priority)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Wrapped
// =============================================================================

/// A function bound to an executor.
///
/// Invoking a `Wrapped` queues the function on its executor rather than
/// running it. Created by [`PriorityQueue::wrap`].
pub struct Wrapped<F> {
    executor: PriorityExecutor,
    function: F,
}

impl<F> Wrapped<F> {
    pub(crate) fn new(executor: PriorityExecutor, function: F) -> Self {
        Self { executor, function }
    }

    /// Returns the executor this function is bound to.
    pub fn executor(&self) -> &PriorityExecutor {
        &self.executor
    }

    /// Unbinds and returns the function.
    pub fn into_inner(self) -> F {
        self.function
    }

    /// Queues `function()` on the bound executor.
    pub fn post(self)
    where
        F: FnOnce() + Send + 'static,
    {
        self.call_with(|function| function());
    }

    /// Queues `function(args)` on the bound executor.
    pub fn call<A>(self, args: A)
    where
        F: FnOnce(A) + Send + 'static,
        A: Send + 'static,
    {
        self.call_with(move |function| function(args));
    }

    fn call_with(self, run: impl FnOnce(F) + Send + 'static)
    where
        F: Send + 'static,
    {
        let Self { executor, function } = self;
        let finished = executor.clone();
        executor.on_work_started();
        executor.post(move || {
            run(function);
            finished.on_work_finished();
        });
    }
}

impl<F> std::fmt::Debug for Wrapped<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wrapped")
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}
