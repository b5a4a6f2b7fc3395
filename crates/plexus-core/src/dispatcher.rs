//! The dispatcher seam used by channels to schedule fan-out.
//!
//! A [`Dispatcher`] needs exactly one operation, [`post`](Dispatcher::post):
//! schedule a zero-argument task to run later, on whatever thread the
//! dispatcher drives. Two implementations ship with the core:
//!
//! - [`PriorityExecutor`]: posts into a [`PriorityQueue`](crate::PriorityQueue)
//!   at the executor's priority; the task runs on the next drain.
//! - [`TokioDispatcher`]: spawns the task onto a Tokio runtime.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::trace;

use crate::error::{DispatchError, DispatchResult, Task};
use crate::executor::PriorityExecutor;

/// Schedules tasks for deferred execution.
pub trait Dispatcher: Send + Sync {
    /// Schedules `task` to run later. Must not run it inline.
    fn post(&self, task: Task);
}

/// Shared dispatcher trait object.
pub type BoxedDispatcher = Arc<dyn Dispatcher>;

impl Dispatcher for PriorityExecutor {
    fn post(&self, task: Task) {
        PriorityExecutor::post(self, task);
    }
}

impl<D: Dispatcher + ?Sized> Dispatcher for Arc<D> {
    fn post(&self, task: Task) {
        (**self).post(task);
    }
}

/// Dispatcher that spawns every task onto a Tokio runtime.
///
/// Tasks are plain closures, so each one runs to completion on a runtime
/// worker thread without yielding.
#[derive(Debug, Clone)]
pub struct TokioDispatcher {
    handle: Handle,
}

impl TokioDispatcher {
    /// Creates a dispatcher for the given runtime.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Creates a dispatcher for the runtime the caller is running in.
    ///
    /// Fails outside of a Tokio runtime context.
    pub fn current() -> DispatchResult<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| DispatchError::NoRuntime(e.to_string()))
    }

    /// Returns the runtime handle.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }
}

impl Dispatcher for TokioDispatcher {
    fn post(&self, task: Task) {
        trace!("Spawning task on tokio runtime");
        self.handle.spawn(async move { task() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priority::LOW;
    use crate::queue::PriorityQueue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    #[test]
    fn test_priority_executor_posts_into_queue() {
        let queue = Arc::new(PriorityQueue::new());
        let dispatcher: BoxedDispatcher = Arc::new(queue.executor(LOW));
        let counter = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&counter);
        dispatcher.post(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(queue.peek_priority(), Some(LOW));
        queue.execute_all();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_current_fails_outside_runtime() {
        assert!(matches!(
            TokioDispatcher::current(),
            Err(DispatchError::NoRuntime(_))
        ));
    }

    #[tokio::test]
    async fn test_tokio_dispatcher_runs_task() {
        let dispatcher = TokioDispatcher::current().unwrap();
        let (tx, rx) = oneshot::channel();

        dispatcher.post(Box::new(move || {
            let _ = tx.send(42);
        }));

        assert_eq!(rx.await.unwrap(), 42);
    }
}
