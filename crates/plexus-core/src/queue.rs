//! Priority-ordered cooperative task queue.
//!
//! [`PriorityQueue`] is the single logical sequencer of the framework. Work is
//! submitted with [`add`](PriorityQueue::add) (directly, or through a
//! [`PriorityExecutor`] binding) and runs only when the host's run loop calls
//! one of the three drain operations:
//!
//! | Drain | Behaviour |
//! |-------|-----------|
//! | [`execute_all`](PriorityQueue::execute_all) | run until empty |
//! | [`execute_highest`](PriorityQueue::execute_highest) | run every [`HIGH`] task, then one more |
//! | [`execute_high`](PriorityQueue::execute_high) | run only [`HIGH`] tasks |
//!
//! Higher priority values run first. Among tasks of equal priority the
//! relative order is unspecified (heap order, not insertion order).
//!
//! # Re-entrancy
//!
//! The heap lock is held only long enough to push or pop a single entry. A
//! popped task runs with the lock released, so a task may submit more work to
//! the same queue; that work is visible to the drain call that is running.
//!
//! # Failure
//!
//! The queue does not catch panics. A panicking task unwinds out of the drain
//! call: the task itself is lost, everything still queued stays queued.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use plexus_core::{PriorityQueue, priority};
//!
//! let queue = Arc::new(PriorityQueue::new());
//! queue.add(priority::LOW, || println!("background"));
//! queue.add(priority::HIGH, || println!("urgent"));
//!
//! // Run loop
//! while queue.execute_highest() {
//!     // poll the reactor, then come back
//! }
//! ```

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::Task;
use crate::executor::{PriorityExecutor, Wrapped};
use crate::priority::{HIGH, Priority};

// =============================================================================
// QueuedTask
// =============================================================================

/// A pending callback together with its priority.
///
/// Owned by the queue until executed; executed exactly once, then dropped.
pub struct QueuedTask {
    priority: Priority,
    action: Task,
}

impl QueuedTask {
    /// Creates a queued task from any one-shot closure.
    pub fn new<F>(priority: Priority, action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            priority,
            action: Box::new(action),
        }
    }

    /// Returns the priority this task was queued with.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Consumes the task and runs it.
    pub fn execute(self) {
        (self.action)()
    }
}

// Ordering is by priority only; ties compare equal so the heap is free to
// return them in any order.
impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority)
    }
}

impl std::fmt::Debug for QueuedTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedTask")
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// PriorityQueue
// =============================================================================

/// Max-heap of pending callbacks drained by the host's run loop.
///
/// # Thread Safety
///
/// `PriorityQueue` is `Send + Sync` so that bindings and dispatchers can hold
/// an `Arc` to it, but it is still a single logical sequencer: if several
/// threads drain it at once, priority order only holds per drain call. Hosts
/// that need a global order must run every drain on one thread.
#[derive(Default)]
pub struct PriorityQueue {
    handlers: Mutex<BinaryHeap<QueuedTask>>,
}

impl PriorityQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(BinaryHeap::new()),
        }
    }

    /// Queues `function` at `priority`.
    ///
    /// Never fails and never runs `function` inline.
    pub fn add<F>(&self, priority: Priority, function: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(QueuedTask::new(priority, function));
    }

    /// Queues an already constructed [`QueuedTask`].
    pub fn push(&self, task: QueuedTask) {
        let priority = task.priority();
        self.handlers.lock().push(task);
        trace!(priority, "Task queued");
    }

    /// Runs tasks highest-priority-first until the queue is empty.
    ///
    /// Work queued by a running task is picked up by the same call.
    pub fn execute_all(&self) {
        let mut executed = 0usize;
        while let Some(task) = self.pop() {
            task.execute();
            executed += 1;
        }
        trace!(executed, "execute_all finished");
    }

    /// Runs every task at or above [`HIGH`], then exactly one lower-priority
    /// task if any remains.
    ///
    /// Returns `true` if the queue is still non-empty.
    pub fn execute_highest(&self) -> bool {
        let mut executed = 0usize;
        while let Some(task) = self.pop() {
            let priority = task.priority();
            task.execute();
            executed += 1;
            if priority < HIGH {
                break;
            }
        }
        let remaining = self.len();
        trace!(executed, remaining, "execute_highest finished");
        remaining > 0
    }

    /// Runs only tasks at or above [`HIGH`], leaving the rest queued.
    pub fn execute_high(&self) {
        let mut executed = 0usize;
        while let Some(task) = self.pop_if(|priority| priority >= HIGH) {
            task.execute();
            executed += 1;
        }
        trace!(executed, "execute_high finished");
    }

    /// Returns the number of queued tasks.
    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }

    /// Returns the priority of the task that would run next.
    pub fn peek_priority(&self) -> Option<Priority> {
        self.handlers.lock().peek().map(QueuedTask::priority)
    }

    /// Discards every queued task without running it.
    ///
    /// Returns the number of tasks dropped. Used at shutdown.
    pub fn clear(&self) -> usize {
        let dropped = std::mem::take(&mut *self.handlers.lock());
        let count = dropped.len();
        // Drop outside the lock: captured state may itself touch the queue.
        drop(dropped);
        if count > 0 {
            trace!(count, "Discarded queued tasks");
        }
        count
    }

    /// Creates an executor bound to this queue at `priority`.
    pub fn executor(self: &Arc<Self>, priority: Priority) -> PriorityExecutor {
        PriorityExecutor::new(Arc::clone(self), priority)
    }

    /// Binds `function` to an executor at `priority`.
    ///
    /// Calling the returned [`Wrapped`] queues the function instead of running
    /// it, which makes it suitable as a completion handler for foreign code.
    pub fn wrap<F>(self: &Arc<Self>, priority: Priority, function: F) -> Wrapped<F> {
        Wrapped::new(self.executor(priority), function)
    }

    /// Like [`wrap`](Self::wrap), with a description that is attached to the
    /// executor's work-started and work-finished trace events.
    pub fn wrap_described<F>(
        self: &Arc<Self>,
        priority: Priority,
        description: impl Into<Arc<str>>,
        function: F,
    ) -> Wrapped<F> {
        let executor = self.executor(priority).with_description(description);
        Wrapped::new(executor, function)
    }

    fn pop(&self) -> Option<QueuedTask> {
        self.handlers.lock().pop()
    }

    fn pop_if(&self, accept: impl FnOnce(Priority) -> bool) -> Option<QueuedTask> {
        let mut handlers = self.handlers.lock();
        if handlers.peek().is_some_and(|top| accept(top.priority())) {
            handlers.pop()
        } else {
            None
        }
    }
}

impl std::fmt::Debug for PriorityQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priority::{LOW, MEDIUM};
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    fn recorder() -> Arc<Mutex<Vec<i32>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn add_recorded(queue: &PriorityQueue, log: &Arc<Mutex<Vec<i32>>>, priority: Priority) {
        let log = Arc::clone(log);
        queue.add(priority, move || log.lock().push(priority));
    }

    #[test]
    fn test_execute_all_runs_in_non_increasing_priority() {
        let queue = PriorityQueue::new();
        let log = recorder();
        for priority in [LOW, HIGH, 7, MEDIUM, HIGH, -3, 250, MEDIUM] {
            add_recorded(&queue, &log, priority);
        }

        queue.execute_all();

        let order = log.lock().clone();
        assert_eq!(order.len(), 8);
        assert!(order.windows(2).all(|w| w[0] >= w[1]), "{order:?}");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_equal_priorities_each_run_once() {
        let queue = PriorityQueue::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..32 {
            let c = Arc::clone(&counter);
            queue.add(MEDIUM, move || {
                c.fetch_add(1, AtomicOrdering::SeqCst);
            });
        }

        queue.execute_all();

        assert_eq!(counter.load(AtomicOrdering::SeqCst), 32);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_execute_highest_only_high_empties_queue() {
        let queue = PriorityQueue::new();
        let log = recorder();
        add_recorded(&queue, &log, HIGH);
        add_recorded(&queue, &log, HIGH + 5);

        assert!(!queue.execute_highest());
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn test_execute_highest_one_high_one_low() {
        let queue = PriorityQueue::new();
        let log = recorder();
        add_recorded(&queue, &log, HIGH);
        add_recorded(&queue, &log, LOW);

        assert!(!queue.execute_highest());
        assert_eq!(*log.lock(), vec![HIGH, LOW]);
    }

    #[test]
    fn test_execute_highest_one_high_two_low() {
        let queue = PriorityQueue::new();
        let log = recorder();
        add_recorded(&queue, &log, HIGH);
        add_recorded(&queue, &log, LOW);
        add_recorded(&queue, &log, LOW);

        assert!(queue.execute_highest());
        assert_eq!(*log.lock(), vec![HIGH, LOW]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.peek_priority(), Some(LOW));
    }

    #[test]
    fn test_execute_highest_on_empty_queue() {
        let queue = PriorityQueue::new();
        assert!(!queue.execute_highest());
    }

    #[test]
    fn test_execute_high_never_runs_below_threshold() {
        let queue = PriorityQueue::new();
        let log = recorder();
        for priority in [HIGH, LOW, HIGH - 1, HIGH + 1, MEDIUM] {
            add_recorded(&queue, &log, priority);
        }

        queue.execute_high();
        queue.execute_high();

        assert_eq!(*log.lock(), vec![HIGH + 1, HIGH]);
        assert_eq!(queue.len(), 3);
        assert!(queue.peek_priority().is_some_and(|p| p < HIGH));
    }

    #[test]
    fn test_task_enqueuing_work_is_seen_by_same_drain() {
        let queue = Arc::new(PriorityQueue::new());
        let log = recorder();

        let q = Arc::clone(&queue);
        let l = Arc::clone(&log);
        queue.add(MEDIUM, move || {
            l.lock().push(MEDIUM);
            let l2 = Arc::clone(&l);
            q.add(LOW, move || l2.lock().push(LOW));
        });

        queue.execute_all();

        assert_eq!(*log.lock(), vec![MEDIUM, LOW]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_high_work_queued_during_execute_high_runs() {
        let queue = Arc::new(PriorityQueue::new());
        let log = recorder();

        let q = Arc::clone(&queue);
        let l = Arc::clone(&log);
        queue.add(HIGH, move || {
            let l2 = Arc::clone(&l);
            q.add(HIGH, move || l2.lock().push(2));
            l.lock().push(1);
        });

        queue.execute_high();

        assert_eq!(*log.lock(), vec![1, 2]);
    }

    #[test]
    fn test_panicking_task_aborts_drain_and_keeps_rest() {
        let queue = PriorityQueue::new();
        let log = recorder();
        add_recorded(&queue, &log, LOW);
        add_recorded(&queue, &log, MEDIUM);
        queue.add(HIGH, || panic!("task failure"));

        let result = catch_unwind(AssertUnwindSafe(|| queue.execute_all()));

        assert!(result.is_err());
        assert!(log.lock().is_empty());
        assert_eq!(queue.len(), 2);

        // Queue is still usable afterwards.
        queue.execute_all();
        assert_eq!(*log.lock(), vec![MEDIUM, LOW]);
    }

    #[test]
    fn test_clear_discards_without_running() {
        let queue = PriorityQueue::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for priority in [LOW, HIGH] {
            let c = Arc::clone(&counter);
            queue.add(priority, move || {
                c.fetch_add(1, AtomicOrdering::SeqCst);
            });
        }

        assert_eq!(queue.clear(), 2);
        queue.execute_all();
        assert_eq!(counter.load(AtomicOrdering::SeqCst), 0);
    }
}
