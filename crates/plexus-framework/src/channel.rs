//! Channels: asynchronous, multi-subscriber broadcast between plugins.
//!
//! Publishing never runs subscribers inline. The payload is copied into a task
//! that is handed to the channel's [`Dispatcher`]; when that task runs, every
//! subscriber is invoked under the channel's [`ChannelPolicy`]. With the
//! default [`DropErrors`] policy a failing or panicking subscriber affects
//! neither its siblings nor the publisher.
//!
//! Publishing to a channel with no subscribers is a no-op: the payload is not
//! copied and nothing is posted.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use plexus_core::{PriorityQueue, priority};
//! use plexus_framework::Channel;
//!
//! let queue = Arc::new(PriorityQueue::new());
//! let blocks: Channel<u64> = Channel::new(Arc::new(queue.executor(priority::MEDIUM)));
//!
//! let _sub = blocks.subscribe(|height: &u64| println!("block {height}"));
//! blocks.publish(&42);
//!
//! queue.execute_all(); // prints "block 42"
//! ```

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::RwLock;
use plexus_core::{BoxError, BoxedDispatcher, Dispatcher};
use tracing::{debug, trace};

use crate::policy::{ChannelPolicy, DropErrors};
use crate::slot::SlotList;
use crate::subscription::Subscription;

type SubscriberFn<T> = dyn Fn(&T) -> Result<(), BoxError> + Send + Sync;

/// Return types accepted from channel subscribers.
///
/// Implemented for `()` and for `Result<(), E>` where `E` converts into
/// [`BoxError`].
pub trait SubscriberOutcome {
    /// Normalises the subscriber's return value.
    fn into_outcome(self) -> Result<(), BoxError>;
}

impl SubscriberOutcome for () {
    fn into_outcome(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E: Into<BoxError>> SubscriberOutcome for Result<(), E> {
    fn into_outcome(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

/// A loosely bound publish/subscribe channel carrying `T`.
///
/// Subscribers are delivered to in subscription order.
pub struct Channel<T, P = DropErrors> {
    name: &'static str,
    subscribers: Arc<SlotList<SubscriberFn<T>>>,
    dispatcher: BoxedDispatcher,
    policy: RwLock<P>,
}

impl<T, P> Channel<T, P>
where
    T: Send + Sync + 'static,
    P: ChannelPolicy,
{
    /// Creates a channel that schedules fan-out through `dispatcher`.
    pub fn new(dispatcher: BoxedDispatcher) -> Self
    where
        P: Default,
    {
        Self::with_policy(dispatcher, P::default())
    }

    /// Creates a channel with an explicit policy value.
    pub fn with_policy(dispatcher: BoxedDispatcher, policy: P) -> Self {
        Self {
            name: "channel",
            subscribers: SlotList::new(),
            dispatcher,
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

    /// Subscribes `subscriber` to every subsequent publish.
    pub fn subscribe<F, O>(&self, subscriber: F) -> Subscription
    where
        F: Fn(&T) -> O + Send + Sync + 'static,
        O: SubscriberOutcome,
    {
        let boxed: Box<SubscriberFn<T>> =
            Box::new(move |data: &T| subscriber(data).into_outcome());
        let handle = self.subscribers.connect(0, boxed);
        debug!(channel = self.name, "Subscriber registered");
        handle
    }

    /// Unsubscribes by consuming the handle.
    pub fn unsubscribe(&self, mut handle: Subscription) {
        handle.unregister();
    }

    /// Copies `data` and schedules delivery to every subscriber.
    ///
    /// Does nothing, not even the copy, when there are no subscribers.
    pub fn publish(&self, data: &T)
    where
        T: Clone,
    {
        if self.has_subscribers() {
            self.schedule(data.clone());
        }
    }

    /// Builds the payload with `make` only if someone is subscribed, then
    /// schedules delivery.
    pub fn publish_with<M>(&self, make: M)
    where
        M: FnOnce() -> T,
    {
        if self.has_subscribers() {
            self.schedule(make());
        }
    }

    /// Returns `true` if at least one subscriber is registered.
    pub fn has_subscribers(&self) -> bool {
        !self.subscribers.is_empty()
    }

    /// Returns the number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Replaces the policy used by subsequent publishes.
    pub fn set_policy(&self, policy: P) {
        *self.policy.write() = policy;
    }

    /// Returns a copy of the current policy.
    pub fn policy(&self) -> P {
        self.policy.read().clone()
    }

    /// Disconnects every subscriber. Outstanding handles become inert.
    pub fn clear(&self) {
        self.subscribers.clear();
    }

    fn schedule(&self, data: T) {
        let subscribers = Arc::clone(&self.subscribers);
        let policy = self.policy.read().clone();
        let name = self.name;
        trace!(channel = name, "Publish scheduled");
        self.dispatcher.post(Box::new(move || {
            let deliveries = subscribers
                .live()
                .map(|slot| deliver(slot.callback(), &data));
            policy.deliver(deliveries);
            trace!(channel = name, "Fan-out finished");
        }));
    }
}

/// Invokes one subscriber, turning a panic into an error.
fn deliver<T: 'static>(subscriber: &SubscriberFn<T>, data: &T) -> Result<(), BoxError> {
    match catch_unwind(AssertUnwindSafe(|| subscriber(data))) {
        Ok(outcome) => outcome,
        Err(panic) => Err(panic_message(panic).into()),
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("subscriber panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("subscriber panicked: {s}")
    } else {
        "subscriber panicked".to_string()
    }
}

impl<T, P> std::fmt::Debug for Channel<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use plexus_core::{Dispatcher, PriorityQueue, Task, TokioDispatcher, priority};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    /// Counts posts before forwarding them to a queue.
    struct CountingDispatcher {
        queue: Arc<PriorityQueue>,
        posts: AtomicUsize,
    }

    impl Dispatcher for CountingDispatcher {
        fn post(&self, task: Task) {
            self.posts.fetch_add(1, Ordering::SeqCst);
            self.queue.add(priority::MEDIUM, task);
        }
    }

    fn setup() -> (Arc<PriorityQueue>, Arc<CountingDispatcher>) {
        let queue = Arc::new(PriorityQueue::new());
        let dispatcher = Arc::new(CountingDispatcher {
            queue: Arc::clone(&queue),
            posts: AtomicUsize::new(0),
        });
        (queue, dispatcher)
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let (queue, dispatcher) = setup();
        let channel: Channel<String> = Channel::new(dispatcher.clone());
        let constructed = AtomicUsize::new(0);

        channel.publish_with(|| {
            constructed.fetch_add(1, Ordering::SeqCst);
            "payload".to_string()
        });
        channel.publish(&"payload".to_string());

        assert_eq!(constructed.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.posts.load(Ordering::SeqCst), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_publish_is_deferred_to_dispatcher() {
        let (queue, dispatcher) = setup();
        let channel: Channel<u32> = Channel::new(dispatcher.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = Arc::clone(&seen);
        let _sub = channel.subscribe(move |value: &u32| s.lock().push(*value));

        channel.publish(&5);
        assert!(seen.lock().is_empty());
        assert_eq!(dispatcher.posts.load(Ordering::SeqCst), 1);

        queue.execute_all();
        assert_eq!(*seen.lock(), vec![5]);
    }

    #[test]
    fn test_failing_subscribers_do_not_affect_siblings() {
        let (queue, dispatcher) = setup();
        let channel: Channel<u32> = Channel::new(dispatcher);
        let calls = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&calls);
        let _ok1 = channel.subscribe(move |_: &u32| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let c = Arc::clone(&calls);
        let _err = channel.subscribe(move |_: &u32| {
            c.fetch_add(1, Ordering::SeqCst);
            Err::<(), BoxError>("always fails".into())
        });
        let c = Arc::clone(&calls);
        let _panics = channel.subscribe(move |_: &u32| -> Result<(), BoxError> {
            c.fetch_add(1, Ordering::SeqCst);
            panic!("subscriber bug")
        });
        let c = Arc::clone(&calls);
        let _ok2 = channel.subscribe(move |_: &u32| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        channel.publish(&1);
        queue.execute_all();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_delivery_in_subscription_order() {
        let (queue, dispatcher) = setup();
        let channel: Channel<u32> = Channel::new(dispatcher);
        let order = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<Subscription> = (0..4)
            .map(|i| {
                let o = Arc::clone(&order);
                channel.subscribe(move |_: &u32| o.lock().push(i))
            })
            .collect();

        channel.publish(&0);
        queue.execute_all();

        assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
        drop(handles);
        assert!(!channel.has_subscribers());
    }

    #[test]
    fn test_payload_is_copied_at_publish() {
        let (queue, dispatcher) = setup();
        let channel: Channel<Vec<u8>> = Channel::new(dispatcher);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = Arc::clone(&seen);
        let _sub = channel.subscribe(move |data: &Vec<u8>| s.lock().push(data.clone()));

        let mut payload = vec![1, 2];
        channel.publish(&payload);
        payload.push(3);
        queue.execute_all();

        assert_eq!(*seen.lock(), vec![vec![1, 2]]);
    }

    #[test]
    fn test_unsubscribed_before_fanout_is_skipped() {
        let (queue, dispatcher) = setup();
        let channel: Channel<u32> = Channel::new(dispatcher);
        let calls = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&calls);
        let sub = channel.subscribe(move |_: &u32| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        channel.publish(&1);
        channel.unsubscribe(sub);
        queue.execute_all();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!channel.has_subscribers());
    }

    #[test]
    fn test_each_publish_delivered_once() {
        let (queue, dispatcher) = setup();
        let channel: Channel<u32> = Channel::new(dispatcher.clone());
        let sum = Arc::new(AtomicUsize::new(0));

        let s = Arc::clone(&sum);
        let _sub = channel.subscribe(move |v: &u32| {
            s.fetch_add(*v as usize, Ordering::SeqCst);
        });

        for v in [1, 10, 100] {
            channel.publish(&v);
        }
        queue.execute_all();

        assert_eq!(dispatcher.posts.load(Ordering::SeqCst), 3);
        assert_eq!(sum.load(Ordering::SeqCst), 111);
    }

    /// Payload whose clones are counted.
    struct Counted(Arc<AtomicUsize>);

    impl Clone for Counted {
        fn clone(&self) -> Self {
            self.0.fetch_add(1, Ordering::SeqCst);
            Counted(Arc::clone(&self.0))
        }
    }

    #[test]
    fn test_publish_copies_payload_once_per_publish() {
        let (queue, dispatcher) = setup();
        let channel: Channel<Counted> = Channel::new(dispatcher.clone());
        let clones = Arc::new(AtomicUsize::new(0));
        let payload = Counted(Arc::clone(&clones));

        channel.publish(&payload);
        assert_eq!(clones.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.posts.load(Ordering::SeqCst), 0);

        let delivered = Arc::new(AtomicUsize::new(0));
        let d = Arc::clone(&delivered);
        let _sub = channel.subscribe(move |_: &Counted| {
            d.fetch_add(1, Ordering::SeqCst);
        });

        channel.publish(&payload);
        assert_eq!(clones.load(Ordering::SeqCst), 1);
        channel.publish(&payload);
        assert_eq!(clones.load(Ordering::SeqCst), 2);

        queue.execute_all();
        assert_eq!(delivered.load(Ordering::SeqCst), 2);
        assert_eq!(clones.load(Ordering::SeqCst), 2);
    }

    /// Records its label each time it runs a fan-out.
    #[derive(Clone)]
    struct Labelled {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ChannelPolicy for Labelled {
        fn deliver<I>(&self, deliveries: I)
        where
            I: Iterator<Item = Result<(), BoxError>>,
        {
            deliveries.for_each(drop);
            self.log.lock().push(self.label);
        }
    }

    #[test]
    fn test_set_policy_applies_to_later_publishes() {
        let (queue, dispatcher) = setup();
        let log = Arc::new(Mutex::new(Vec::new()));
        let policy = |label| Labelled {
            label,
            log: Arc::clone(&log),
        };

        let channel: Channel<u32, Labelled> = Channel::with_policy(dispatcher, policy("first"));
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let _sub = channel.subscribe(move |_: &u32| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        channel.publish(&1);
        channel.set_policy(policy("second"));
        assert_eq!(channel.policy().label, "second");
        channel.publish(&2);

        queue.execute_all();
        let mut ran = log.lock().clone();
        ran.sort_unstable();
        assert_eq!(ran, vec!["first", "second"]);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_tokio_dispatcher_fanout() {
        let dispatcher = Arc::new(TokioDispatcher::current().unwrap());
        let channel: Channel<String> = Channel::new(dispatcher);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _sub = channel.subscribe(move |msg: &String| {
            let _ = tx.send(msg.clone());
        });
        channel.publish(&"hello".to_string());

        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
    }
}
