//! Ordered callback list shared by methods and channels.
//!
//! Entries are kept in ascending priority; equal priorities keep insertion
//! order. Iteration works on a snapshot taken under the lock, and each entry's
//! connected flag is checked again right before the caller uses it, so an
//! entry that disconnects mid-iteration (itself or a sibling) is skipped
//! without the list ever being mutated while it is walked.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use plexus_core::Priority;
use tracing::debug;

use crate::subscription::Subscription;

/// One registered callback.
pub(crate) struct Slot<F: ?Sized> {
    id: u64,
    priority: Priority,
    connected: AtomicBool,
    callback: Box<F>,
}

impl<F: ?Sized> Slot<F> {
    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn callback(&self) -> &F {
        &self.callback
    }
}

/// Type-erased view of a slot list, held weakly by [`Subscription`].
pub(crate) trait Detach: Send + Sync {
    /// Removes entry `id`. Returns `false` if it was already gone.
    fn detach(&self, id: u64) -> bool;

    /// Returns `true` while entry `id` is still listed.
    fn is_attached(&self, id: u64) -> bool;
}

pub(crate) struct SlotList<F: ?Sized> {
    slots: Mutex<Vec<Arc<Slot<F>>>>,
    next_id: AtomicU64,
}

impl<F: ?Sized + Send + Sync + 'static> SlotList<F> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            slots: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Inserts `callback` after every entry with priority `<= priority`.
    pub(crate) fn connect(self: &Arc<Self>, priority: Priority, callback: Box<F>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let slot = Arc::new(Slot {
            id,
            priority,
            connected: AtomicBool::new(true),
            callback,
        });
        {
            let mut slots = self.slots.lock();
            let pos = slots.partition_point(|s| s.priority <= priority);
            slots.insert(pos, slot);
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let list: Weak<dyn Detach> = weak;
        Subscription::new(list, id)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Lazily yields the entries connected at the moment each one is reached.
    pub(crate) fn live(&self) -> impl Iterator<Item = Arc<Slot<F>>> + use<F> {
        let snapshot: Vec<Arc<Slot<F>>> = self.slots.lock().clone();
        snapshot.into_iter().filter(|slot| slot.is_connected())
    }

    /// Disconnects every entry.
    pub(crate) fn clear(&self) {
        let removed = std::mem::take(&mut *self.slots.lock());
        for slot in &removed {
            slot.connected.store(false, Ordering::Release);
        }
    }
}

impl<F: ?Sized + Send + Sync + 'static> Detach for SlotList<F> {
    fn detach(&self, id: u64) -> bool {
        let removed = {
            let mut slots = self.slots.lock();
            slots
                .iter()
                .position(|s| s.id == id)
                .map(|pos| slots.remove(pos))
        };
        // Dropped outside the lock: the callback's captures may re-enter.
        match removed {
            Some(slot) => {
                slot.connected.store(false, Ordering::Release);
                debug!(id, priority = slot.priority, "Callback disconnected");
                true
            }
            None => false,
        }
    }

    fn is_attached(&self, id: u64) -> bool {
        self.slots.lock().iter().any(|s| s.id == id)
    }
}
