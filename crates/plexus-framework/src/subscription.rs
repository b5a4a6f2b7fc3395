//! RAII ownership of a registered provider or subscriber.
//!
//! ```text
//! register_provider() / subscribe() ──► Connected
//!            unregister() / drop    ──► Disconnected (terminal)
//! ```
//!
//! Unregistering is idempotent. The handle holds the entry list weakly, so a
//! handle that outlives its method or channel is harmless.

use std::sync::Weak;

use crate::slot::Detach;

struct Link {
    list: Weak<dyn Detach>,
    id: u64,
}

/// Owning handle for one registered callback.
///
/// Move-only: there is exactly one handle per entry. Dropping the handle
/// disconnects the entry. [`Subscription::default`] is an empty handle that is
/// already disconnected, which is also what [`std::mem::take`] leaves behind.
///
/// # Example
///
/// ```rust,ignore
/// let mut handle = method.register_provider(|&(a, b): &(i32, i32)| Ok::<_, BoxError>(a + b), 0);
/// assert!(handle.is_connected());
///
/// handle.unregister();
/// handle.unregister(); // no-op
/// ```
#[derive(Default)]
#[must_use = "dropping a Subscription immediately unregisters the callback"]
pub struct Subscription {
    link: Option<Link>,
}

impl Subscription {
    pub(crate) fn new(list: Weak<dyn Detach>, id: u64) -> Self {
        Self {
            link: Some(Link { list, id }),
        }
    }

    /// Creates an empty, disconnected handle.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` while the entry is registered.
    pub fn is_connected(&self) -> bool {
        self.link.as_ref().is_some_and(|link| {
            link.list
                .upgrade()
                .is_some_and(|list| list.is_attached(link.id))
        })
    }

    /// Disconnects the entry. Calling this again is a no-op.
    pub fn unregister(&mut self) {
        if let Some(link) = self.link.take()
            && let Some(list) = link.list.upgrade()
        {
            list.detach(link.id);
        }
    }

    /// Gives up ownership without disconnecting.
    ///
    /// The entry then stays registered until its method or channel is torn
    /// down.
    pub fn release(mut self) {
        self.link = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unregister();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.link.as_ref().map(|link| link.id))
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::SlotList;

    type Callback = dyn Fn() + Send + Sync;

    #[test]
    fn test_unregister_twice_is_noop() {
        let list = SlotList::<Callback>::new();
        let mut handle = list.connect(0, Box::new(|| {}));
        let other = list.connect(0, Box::new(|| {}));

        handle.unregister();
        handle.unregister();
        drop(handle);

        assert_eq!(list.len(), 1);
        assert!(other.is_connected());
    }

    #[test]
    fn test_drop_disconnects() {
        let list = SlotList::<Callback>::new();
        let handle = list.connect(0, Box::new(|| {}));
        assert_eq!(list.len(), 1);

        drop(handle);
        assert!(list.is_empty());
    }

    #[test]
    fn test_taken_handle_source_is_inert() {
        let list = SlotList::<Callback>::new();
        let mut original = list.connect(0, Box::new(|| {}));

        let moved = std::mem::take(&mut original);
        assert!(!original.is_connected());
        drop(original);
        assert_eq!(list.len(), 1);
        assert!(moved.is_connected());

        drop(moved);
        assert!(list.is_empty());
    }

    #[test]
    fn test_release_keeps_entry() {
        let list = SlotList::<Callback>::new();
        list.connect(0, Box::new(|| {})).release();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_handle_outliving_list() {
        let list = SlotList::<Callback>::new();
        let mut handle = list.connect(0, Box::new(|| {}));
        drop(list);

        assert!(!handle.is_connected());
        handle.unregister();
    }

    #[test]
    fn test_empty_handle() {
        let mut handle = Subscription::empty();
        assert!(!handle.is_connected());
        handle.unregister();
    }
}
