use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::warn;

use crate::{PublishError, SubscriberFailure};

/// Identifier of a single registration, unique within its subscriber list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

struct Entry<F: ?Sized> {
    id: SubscriptionId,
    owner: Arc<str>,
    callback: Arc<F>,
}

/// Ordered callbacks of one channel or one state notification kind.
pub(crate) struct SubscriberList<F: ?Sized> {
    next_id: AtomicU64,
    entries: Mutex<Vec<Entry<F>>>,
}

impl<F: ?Sized> SubscriberList<F> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn push(&self, owner: Arc<str>, callback: Arc<F>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push(Entry {
            id,
            owner,
            callback,
        });
        id
    }

    /// Copies the current registrations so callbacks run without the lock held.
    pub(crate) fn snapshot(&self) -> Vec<(Arc<str>, Arc<F>)> {
        self.lock()
            .iter()
            .map(|entry| (Arc::clone(&entry.owner), Arc::clone(&entry.callback)))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Entry<F>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Type-erased removal hook held weakly by [`Subscription`].
trait Detach: Send + Sync {
    fn remove(&self, id: SubscriptionId) -> bool;

    fn contains(&self, id: SubscriptionId) -> bool;
}

impl<F: ?Sized + Send + Sync> Detach for SubscriberList<F> {
    fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.lock();
        match entries.iter().position(|entry| entry.id == id) {
            Some(index) => {
                let _ = entries.remove(index);
                true
            }
            None => false,
        }
    }

    fn contains(&self, id: SubscriptionId) -> bool {
        self.lock().iter().any(|entry| entry.id == id)
    }
}

/// Handle to a single registration.
///
/// Dropping the handle or calling [`Subscription::unsubscribe`] removes exactly
/// that registration; other registrations of the same owner or callback stay.
/// [`Subscription::detach`] keeps the callback registered for as long as the
/// channel exists. Once the underlying channel or scene entry is gone the
/// handle is inert.
#[must_use = "dropping a subscription unregisters its callback"]
pub struct Subscription {
    id: SubscriptionId,
    owner: Arc<str>,
    list: Option<Weak<dyn Detach>>,
}

impl Subscription {
    pub(crate) fn new<F>(id: SubscriptionId, owner: Arc<str>, list: &Arc<SubscriberList<F>>) -> Self
    where
        F: ?Sized + Send + Sync + 'static,
    {
        let erased: Arc<dyn Detach> = Arc::clone(list) as Arc<dyn Detach>;
        Self {
            id,
            owner,
            list: Some(Arc::downgrade(&erased)),
        }
    }

    /// Identifier of the registration.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Owner name the callback was registered under.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Reports whether the callback is still registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.list
            .as_ref()
            .and_then(Weak::upgrade)
            .map_or(false, |list| list.contains(self.id))
    }

    /// Removes the registration, reporting whether it was still present.
    pub fn unsubscribe(mut self) -> bool {
        self.release()
    }

    /// Keeps the callback registered for the lifetime of its channel.
    pub fn detach(mut self) {
        self.list = None;
    }

    fn release(&mut self) -> bool {
        match self.list.take().and_then(|list| list.upgrade()) {
            Some(list) => list.remove(self.id),
            None => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("attached", &self.list.is_some())
            .finish()
    }
}

/// Invokes every callback, continuing past panics and collecting them.
pub(crate) fn dispatch<F: ?Sized>(
    target: &dyn fmt::Display,
    subscribers: Vec<(Arc<str>, Arc<F>)>,
    invoke: impl Fn(&F),
) -> Result<usize, PublishError> {
    let mut delivered = 0;
    let mut failures = Vec::new();

    for (owner, callback) in subscribers {
        match panic::catch_unwind(AssertUnwindSafe(|| invoke(&*callback))) {
            Ok(()) => delivered += 1,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(channel = %target, owner = %owner, %message, "subscriber panicked");
                failures.push(SubscriberFailure {
                    owner: owner.to_string(),
                    message,
                });
            }
        }
    }

    if failures.is_empty() {
        Ok(delivered)
    } else {
        Err(PublishError {
            target: target.to_string(),
            delivered,
            failures,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
