use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::registry::ChannelKey;
use crate::subscribers::{dispatch, SubscriberList, Subscription};
use crate::PublishError;

type Callback<T> = dyn Fn(&T) + Send + Sync;

/// Shared state behind every [`Channel`] handle for one key.
pub(crate) struct ChannelInner<T: 'static> {
    key: ChannelKey,
    subscribers: Arc<SubscriberList<Callback<T>>>,
}

impl<T: 'static> ChannelInner<T> {
    pub(crate) fn new(key: ChannelKey) -> Self {
        Self {
            key,
            subscribers: Arc::new(SubscriberList::new()),
        }
    }
}

/// Strongly typed publish/subscribe endpoint.
///
/// Handles are cheap to clone and all clones address the same subscriber
/// list. Obtain one through [`EventRegistry::channel`](crate::EventRegistry::channel).
pub struct Channel<T: 'static> {
    inner: Arc<ChannelInner<T>>,
}

impl<T: Send + Sync + 'static> Channel<T> {
    pub(crate) fn from_inner(inner: Arc<ChannelInner<T>>) -> Self {
        Self { inner }
    }

    /// Composite key the channel was registered under.
    #[must_use]
    pub fn key(&self) -> &ChannelKey {
        &self.inner.key
    }

    /// Registers `callback` under `owner`.
    ///
    /// Registrations are not de-duplicated: subscribing the same owner twice
    /// delivers every payload twice.
    pub fn subscribe<F>(&self, owner: &str, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let owner: Arc<str> = Arc::from(owner);
        let callback: Arc<Callback<T>> = Arc::new(callback);
        let id = self.inner.subscribers.push(Arc::clone(&owner), callback);
        trace!(channel = %self.inner.key, %owner, id = id.get(), "subscribed");
        Subscription::new(id, owner, &self.inner.subscribers)
    }

    /// Delivers `payload` to every current subscriber in subscription order.
    ///
    /// Returns the number of callbacks invoked. A panicking callback does not
    /// prevent the remaining ones from running; all failures are reported
    /// together.
    pub fn publish(&self, payload: &T) -> Result<usize, PublishError> {
        let subscribers = self.inner.subscribers.snapshot();
        trace!(
            channel = %self.inner.key,
            subscribers = subscribers.len(),
            "publishing"
        );
        dispatch(&self.inner.key, subscribers, |callback| callback(payload))
    }

    /// Number of live registrations.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Reports whether both handles address the same channel instance.
    #[must_use]
    pub fn same_channel(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: 'static> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("key", &self.inner.key)
            .field("payload", &std::any::type_name::<T>())
            .finish()
    }
}
