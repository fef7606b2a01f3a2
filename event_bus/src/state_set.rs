use std::fmt;
use std::sync::Arc;

use harpoon_core::StateEventKind;
use tracing::trace;

use crate::subscribers::{dispatch, SubscriberList, Subscription};
use crate::PublishError;

/// Callback invoked with the kind of state notification being delivered.
pub type StateCallback = dyn Fn(StateEventKind) + Send + Sync;

/// Entered/exited/modified callbacks registered for a single state.
pub struct StateSubscriptionSet {
    label: String,
    lists: [Arc<SubscriberList<StateCallback>>; StateEventKind::COUNT],
}

impl StateSubscriptionSet {
    /// Creates an empty set. `label` names the state in logs and errors.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            lists: std::array::from_fn(|_| Arc::new(SubscriberList::new())),
        }
    }

    /// Name of the state the set belongs to.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Registers `callback` for notifications of `kind`.
    pub fn subscribe<F>(&self, kind: StateEventKind, owner: &str, callback: F) -> Subscription
    where
        F: Fn(StateEventKind) + Send + Sync + 'static,
    {
        let owner: Arc<str> = Arc::from(owner);
        let callback: Arc<StateCallback> = Arc::new(callback);
        let list = &self.lists[kind.index()];
        let id = list.push(Arc::clone(&owner), callback);
        Subscription::new(id, owner, list)
    }

    /// Runs every callback registered for `kind`, in subscription order.
    pub fn notify(&self, kind: StateEventKind) -> Result<usize, PublishError> {
        let subscribers = self.lists[kind.index()].snapshot();
        trace!(state = %self.label, ?kind, subscribers = subscribers.len(), "notifying");
        let target = format!("{}:{kind:?}", self.label);
        dispatch(&target, subscribers, |callback| callback(kind))
    }

    /// Number of callbacks registered for `kind`.
    #[must_use]
    pub fn subscriber_count(&self, kind: StateEventKind) -> usize {
        self.lists[kind.index()].len()
    }

    /// Reports whether no callback of any kind is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lists.iter().all(|list| list.len() == 0)
    }
}

impl fmt::Debug for StateSubscriptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<(StateEventKind, usize)> = StateEventKind::ALL
            .iter()
            .map(|kind| (*kind, self.subscriber_count(*kind)))
            .collect();
        f.debug_struct("StateSubscriptionSet")
            .field("label", &self.label)
            .field("subscribers", &counts)
            .finish()
    }
}
