use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use harpoon_core::StateEventKind;
use tracing::{debug, error};

use crate::state_set::StateSubscriptionSet;
use crate::subscribers::Subscription;
use crate::BusError;

/// Scene-lifetime registry of ad-hoc, string-keyed state subscriptions.
///
/// Sets are created on first subscription and dropped wholesale by
/// [`SceneScope::clear`], which the scene-transition boundary calls on
/// teardown. Handles obtained before a clear become inert.
pub struct SceneScope {
    name: String,
    states: Mutex<HashMap<String, Arc<StateSubscriptionSet>>>,
}

impl SceneScope {
    /// Creates an empty scope named after the owning scene.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Name of the owning scene.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers `callback` for `kind` notifications of `key`.
    pub fn subscribe<F>(
        &self,
        key: &str,
        kind: StateEventKind,
        owner: &str,
        callback: F,
    ) -> Subscription
    where
        F: Fn(StateEventKind) + Send + Sync + 'static,
    {
        let set = {
            let mut states = self.lock();
            let set = states.entry(key.to_owned()).or_insert_with(|| {
                Arc::new(StateSubscriptionSet::new(format!("{}.{key}", self.name)))
            });
            Arc::clone(set)
        };
        set.subscribe(kind, owner, callback)
    }

    /// Notifies the subscribers of `key`.
    ///
    /// Fails with [`BusError::KeyNotFound`] when nothing ever subscribed to
    /// `key` in this scene.
    pub fn notify(&self, key: &str, kind: StateEventKind) -> Result<usize, BusError> {
        let set = self.lock().get(key).cloned();
        let Some(set) = set else {
            error!(scope = %self.name, key, ?kind, "notified scene key without subscribers");
            return Err(BusError::KeyNotFound {
                scope: self.name.clone(),
                key: key.to_owned(),
            });
        };
        Ok(set.notify(kind)?)
    }

    /// Reports whether `key` has been subscribed to since the last clear.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Number of keys currently registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Reports whether no key is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every key and its subscribers, returning how many keys were held.
    pub fn clear(&self) -> usize {
        let mut states = self.lock();
        let cleared = states.len();
        states.clear();
        debug!(scope = %self.name, cleared, "cleared scene subscriptions");
        cleared
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<StateSubscriptionSet>>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SceneScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        f.debug_struct("SceneScope")
            .field("name", &self.name)
            .field("keys", &keys)
            .finish()
    }
}
