use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::channel::{Channel, ChannelInner};
use crate::BusError;

/// Composite `(scope, event)` name of a channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelKey {
    scope: String,
    event: String,
}

impl ChannelKey {
    /// Creates a key from the owning component name and the event name.
    #[must_use]
    pub fn new(scope: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            event: event.into(),
        }
    }

    /// Owning component name.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Event name within the scope.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.scope, self.event)
    }
}

struct RegisteredChannel {
    payload_type: &'static str,
    channel: Arc<dyn Any + Send + Sync>,
}

/// Registry resolving `(scope, event)` keys to typed channels.
///
/// Each key is created once, on first request, under the registry lock; every
/// later request for the key observes that same channel.
#[derive(Default)]
pub struct EventRegistry {
    channels: Mutex<HashMap<ChannelKey, RegisteredChannel>>,
}

impl EventRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the channel registered under `(scope, event)`, creating it if needed.
    ///
    /// Fails with [`BusError::TypeMismatch`] when the key already carries a
    /// different payload type.
    pub fn channel<T: Send + Sync + 'static>(
        &self,
        scope: &str,
        event: &str,
    ) -> Result<Channel<T>, BusError> {
        let key = ChannelKey::new(scope, event);
        let mut channels = self.lock();
        let entry = channels.entry(key.clone()).or_insert_with(|| {
            debug!(channel = %key, payload = type_name::<T>(), "registered channel");
            RegisteredChannel {
                payload_type: type_name::<T>(),
                channel: Arc::new(ChannelInner::<T>::new(key.clone())),
            }
        });

        let registered = entry.payload_type;
        match Arc::clone(&entry.channel).downcast::<ChannelInner<T>>() {
            Ok(inner) => Ok(Channel::from_inner(inner)),
            Err(_) => Err(BusError::TypeMismatch {
                key,
                registered,
                requested: type_name::<T>(),
            }),
        }
    }

    /// Reports whether a channel exists for `(scope, event)`.
    #[must_use]
    pub fn contains(&self, scope: &str, event: &str) -> bool {
        self.lock().contains_key(&ChannelKey::new(scope, event))
    }

    /// Number of registered channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Reports whether no channel has been requested yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ChannelKey, RegisteredChannel>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channels = self.lock();
        let mut keys: Vec<String> = channels
            .iter()
            .map(|(key, registered)| format!("{key}: {}", registered.payload_type))
            .collect();
        keys.sort();
        f.debug_struct("EventRegistry")
            .field("channels", &keys)
            .finish()
    }
}
