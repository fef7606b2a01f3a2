#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Typed publish/subscribe plumbing shared by gameplay systems.
//!
//! Producers and consumers meet on a [`Channel`] resolved through an
//! [`EventRegistry`] by a `(scope, event)` name pair. The same key always
//! yields the same channel, so components may resolve it independently and in
//! any order. [`StateSubscriptionSet`] groups entered/exited/modified callbacks
//! for a single state, and [`SceneScope`] keeps a set per ad-hoc string key
//! until the owning scene tears it down with [`SceneScope::clear`].
//!
//! Publishing is synchronous and runs callbacks in subscription order on the
//! calling thread. A panicking callback does not stop the others; every
//! failure is collected into a [`PublishError`].

mod channel;
mod registry;
mod scene;
mod state_set;
mod subscribers;

pub use channel::Channel;
pub use registry::{ChannelKey, EventRegistry};
pub use scene::SceneScope;
pub use state_set::{StateCallback, StateSubscriptionSet};
pub use subscribers::{Subscription, SubscriptionId};

use thiserror::Error;

/// A subscriber that panicked while handling a notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriberFailure {
    /// Owner name the callback was registered under.
    pub owner: String,
    /// Panic message, when it was a string.
    pub message: String,
}

/// Aggregated failures from a single publish call.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{} subscriber(s) of `{target}` panicked", failures.len())]
pub struct PublishError {
    /// Channel or state the notification was published on.
    pub target: String,
    /// Callbacks that ran successfully.
    pub delivered: usize,
    /// Callbacks that panicked, in subscription order.
    pub failures: Vec<SubscriberFailure>,
}

/// Reasons a bus operation may be refused.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BusError {
    /// The key was first registered with a different payload type.
    #[error("channel `{key}` carries `{registered}`, not `{requested}`")]
    TypeMismatch {
        /// Composite channel key.
        key: ChannelKey,
        /// Payload type the channel was created with.
        registered: &'static str,
        /// Payload type requested by the caller.
        requested: &'static str,
    },
    /// A scene-scoped key was notified before anyone subscribed to it.
    #[error("scene `{scope}` has no subscribers for `{key}`")]
    KeyNotFound {
        /// Name of the scene scope.
        scope: String,
        /// Key that was notified.
        key: String,
    },
    /// One or more subscribers panicked.
    #[error(transparent)]
    Publish(#[from] PublishError),
}
