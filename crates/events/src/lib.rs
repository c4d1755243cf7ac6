//! In-process publish/subscribe for dashboard notifications.
//!
//! The bus decouples publishers (the chain client and wallet event handlers)
//! from the views that must refresh. Delivery is synchronous, in subscription
//! order, to every handler subscribed at the moment of publishing. There is no
//! queue: a publish with no subscribers is dropped.

use alloy_primitives::Address;
use std::{
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};
use tracing::{debug, error};

/// Notification topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// A transaction submitted by one of the views was confirmed
    TxComplete,
    /// The active wallet account changed or was disconnected
    AccountChanged,
}

/// A published notification and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    TxComplete,
    /// `None` when the wallet reports no accounts
    AccountChanged(Option<Address>),
}

impl Notification {
    /// Topic this notification is delivered on.
    pub const fn topic(&self) -> Topic {
        match self {
            Self::TxComplete => Topic::TxComplete,
            Self::AccountChanged(_) => Topic::AccountChanged,
        }
    }
}

type Handler = Arc<dyn Fn(&Notification) + Send + Sync>;

struct Entry {
    id: u64,
    topic: Topic,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fan-out notification bus. Cloning yields another handle to the same bus.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &lock(&self.registry).entries.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`.
    ///
    /// The returned [`Subscription`] removes the handler when
    /// [`Subscription::unsubscribe`] is called. Dropping it leaves the handler
    /// registered.
    pub fn subscribe<H>(&self, topic: Topic, handler: H) -> Subscription
    where
        H: Fn(&Notification) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push(Entry {
            id,
            topic,
            handler: Arc::new(handler),
        });

        Subscription {
            registry: Arc::downgrade(&self.registry),
            id,
            topic,
        }
    }

    /// Deliver `notification` to every handler currently subscribed to its topic.
    ///
    /// Handlers run on the caller's stack in subscription order. A panicking
    /// handler is logged and does not stop delivery to the rest. Returns the
    /// number of handlers that completed normally.
    pub fn publish(&self, notification: Notification) -> usize {
        let topic = notification.topic();

        // Snapshot so handlers may subscribe, unsubscribe or publish re-entrantly.
        let handlers: Vec<Handler> = lock(&self.registry)
            .entries
            .iter()
            .filter(|entry| entry.topic == topic)
            .map(|entry| Arc::clone(&entry.handler))
            .collect();

        debug!(?notification, subscribers = handlers.len(), "Publishing notification");

        let mut delivered = 0;
        for handler in &handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(&notification))) {
                Ok(()) => delivered += 1,
                Err(_) => error!(?topic, "Notification handler panicked"),
            }
        }
        delivered
    }

    /// Publish [`Notification::TxComplete`].
    pub fn publish_tx_complete(&self) -> usize {
        self.publish(Notification::TxComplete)
    }

    /// Publish [`Notification::AccountChanged`].
    pub fn publish_account_changed(&self, account: Option<Address>) -> usize {
        self.publish(Notification::AccountChanged(account))
    }

    /// Number of handlers subscribed to `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        lock(&self.registry)
            .entries
            .iter()
            .filter(|entry| entry.topic == topic)
            .count()
    }

    /// Drop every handler subscribed to `topic`.
    ///
    /// Outstanding subscriptions for the topic become no-ops.
    pub fn retire(&self, topic: Topic) {
        lock(&self.registry)
            .entries
            .retain(|entry| entry.topic != topic);
    }
}

/// Capability to remove one handler from the bus.
#[must_use = "a subscription that is never unsubscribed stays registered for the bus lifetime"]
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    id: u64,
    topic: Topic,
}

impl Subscription {
    pub const fn topic(&self) -> Topic {
        self.topic
    }

    /// Remove the handler. Repeated calls, calls after the topic was retired
    /// and calls after the bus was dropped do nothing.
    pub fn unsubscribe(&self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        lock(&registry).entries.retain(|entry| entry.id != self.id);
    }
}
