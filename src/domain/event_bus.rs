//! Broadcast channel for push events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. The push channel
//! client ([`crate::ws::connection`]) publishes every decoded
//! [`QueueEvent`] through the bus, and each mounted admin queue holds one
//! [`Subscription`] for as long as it is mounted.
//!
//! The bus is constructed explicitly and handed to whoever needs it; tests
//! publish into it directly in place of a live connection.

use tokio::sync::broadcast;

use super::QueueEvent;

/// Broadcast bus for [`QueueEvent`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity.
/// When the ring buffer is full, the oldest events are dropped for lagging
/// receivers, which then observe [`Delivery::Lagged`].
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<QueueEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    /// If there are no active receivers, the event is silently dropped.
    pub fn publish(&self, event: QueueEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Registers a new subscription that will receive all future events.
    ///
    /// Dropping the returned [`Subscription`] deregisters it.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Returns the current number of active subscriptions.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// What a [`Subscription`] yields on each receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The next event in emission order.
    Event(QueueEvent),
    /// The subscriber fell behind and this many events were lost.
    Lagged(u64),
    /// The bus was dropped; no further events will arrive.
    Closed,
}

/// A registered listener on an [`EventBus`].
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<QueueEvent>,
}

impl Subscription {
    /// Waits for the next delivery.
    pub async fn recv(&mut self) -> Delivery {
        match self.receiver.recv().await {
            Ok(event) => Delivery::Event(event),
            Err(broadcast::error::RecvError::Lagged(n)) => Delivery::Lagged(n),
            Err(broadcast::error::RecvError::Closed) => Delivery::Closed,
        }
    }
}
