//! Change notification fan-out to subscribers

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use hmdfleet_core::prelude::*;
use hmdfleet_core::FleetEvent;

/// Handle returned by `subscribe`, used to unsubscribe later
pub type SubscriptionId = u64;

/// Fans typed change events out to every live subscriber
///
/// Events are delivered over unbounded channels; which thread drains a
/// receiver is entirely the consumer's business. Closed receivers are
/// pruned on the next emit.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<(SubscriptionId, UnboundedSender<FleetEvent>)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; drop the receiver (or unsubscribe) to stop
    pub fn subscribe(&self) -> (SubscriptionId, UnboundedReceiver<FleetEvent>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push((id, tx));
        (id, rx)
    }

    /// Remove a listener; unknown handles are a no-op
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers
            .lock()
            .unwrap()
            .retain(|(sub_id, _)| *sub_id != id);
    }

    /// Deliver an event to every live subscriber
    pub fn emit(&self, event: FleetEvent) {
        trace!("Emitting {}", event.summary());
        self.subscribers
            .lock()
            .unwrap()
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribe_receives_events() {
        let bus = EventBus::new();
        let (_id, mut rx) = bus.subscribe();

        bus.emit(FleetEvent::RegistryChanged);

        assert_eq!(rx.recv().await, Some(FleetEvent::RegistryChanged));
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let (id, mut rx) = bus.subscribe();

        bus.unsubscribe(id);
        bus.emit(FleetEvent::RegistryChanged);

        // Sender side is gone, channel closes without a message
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_pruned_on_emit() {
        let bus = EventBus::new();
        let (_id, rx) = bus.subscribe();
        drop(rx);

        bus.emit(FleetEvent::RegistryChanged);

        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_all_receive() {
        let bus = EventBus::new();
        let (_a, mut rx_a) = bus.subscribe();
        let (_b, mut rx_b) = bus.subscribe();

        bus.emit(FleetEvent::SelectedAppChanged { app: None });

        assert!(rx_a.recv().await.is_some());
        assert!(rx_b.recv().await.is_some());
    }
}
