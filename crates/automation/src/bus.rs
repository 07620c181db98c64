//! Broadcast channel carrying host lifecycle events.
//!
//! The host adapter publishes here instead of calling the coordinator
//! directly, which keeps the coordinator constructible and testable without
//! a live host. Publishing is best-effort; a slow subscriber lags rather
//! than blocking the publisher.

use tokio::sync::broadcast;
use tracing::trace;

use host_core::HostEvent;

use crate::config::CoordinatorConfig;

/// Publish/subscribe fan-out for [`HostEvent`].
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<HostEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(CoordinatorConfig::DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes an event to every current subscriber.
    pub fn publish(&self, event: HostEvent) {
        if self.tx.send(event).is_err() {
            // No subscribers yet - this is normal, not an error
            trace!(target: "automation::bus", "no subscribers for host event");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
