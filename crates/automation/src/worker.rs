//! Background task pumping host events into the coordinator.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use host_core::HostEvent;

use crate::coordinator::Coordinator;

/// Drains one event subscription into a [`Coordinator`] until the bus closes.
pub struct Worker {
    coordinator: Coordinator,
    events: broadcast::Receiver<HostEvent>,
}

impl Worker {
    pub fn new(coordinator: Coordinator, events: broadcast::Receiver<HostEvent>) -> Self {
        Self {
            coordinator,
            events,
        }
    }

    /// Spawns the pump on the current tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        loop {
            match self.events.recv().await {
                Ok(event) => self.coordinator.handle_event(event).await,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        target: "automation::worker",
                        skipped,
                        "event subscription lagged; host events dropped"
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!(target: "automation::worker", "event bus closed, worker stopping");
    }
}
