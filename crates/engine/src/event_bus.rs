// SPDX-License-Identifier: MIT

//! Broadcast channel for lifecycle events.

use numdrassl_core::Event;
use tokio::sync::broadcast;
use tracing::debug;

const EVENT_BUS_CAPACITY: usize = 256;

/// Fan-out of lifecycle events to plugin subscribers.
///
/// Delivery is best-effort: a slow subscriber lags and drops, it never
/// blocks the supervisor.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, event: Event) {
        debug!("event {}", event.log_summary());
        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
