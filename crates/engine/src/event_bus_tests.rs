// SPDX-License-Identifier: MIT

use super::*;
use numdrassl_core::{ServerId, ServerType};

fn spawn_event(id: &str) -> Event {
    Event::ServerSpawn {
        server_id: ServerId::new(id),
        server_type: ServerType::Dynamic,
        port: 6100,
        template: None,
    }
}

#[tokio::test]
async fn subscribers_receive_published_events() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    bus.publish(spawn_event("a"));
    bus.publish(spawn_event("b"));
    assert_eq!(rx.recv().await.unwrap().server_id(), "a");
    assert_eq!(rx.recv().await.unwrap().server_id(), "b");
}

#[tokio::test]
async fn publish_without_subscribers_is_fine() {
    let bus = EventBus::new();
    bus.publish(spawn_event("a"));
    // A late subscriber does not see earlier events
    let mut rx = bus.subscribe();
    bus.publish(spawn_event("b"));
    assert_eq!(rx.recv().await.unwrap().server_id(), "b");
}
