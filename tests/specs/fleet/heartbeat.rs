//! Spec: heartbeat flap — overdue flips UNHEALTHY, recovery flips back.

use crate::prelude::*;

#[tokio::test]
async fn heartbeat_flap_degrades_and_recovers() {
    let fleet = Fleet::start(READY_SERVER, |config| {
        config.health_check_interval_seconds = 1;
    })
    .await;
    fleet.add_template("bedwars");
    fleet.orchestrator.spawn_dynamic("bedwars", SpawnOptions::default()).await.unwrap();

    // First heartbeat at T; then silence beyond 3 intervals
    fleet.orchestrator.on_heartbeat("bedwars-1");
    let degraded = wait_for(8_000, || {
        fleet
            .orchestrator
            .get("bedwars-1")
            .map(|i| i.status == ServerStatus::Unhealthy)
            .unwrap_or(false)
    })
    .await;
    assert!(degraded, "silence beyond 3 intervals flips UNHEALTHY");

    let mut events = fleet.orchestrator.subscribe();
    fleet.orchestrator.on_heartbeat("bedwars-1");

    assert_eq!(
        fleet.orchestrator.get("bedwars-1").unwrap().status,
        ServerStatus::Running
    );
    let event = events.try_recv().unwrap();
    assert!(event.recovered(), "recovery event emitted: {event:?}");

    fleet.orchestrator.shutdown_fleet().await;
}
