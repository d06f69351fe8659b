//! Spec: the health probe detects an externally killed process.

use crate::prelude::*;

#[tokio::test]
async fn crashed_dynamic_is_detected_and_reclaimed() {
    let fleet = Fleet::start(READY_SERVER, |config| {
        config.health_check_interval_seconds = 1;
    })
    .await;
    fleet.add_template("bedwars");
    fleet.orchestrator.spawn_dynamic("bedwars", SpawnOptions::default()).await.unwrap();
    let mut events = fleet.orchestrator.subscribe();

    fleet.kill_externally("bedwars-1");

    // Within one probe interval the crash is observed; the cleanup
    // unregisters the instance and deletes the clone
    let reclaimed = wait_for(5_000, || fleet.orchestrator.get("bedwars-1").is_none()).await;
    assert!(reclaimed, "crashed dynamic instance reclaimed");
    assert!(fleet.dynamic_entries().is_empty());
    assert_eq!(fleet.taken_ports(), 0);

    let mut saw_failed = false;
    let mut saw_crash_shutdown = false;
    while let Ok(event) = events.try_recv() {
        match event {
            Event::ServerHealth { new: ServerStatus::Failed, message, .. } => {
                assert_eq!(message.as_deref(), Some("Process died"));
                saw_failed = true;
            }
            Event::ServerShutdown { reason, forced, .. } => {
                assert_eq!(reason, ShutdownReason::ProcessCrashed);
                assert!(forced);
                saw_crash_shutdown = true;
            }
            _ => {}
        }
    }
    assert!(saw_failed, "health event for the crash");
    assert!(saw_crash_shutdown, "shutdown event for the cleanup");
}

#[tokio::test]
async fn crashed_static_preserves_directory() {
    let fleet = Fleet::start(READY_SERVER, |config| {
        config.health_check_interval_seconds = 1;
        let mut lobby = StaticServerConfig::default();
        lobby.port = 6000;
        config.static_servers.insert("lobby".to_string(), lobby);
    })
    .await;
    fleet.add_static_dir("lobby");
    fleet.orchestrator.start_static("lobby").await.unwrap();

    fleet.kill_externally("lobby");

    let failed = wait_for(5_000, || {
        fleet
            .orchestrator
            .get("lobby")
            .map(|i| i.status == ServerStatus::Failed)
            .unwrap_or(false)
    })
    .await;
    assert!(failed, "crashed static marked FAILED");
    let snapshot = fleet.orchestrator.get("lobby").unwrap();
    assert_eq!(snapshot.stop_reason.as_deref(), Some("Process died"));
    assert!(
        fleet.path().join("static/lobby/server.jar").is_file(),
        "static working dir preserved after crash"
    );
}
