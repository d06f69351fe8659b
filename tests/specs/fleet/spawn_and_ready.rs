//! Spec: spawn a dynamic instance and observe it become ready.

use crate::prelude::*;

#[tokio::test]
async fn spawn_and_ready() {
    let fleet = Fleet::start(READY_SERVER, |_| {}).await;
    fleet.add_template("bedwars");
    let mut events = fleet.orchestrator.subscribe();

    let instance = fleet
        .orchestrator
        .spawn_dynamic("bedwars", SpawnOptions::default())
        .await
        .unwrap();

    assert_eq!(instance.server_id, "bedwars-1");
    assert_eq!(instance.port, 6100);
    assert_eq!(instance.status, ServerStatus::Running);
    assert_eq!(instance.server_type, ServerType::Dynamic);

    // CREATED stamped creation, STARTING stamped the start
    assert!(instance.created_at_ms > 0);
    assert!(instance.started_at_ms.is_some());

    // The clone and its log file are on disk
    assert_eq!(fleet.dynamic_entries(), ["bedwars-1"]);
    let log_appeared = wait_for(3_000, || {
        std::fs::read_to_string(fleet.path().join("logs/dynamic/bedwars-1.log"))
            .map(|log| log.contains("Server started"))
            .unwrap_or(false)
    })
    .await;
    assert!(log_appeared, "captured output reaches the log file");

    // Exactly one spawn event
    match events.try_recv().unwrap() {
        Event::ServerSpawn { server_id, server_type, port, template } => {
            assert_eq!(server_id, "bedwars-1");
            assert_eq!(server_type, ServerType::Dynamic);
            assert_eq!(port, 6100);
            assert_eq!(template.unwrap(), "bedwars");
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(events.try_recv().is_err());

    fleet.orchestrator.shutdown_fleet().await;
}

#[tokio::test]
async fn static_roundtrip_preserves_working_dir() {
    let fleet = Fleet::start(READY_SERVER, |config| {
        let mut lobby = StaticServerConfig::default();
        lobby.port = 6000;
        config.static_servers.insert("lobby".to_string(), lobby);
    })
    .await;
    fleet.add_static_dir("lobby");

    let instance = fleet.orchestrator.start_static("lobby").await.unwrap();
    assert_eq!(instance.port, 6000);
    assert_eq!(instance.status, ServerStatus::Running);

    fleet.orchestrator.shutdown("lobby", false).await.unwrap();
    assert!(fleet.orchestrator.get("lobby").is_none());
    assert_eq!(fleet.taken_ports(), 0);
    assert!(
        fleet.path().join("static/lobby/server.jar").is_file(),
        "static working dir survives shutdown"
    );

    // Shutting down an already-stopped id is a no-op
    fleet.orchestrator.shutdown("lobby", false).await.unwrap();
}
