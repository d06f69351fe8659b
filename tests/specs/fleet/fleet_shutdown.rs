//! Spec: orderly shutdown of a mixed fleet within the deadline.

use crate::prelude::*;

#[tokio::test]
async fn orderly_fleet_shutdown() {
    let fleet = Fleet::start(READY_SERVER, |config| {
        for (id, port) in [("lobby", 6000), ("auth", 6001)] {
            let mut cfg = StaticServerConfig::default();
            cfg.port = port;
            config.static_servers.insert(id.to_string(), cfg);
        }
    })
    .await;
    fleet.add_template("bedwars");
    fleet.add_static_dir("lobby");
    fleet.add_static_dir("auth");

    fleet.orchestrator.start_static("lobby").await.unwrap();
    fleet.orchestrator.start_static("auth").await.unwrap();
    for _ in 0..3 {
        fleet.orchestrator.spawn_dynamic("bedwars", SpawnOptions::default()).await.unwrap();
    }
    let stats = fleet.orchestrator.stats();
    assert_eq!((stats.total, stats.static_count, stats.dynamic_count), (5, 2, 3));

    let started = std::time::Instant::now();
    fleet.orchestrator.shutdown_fleet().await;
    assert!(started.elapsed() < Duration::from_secs(60));

    assert!(fleet.orchestrator.list().is_empty(), "registry drained");
    assert_eq!(fleet.taken_ports(), 0, "all ports released");
    assert!(fleet.dynamic_entries().is_empty(), "dynamic clones deleted");
    assert!(fleet.path().join("static/lobby").is_dir(), "static dirs preserved");
    assert!(fleet.path().join("static/auth").is_dir());
}
