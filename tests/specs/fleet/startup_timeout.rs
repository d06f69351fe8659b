//! Spec: a backend that dies during startup fails the spawn and
//! releases everything it acquired.

use crate::prelude::*;

#[tokio::test]
async fn dead_child_during_startup_rolls_back() {
    let fleet = Fleet::start(DOOMED_SERVER, |config| {
        config.process_start_timeout_seconds = 2;
    })
    .await;
    fleet.add_template("bedwars");

    let err = fleet
        .orchestrator
        .spawn_dynamic("bedwars", SpawnOptions::default())
        .await
        .unwrap_err();
    match err {
        FleetError::StartupFailed(reason) => {
            assert_eq!(reason, "Process exited during startup")
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(fleet.taken_ports(), 0, "port released");
    assert!(fleet.dynamic_entries().is_empty(), "clone deleted");
    assert!(fleet.orchestrator.list().is_empty(), "nothing registered");
}
