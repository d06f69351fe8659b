//! Spec: a full port range fails the spawn with no residue.

use crate::prelude::*;

#[tokio::test]
async fn port_exhaustion_is_a_clean_precondition_failure() {
    let fleet = Fleet::start(READY_SERVER, |config| {
        config.port_allocation.dynamic_range_start = 6100;
        config.port_allocation.dynamic_range_end = 6101;
    })
    .await;
    fleet.add_template("bedwars");

    fleet.orchestrator.spawn_dynamic("bedwars", SpawnOptions::default()).await.unwrap();
    fleet.orchestrator.spawn_dynamic("bedwars", SpawnOptions::default()).await.unwrap();

    let err = fleet
        .orchestrator
        .spawn_dynamic("bedwars", SpawnOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FleetError::PortExhausted { lo: 6100, hi: 6101 }));

    // No directory created, no registry entry, both live ports intact
    assert_eq!(fleet.dynamic_entries(), ["bedwars-1", "bedwars-2"]);
    assert_eq!(fleet.orchestrator.list().len(), 2);
    assert_eq!(fleet.taken_ports(), 2);

    fleet.orchestrator.shutdown_fleet().await;
}
