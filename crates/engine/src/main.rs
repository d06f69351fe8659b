// SPDX-License-Identifier: MIT

//! numdrassld: boot the fleet orchestrator over a servers root.

use numdrassl_config::OrchestratorConfig;
use numdrassl_engine::{FleetError, Orchestrator, ServersLayout};
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let root = std::env::args().nth(1).unwrap_or_else(|| "servers".to_string());
    match run(Path::new(&root)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("orchestrator failed: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(root: &Path) -> Result<(), FleetError> {
    let layout = ServersLayout::new(root);
    let config = OrchestratorConfig::load_or_default(&layout.config_path())?;
    let orchestrator = Orchestrator::from_config(root, config);
    orchestrator.init().await?;
    info!("fleet orchestrator ready at {}", root.display());

    // Runs until interrupted; a failed signal read still shuts down
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("signal listener failed: {err}");
    }

    info!("shutting down fleet");
    orchestrator.shutdown_fleet().await;
    Ok(())
}
