//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::simulation::{Simulation, SimulationConfig};

/// Execute the `run` command
pub async fn run_simulation(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    // Load and parse configuration
    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    let max_ticks = args.max_ticks.unwrap_or(blueprint.runtime.max_ticks);
    let tick_ms = args
        .tick_ms
        .unwrap_or(blueprint.runtime.tick_interval_ms)
        .max(1);

    info!(
        nodes = blueprint.nodes.len(),
        edges = blueprint.edges.len(),
        max_ticks,
        tick_ms,
        "Configuration loaded"
    );

    let simulation = Simulation::new(SimulationConfig {
        blueprint,
        max_ticks,
        tick_interval: Duration::from_millis(tick_ms),
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    });

    info!("Starting tick loop...");

    let stats = simulation
        .run(shutdown_signal())
        .await
        .context("Simulation failed")?;

    if args.json {
        let json = serde_json::to_string_pretty(&stats.report())
            .context("Failed to serialize simulation report")?;
        println!("{}", json);
    } else {
        stats.print_summary();
    }

    info!("Param Sync finished");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM. A handler that fails to install never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
