//! Simulation runner - builds the host and drives the tick loop.

use std::future::Future;
use std::time::{Duration, Instant};

use contracts::HierarchyBlueprint;
use observability::{record_edge_report, record_propagation, record_tick};
use param_sync::{HostBuilder, Script, SyncHost};
use tracing::{debug, info, warn};

use super::{NodeSnapshot, SimulationStats};
use crate::error::{CliError, Result};

/// Simulation configuration
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// The hierarchy blueprint
    pub blueprint: HierarchyBlueprint,

    /// Number of ticks to run
    pub max_ticks: u64,

    /// Interval between ticks
    pub tick_interval: Duration,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main tick loop orchestrator
pub struct Simulation {
    config: SimulationConfig,
}

impl Simulation {
    /// Create a new simulation with the given configuration
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Run until `max_ticks` or until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<SimulationStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let (mut host, graph) =
            HostBuilder::from_blueprint(blueprint).map_err(|e| CliError::build(e.to_string()))?;
        let script = Script::new(&blueprint.script);

        info!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            script_steps = script.len(),
            "Hierarchy built"
        );

        host.start();

        let mut stats = SimulationStats::default();
        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tokio::pin!(shutdown);

        while stats.ticks < self.config.max_ticks {
            tokio::select! {
                _ = interval.tick() => {}
                _ = &mut shutdown => {
                    warn!(ticks = stats.ticks, "Received shutdown signal, stopping tick loop");
                    stats.interrupted = true;
                    break;
                }
            }

            let tick = host.frame() + 1;
            script
                .run_tick(tick, &mut host, &graph)
                .map_err(|e| CliError::script(tick, e.to_string()))?;

            let report = host.tick();
            record_tick(&report);
            stats.aggregator.update(&report);
            stats.ticks = report.frame;

            debug!(
                frame = report.frame,
                bound_edges = report.bound_edges,
                changes = report.depths.len(),
                "Tick complete"
            );
        }

        if let Some(last) = script.last_tick() {
            if last > stats.ticks {
                warn!(
                    last_script_tick = last,
                    ticks = stats.ticks,
                    "Script steps beyond the last tick were not executed"
                );
            }
        }

        Self::collect(&host, &graph, &mut stats);
        stats.duration = start_time.elapsed();

        info!(
            ticks = stats.ticks,
            duration_secs = stats.duration.as_secs_f64(),
            "Simulation finished"
        );

        Ok(stats)
    }

    /// Final per-edge and per-node state
    fn collect(host: &SyncHost, graph: &contracts::RuntimeGraph, stats: &mut SimulationStats) {
        let edges = host.edge_reports();
        for report in &edges {
            record_edge_report(report);
        }
        record_propagation(host.propagation_stats());

        stats.aggregator.update_edges(&edges);
        stats.aggregator.update_propagation(host.propagation_stats());
        stats.edges = edges;

        let mut nodes: Vec<(&String, &contracts::NodeId)> = graph.nodes.iter().collect();
        nodes.sort_by(|a, b| a.0.cmp(b.0));

        stats.snapshots = nodes
            .into_iter()
            .filter_map(|(id, handle)| {
                host.snapshot(*handle).ok().map(|params| NodeSnapshot {
                    node: id.clone(),
                    params,
                })
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blueprint() -> HierarchyBlueprint {
        config_loader::ConfigLoader::load_from_str(
            r#"
[runtime]
tick_interval_ms = 1
max_ticks = 3

[[nodes]]
id = "root"
params = [{ name = "health", type = "float", value = 1.0 }]

[[nodes]]
id = "hud"
parent = "root"
ready = false

[[edges]]
id = "hud_from_root"
node = "hud"
direction = "from_parent"

[[script]]
tick = 2
action = { kind = "mark_ready", node = "hud" }
"#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap()
    }

    fn config(max_ticks: u64) -> SimulationConfig {
        SimulationConfig {
            blueprint: blueprint(),
            max_ticks,
            tick_interval: Duration::from_millis(1),
            metrics_port: None,
        }
    }

    #[tokio::test]
    async fn test_run_to_completion() {
        let stats = Simulation::new(config(3))
            .run(std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.ticks, 3);
        assert!(!stats.interrupted);
        assert_eq!(stats.edges[0].stats.bootstraps, 1);

        let hud = stats.snapshots.iter().find(|s| s.node == "hud").unwrap();
        assert_eq!(hud.params.len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_early() {
        let stats = Simulation::new(config(1_000))
            .run(async {})
            .await
            .unwrap();
        assert!(stats.interrupted);
        assert!(stats.ticks < 1_000);
    }
}
