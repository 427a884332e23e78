//! Simulation statistics and final state.

use std::time::Duration;

use contracts::{EdgeReport, ParamSnapshotEntry};
use observability::SyncStatsAggregator;
use serde::Serialize;

/// Final parameter state of one node
#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub node: String,
    pub params: Vec<ParamSnapshotEntry>,
}

/// Statistics from a simulation run
#[derive(Debug, Clone, Default)]
pub struct SimulationStats {
    /// Ticks executed
    pub ticks: u64,

    /// Stopped by a shutdown signal before `max_ticks`
    pub interrupted: bool,

    /// Total duration of the run
    pub duration: Duration,

    /// Final report for every edge
    pub edges: Vec<EdgeReport>,

    /// Final store contents, sorted by node id
    pub snapshots: Vec<NodeSnapshot>,

    /// Tick / edge metrics aggregator
    pub aggregator: SyncStatsAggregator,
}

/// JSON view of a run
#[derive(Debug, Serialize)]
pub struct SimulationReport<'a> {
    pub ticks: u64,
    pub interrupted: bool,
    pub duration_secs: f64,
    pub changes: u64,
    pub deliveries: u64,
    pub max_depth: u64,
    pub edges: &'a [EdgeReport],
    pub nodes: &'a [NodeSnapshot],
}

impl SimulationStats {
    /// Ticks per second actually achieved
    pub fn tps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.ticks as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn report(&self) -> SimulationReport<'_> {
        SimulationReport {
            ticks: self.ticks,
            interrupted: self.interrupted,
            duration_secs: self.duration.as_secs_f64(),
            changes: self.aggregator.total_changes,
            deliveries: self.aggregator.propagation.deliveries,
            max_depth: self.aggregator.propagation.max_depth,
            edges: &self.edges,
            nodes: &self.snapshots,
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Simulation Statistics                     ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Ticks: {}", self.ticks);
        println!("   ├─ TPS: {:.2}", self.tps());
        println!("   └─ Interrupted: {}", self.interrupted);

        println!("\n🔗 Edges ({})", self.edges.len());
        for (i, edge) in self.edges.iter().enumerate() {
            let prefix = if i == self.edges.len() - 1 { "└─" } else { "├─" };
            println!(
                "   {} {} [{} on {}] {}: applied={} filtered={} owned_skipped={} not_forwarded={}",
                prefix,
                edge.name,
                edge.direction,
                edge.node,
                edge.state,
                edge.stats.applied,
                edge.stats.filtered,
                edge.stats.owned_skipped,
                edge.stats.not_forwarded
            );
        }

        println!("\n🗂  Final State");
        for snapshot in &self.snapshots {
            println!("   {}", snapshot.node);
            if snapshot.params.is_empty() {
                println!("      (empty)");
            }
            for entry in &snapshot.params {
                println!("      {}", entry);
            }
        }

        println!("\n{}", self.aggregator.summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tps_zero_duration() {
        let stats = SimulationStats {
            ticks: 10,
            ..Default::default()
        };
        assert_eq!(stats.tps(), 0.0);
    }

    #[test]
    fn test_report_json() {
        let stats = SimulationStats {
            ticks: 4,
            duration: Duration::from_millis(500),
            ..Default::default()
        };
        let json = serde_json::to_value(stats.report()).unwrap();
        assert_eq!(json["ticks"], 4);
        assert_eq!(json["duration_secs"], 0.5);
        assert!(json["edges"].as_array().unwrap().is_empty());
    }
}
