//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{HierarchyBlueprint, NodeConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    tick_interval_ms: u64,
    max_ticks: u64,
    nodes: Vec<NodeInfo>,
    edges: Vec<EdgeInfo>,
    script_steps: usize,
}

#[derive(Serialize)]
struct NodeInfo {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    depth: usize,
    has_store: bool,
    ready: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    params: Vec<ParamInfo>,
}

#[derive(Serialize)]
struct ParamInfo {
    name: String,
    param_type: String,
}

#[derive(Serialize)]
struct EdgeInfo {
    id: String,
    node: String,
    direction: String,
    enabled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    include: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    exclude: Vec<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &HierarchyBlueprint, args: &InfoArgs) -> ConfigInfo {
    let mut nodes = Vec::new();
    walk(blueprint, None, 0, &mut |node: &NodeConfig, depth: usize| {
        let params = if args.params {
            node.params
                .iter()
                .map(|p| ParamInfo {
                    name: p.name.to_string(),
                    param_type: p.param_type.to_string(),
                })
                .collect()
        } else {
            Vec::new()
        };
        nodes.push(NodeInfo {
            id: node.id.clone(),
            parent: node.parent.clone(),
            depth,
            has_store: node.has_store,
            ready: node.ready,
            params,
        });
    });

    let edges = blueprint
        .edges
        .iter()
        .map(|e| EdgeInfo {
            id: e.id.clone(),
            node: e.node.clone(),
            direction: e.direction.to_string(),
            enabled: e.enabled,
            include: e.include.iter().map(|n| n.to_string()).collect(),
            exclude: e.exclude.iter().map(|n| n.to_string()).collect(),
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        tick_interval_ms: blueprint.runtime.tick_interval_ms,
        max_ticks: blueprint.runtime.max_ticks,
        nodes,
        edges,
        script_steps: blueprint.script.len(),
    }
}

/// Depth-first walk over the hierarchy, children in blueprint order
fn walk<'a>(
    blueprint: &'a HierarchyBlueprint,
    parent: Option<&str>,
    depth: usize,
    visit: &mut dyn FnMut(&'a NodeConfig, usize),
) {
    for node in blueprint
        .nodes
        .iter()
        .filter(|n| n.parent.as_deref() == parent)
    {
        visit(node, depth);
        walk(blueprint, Some(node.id.as_str()), depth + 1, visit);
    }
}

fn print_config_info(blueprint: &HierarchyBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                Param Sync Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("⏱  Runtime");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Tick interval: {} ms", blueprint.runtime.tick_interval_ms);
    println!("   ├─ Max ticks: {}", blueprint.runtime.max_ticks);
    println!("   └─ Script steps: {}", blueprint.script.len());

    println!("\n🌳 Hierarchy ({} nodes)", blueprint.nodes.len());
    walk(blueprint, None, 0, &mut |node: &NodeConfig, depth: usize| {
        let indent = "   ".repeat(depth);
        let store = match (node.has_store, node.ready) {
            (false, _) => "no store",
            (true, true) => "store",
            (true, false) => "store, not ready",
        };
        println!("   {}└─ {} ({})", indent, node.id, store);

        if args.params {
            for param in &node.params {
                println!("   {}      • {}: {}", indent, param.name, param.param_type);
            }
        } else if !node.params.is_empty() {
            println!("   {}      {} declared params", indent, node.params.len());
        }
    });

    if !blueprint.edges.is_empty() {
        println!("\n🔗 Edges ({})", blueprint.edges.len());
        for (i, edge) in blueprint.edges.iter().enumerate() {
            let is_last = i == blueprint.edges.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            let filter = if !edge.include.is_empty() {
                format!(" include={:?}", edge.include.iter().map(|n| n.as_str()).collect::<Vec<_>>())
            } else if !edge.exclude.is_empty() {
                format!(" exclude={:?}", edge.exclude.iter().map(|n| n.as_str()).collect::<Vec<_>>())
            } else {
                String::new()
            };
            let disabled = if edge.enabled { "" } else { " (disabled)" };
            println!(
                "   {} {} on {} [{}]{}{}",
                prefix, edge.id, edge.node, edge.direction, filter, disabled
            );
        }
    }

    println!();
}
