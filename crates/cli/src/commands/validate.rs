//! `validate` command implementation.

use std::collections::HashMap;

use anyhow::{Context, Result};
use contracts::{HierarchyBlueprint, NodeConfig, SyncDirection};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    node_count: usize,
    store_count: usize,
    param_count: usize,
    edge_count: usize,
    script_steps: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    node_count: blueprint.nodes.len(),
                    store_count: blueprint.nodes.iter().filter(|n| n.has_store).count(),
                    param_count: blueprint.nodes.iter().map(|n| n.params.len()).sum(),
                    edge_count: blueprint.edges.len(),
                    script_steps: blueprint.script.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
///
/// Assumes the blueprint already passed validation.
fn collect_warnings(blueprint: &HierarchyBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let nodes: HashMap<&str, &NodeConfig> =
        blueprint.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    if blueprint.edges.is_empty() {
        warnings.push("No edges configured - parameters will not be synchronized".to_string());
    }

    for edge in &blueprint.edges {
        match edge.direction {
            SyncDirection::FromParent if !has_ancestor_store(&nodes, &edge.node) => {
                warnings.push(format!(
                    "Edge '{}': node '{}' has no ancestor with a store - edge will stay inactive",
                    edge.id, edge.node
                ));
            }
            SyncDirection::ToParent if !direct_parent_has_store(&nodes, &edge.node) => {
                warnings.push(format!(
                    "Edge '{}': node '{}' has no direct parent with a store - edge will be inert",
                    edge.id, edge.node
                ));
            }
            _ => {}
        }

        if !edge.include.is_empty() && !edge.exclude.is_empty() {
            warnings.push(format!(
                "Edge '{}': include and exclude both set - exclude is ignored",
                edge.id
            ));
        }
    }

    // Opposing edges on one node form a sync cycle (guarded at runtime)
    let mut directions: HashMap<&str, (bool, bool)> = HashMap::new();
    for edge in &blueprint.edges {
        let entry = directions.entry(edge.node.as_str()).or_default();
        match edge.direction {
            SyncDirection::FromParent => entry.0 = true,
            SyncDirection::ToParent => entry.1 = true,
        }
    }
    let mut opposing: Vec<&str> = directions
        .into_iter()
        .filter(|(_, (down, up))| *down && *up)
        .map(|(node, _)| node)
        .collect();
    opposing.sort_unstable();
    for node in opposing {
        warnings.push(format!(
            "Node '{}' syncs in both directions - echo writes are suppressed at runtime",
            node
        ));
    }

    warnings
}

fn has_ancestor_store(nodes: &HashMap<&str, &NodeConfig>, node: &str) -> bool {
    let mut current = nodes.get(node).and_then(|n| n.parent.as_deref());
    let mut steps = 0;
    while let Some(id) = current {
        let Some(config) = nodes.get(id) else {
            return false;
        };
        if config.has_store {
            return true;
        }
        current = config.parent.as_deref();
        steps += 1;
        if steps > nodes.len() {
            return false;
        }
    }
    false
}

fn direct_parent_has_store(nodes: &HashMap<&str, &NodeConfig>, node: &str) -> bool {
    nodes
        .get(node)
        .and_then(|n| n.parent.as_deref())
        .and_then(|parent| nodes.get(parent))
        .is_some_and(|parent| parent.has_store)
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Nodes: {} ({} with stores)", summary.node_count, summary.store_count);
            println!("  Declared params: {}", summary.param_count);
            println!("  Edges: {}", summary.edge_count);
            println!("  Script steps: {}", summary.script_steps);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
