//! HostBuilder: 从 HierarchyBlueprint 构建 SyncHost
//!
//! 节点按父子顺序插入（父节点可以在配置中出现在子节点之后），
//! 然后挂载存储、声明参数、创建同步边。边在 `SyncHost::start` 之前不会激活。

use std::collections::HashSet;

use contracts::{ContractError, HierarchyBlueprint, NodeConfig, RuntimeGraph};
use tracing::{info, instrument};

use crate::{MemoryStore, SyncHost, World};

/// Blueprint -> running host
pub struct HostBuilder;

impl HostBuilder {
    /// 构建 SyncHost 与 ID -> 句柄映射
    ///
    /// 结构错误（未知父节点、父链成环、无存储节点上的参数或边）返回
    /// `ConfigValidation`。
    #[instrument(
        name = "host_builder_from_blueprint",
        skip(blueprint),
        fields(nodes = blueprint.nodes.len(), edges = blueprint.edges.len())
    )]
    pub fn from_blueprint(
        blueprint: &HierarchyBlueprint,
    ) -> Result<(SyncHost, RuntimeGraph), ContractError> {
        let mut world = World::new();
        let mut graph = RuntimeGraph::new();

        for config in Self::parent_first(&blueprint.nodes)? {
            let parent = match &config.parent {
                Some(parent_id) => Some(graph.node(parent_id).ok_or_else(|| {
                    ContractError::config_validation(
                        format!("nodes.{}.parent", config.id),
                        format!("unknown parent '{parent_id}'"),
                    )
                })?),
                None => None,
            };
            let handle = world.add_node(config.id.clone(), parent)?;
            graph.register_node(config.id.clone(), handle);

            if config.has_store {
                let mut store = MemoryStore::new().with_auto_clear_triggers(config.auto_clear_triggers);
                store.set_ready(config.ready);
                world.attach_store(handle, store)?;
            } else if !config.params.is_empty() {
                return Err(ContractError::config_validation(
                    format!("nodes.{}.params", config.id),
                    "node without a store cannot declare params",
                ));
            }

            for decl in &config.params {
                let value = decl.initial_value().map_err(|message| {
                    ContractError::config_validation(
                        format!("nodes.{}.params.{}", config.id, decl.name),
                        message,
                    )
                })?;
                world.declare_param(handle, decl.name.clone(), decl.param_type, value)?;
            }
        }

        let mut host = SyncHost::new(world);

        for edge in &blueprint.edges {
            let node = graph.node(&edge.node).ok_or_else(|| {
                ContractError::config_validation(
                    format!("edges.{}.node", edge.id),
                    format!("unknown node '{}'", edge.node),
                )
            })?;
            let handle =
                host.add_edge_with_state(edge.id.clone(), node, &edge.sync_config(), edge.enabled)?;
            graph.register_edge(edge.id.clone(), edge.node.clone(), handle);
        }

        info!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "host built from blueprint"
        );

        Ok((host, graph))
    }

    /// 父节点优先的插入顺序；无法排序（未知父节点或成环）时报错
    fn parent_first(nodes: &[NodeConfig]) -> Result<Vec<&NodeConfig>, ContractError> {
        let mut placed: HashSet<&str> = HashSet::new();
        let mut ordered = Vec::with_capacity(nodes.len());
        let mut remaining: Vec<&NodeConfig> = nodes.iter().collect();

        while !remaining.is_empty() {
            let before = remaining.len();
            remaining.retain(|&config| {
                let ready = config
                    .parent
                    .as_deref()
                    .map_or(true, |parent| placed.contains(parent));
                if ready {
                    placed.insert(config.id.as_str());
                    ordered.push(config);
                }
                !ready
            });

            if remaining.len() == before {
                let stuck = remaining[0];
                return Err(ContractError::config_validation(
                    format!("nodes.{}.parent", stuck.id),
                    "parent is unknown or part of a cycle",
                ));
            }
        }

        Ok(ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{EdgeState, ParameterStore};

    fn blueprint(toml_str: &str) -> HierarchyBlueprint {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn test_child_before_parent() {
        let bp = blueprint(
            r#"
[[nodes]]
id = "hud"
parent = "root"
params = [{ name = "visible", type = "bool", value = true }]

[[nodes]]
id = "root"
params = [{ name = "health", type = "float", value = 1 }]

[[edges]]
id = "hud_from_root"
node = "hud"
direction = "from_parent"
"#,
        );
        let (mut host, graph) = HostBuilder::from_blueprint(&bp).unwrap();
        let hud = graph.node("hud").unwrap();
        let root = graph.node("root").unwrap();
        assert_eq!(host.world().parent(hud), Some(root));
        assert_eq!(graph.edge_to_node["hud_from_root"], "hud");

        host.start();
        let edge = graph.edge("hud_from_root").unwrap();
        assert_eq!(host.edge_state(edge).unwrap(), EdgeState::Bound);
        assert_eq!(host.world().store(hud).unwrap().get_float("health"), Some(1.0));
    }

    #[test]
    fn test_parent_cycle_rejected() {
        let bp = blueprint(
            r#"
[[nodes]]
id = "a"
parent = "b"

[[nodes]]
id = "b"
parent = "a"
"#,
        );
        let err = HostBuilder::from_blueprint(&bp).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
    }

    #[test]
    fn test_store_flags_applied() {
        let bp = blueprint(
            r#"
[[nodes]]
id = "root"
ready = false
auto_clear_triggers = true

[[nodes]]
id = "group"
parent = "root"
has_store = false
"#,
        );
        let (host, graph) = HostBuilder::from_blueprint(&bp).unwrap();
        let root = host.world().store(graph.node("root").unwrap()).unwrap();
        assert!(!root.is_ready());
        assert!(root.auto_clear_triggers());
        assert!(!host.world().has_store(graph.node("group").unwrap()));
    }

    #[test]
    fn test_params_on_storeless_node_rejected() {
        let bp = blueprint(
            r#"
[[nodes]]
id = "root"
has_store = false
params = [{ name = "x", type = "int" }]
"#,
        );
        assert!(HostBuilder::from_blueprint(&bp).is_err());
    }
}
