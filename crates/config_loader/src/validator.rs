//! 配置校验模块
//!
//! 校验规则：
//! - 字段级规则 (`validator` derive)：id 非空、tick_interval_ms >= 1
//! - node id / edge id 唯一
//! - 父节点存在，父链无环
//! - 同一节点内参数名唯一，初始值与声明类型匹配，无存储节点不可声明参数
//! - 边挂载的节点存在且有存储
//! - 脚本引用的节点 / 边存在

use std::collections::{HashMap, HashSet};

use ::validator::Validate;
use contracts::{ContractError, HierarchyBlueprint, NodeConfig, ScriptAction};

/// 校验 HierarchyBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &HierarchyBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_node_ids(blueprint)?;
    validate_edge_ids(blueprint)?;
    validate_parents(blueprint)?;
    validate_params(blueprint)?;
    validate_edges(blueprint)?;
    validate_script(blueprint)?;
    Ok(())
}

/// 字段级规则
fn validate_fields(blueprint: &HierarchyBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("blueprint", e.to_string()))
}

/// 校验 node id 唯一性
fn validate_node_ids(blueprint: &HierarchyBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for node in &blueprint.nodes {
        if !seen.insert(&node.id) {
            return Err(ContractError::config_validation(
                format!("nodes[id={}]", node.id),
                "duplicate node id",
            ));
        }
    }
    Ok(())
}

/// 校验 edge id 唯一性
fn validate_edge_ids(blueprint: &HierarchyBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for edge in &blueprint.edges {
        if !seen.insert(&edge.id) {
            return Err(ContractError::config_validation(
                format!("edges[id={}]", edge.id),
                "duplicate edge id",
            ));
        }
    }
    Ok(())
}

/// 校验父节点存在且父链无环
fn validate_parents(blueprint: &HierarchyBlueprint) -> Result<(), ContractError> {
    let parents: HashMap<&str, Option<&str>> = blueprint
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.parent.as_deref()))
        .collect();

    for node in &blueprint.nodes {
        let Some(parent) = node.parent.as_deref() else {
            continue;
        };
        if !parents.contains_key(parent) {
            return Err(ContractError::config_validation(
                format!("nodes[{}].parent", node.id),
                format!("parent '{parent}' not found"),
            ));
        }

        // 沿父链向上，步数超过节点数即成环
        let mut current = Some(parent);
        let mut steps = 0;
        while let Some(id) = current {
            if id == node.id || steps > parents.len() {
                return Err(ContractError::config_validation(
                    format!("nodes[{}].parent", node.id),
                    "parent chain forms a cycle",
                ));
            }
            current = parents.get(id).copied().flatten();
            steps += 1;
        }
    }
    Ok(())
}

/// 校验参数声明
fn validate_params(blueprint: &HierarchyBlueprint) -> Result<(), ContractError> {
    for node in &blueprint.nodes {
        if !node.has_store && !node.params.is_empty() {
            return Err(ContractError::config_validation(
                format!("nodes[{}].params", node.id),
                "node without a store cannot declare params",
            ));
        }

        let mut seen = HashSet::new();
        for decl in &node.params {
            if decl.name.is_empty() {
                return Err(ContractError::config_validation(
                    format!("nodes[{}].params", node.id),
                    "param name cannot be empty",
                ));
            }
            if !seen.insert(&decl.name) {
                return Err(ContractError::config_validation(
                    format!("nodes[{}].params[name={}]", node.id, decl.name),
                    "duplicate param name",
                ));
            }
            decl.initial_value().map_err(|message| {
                ContractError::config_validation(
                    format!("nodes[{}].params[{}].value", node.id, decl.name),
                    message,
                )
            })?;
        }
    }
    Ok(())
}

/// 校验边挂载的节点
fn validate_edges(blueprint: &HierarchyBlueprint) -> Result<(), ContractError> {
    let nodes = node_index(blueprint);
    for edge in &blueprint.edges {
        match nodes.get(edge.node.as_str()) {
            None => {
                return Err(ContractError::config_validation(
                    format!("edges[{}].node", edge.id),
                    format!("node '{}' not found", edge.node),
                ))
            }
            Some(node) if !node.has_store => {
                return Err(ContractError::config_validation(
                    format!("edges[{}].node", edge.id),
                    format!("node '{}' has no parameter store", edge.node),
                ))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// 校验脚本引用
fn validate_script(blueprint: &HierarchyBlueprint) -> Result<(), ContractError> {
    let nodes = node_index(blueprint);
    let edges: HashSet<&str> = blueprint.edges.iter().map(|e| e.id.as_str()).collect();

    for (idx, step) in blueprint.script.iter().enumerate() {
        if let Some(node_id) = step.action.node() {
            match nodes.get(node_id) {
                None => {
                    return Err(ContractError::config_validation(
                        format!("script[{idx}].action.node"),
                        format!("node '{node_id}' not found"),
                    ))
                }
                Some(node) if !node.has_store => {
                    return Err(ContractError::config_validation(
                        format!("script[{idx}].action.node"),
                        format!("node '{node_id}' has no parameter store"),
                    ))
                }
                Some(_) => {}
            }
        }
        if let Some(edge_id) = step.action.edge() {
            if !edges.contains(edge_id) {
                return Err(ContractError::config_validation(
                    format!("script[{idx}].action.edge"),
                    format!("edge '{edge_id}' not found"),
                ));
            }
        }
        if let ScriptAction::SetFloat { value, .. } = &step.action {
            if !value.is_finite() {
                return Err(ContractError::config_validation(
                    format!("script[{idx}].action.value"),
                    "float value must be finite",
                ));
            }
        }
    }
    Ok(())
}

fn node_index(blueprint: &HierarchyBlueprint) -> HashMap<&str, &NodeConfig> {
    blueprint
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        EdgeConfig, InitialValue, ParamDecl, ParamType, RuntimeConfig, ScriptStep, SyncDirection,
    };

    fn node(id: &str, parent: Option<&str>) -> NodeConfig {
        NodeConfig {
            id: id.to_string(),
            parent: parent.map(str::to_string),
            has_store: true,
            ready: true,
            auto_clear_triggers: false,
            params: vec![],
        }
    }

    fn edge(id: &str, node: &str, direction: SyncDirection) -> EdgeConfig {
        EdgeConfig {
            id: id.to_string(),
            node: node.to_string(),
            direction,
            include: vec![],
            exclude: vec![],
            debug: false,
            enabled: true,
        }
    }

    fn create_valid_blueprint() -> HierarchyBlueprint {
        let mut root = node("root", None);
        root.params = vec![ParamDecl::new("health", ParamType::Float).with_value(InitialValue::Float(1.0))];
        HierarchyBlueprint {
            version: Default::default(),
            runtime: RuntimeConfig::default(),
            nodes: vec![root, node("hud", Some("root"))],
            edges: vec![edge("hud_from_root", "hud", SyncDirection::FromParent)],
            script: vec![ScriptStep {
                tick: 1,
                action: ScriptAction::MarkReady {
                    node: "hud".to_string(),
                },
            }],
        }
    }

    fn field_of(err: ContractError) -> String {
        match err {
            ContractError::ConfigValidation { field, .. } => field,
            other => panic!("expected ConfigValidation, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_blueprint() {
        assert!(validate(&create_valid_blueprint()).is_ok());
    }

    #[test]
    fn test_zero_tick_interval() {
        let mut bp = create_valid_blueprint();
        bp.runtime.tick_interval_ms = 0;
        assert!(field_of(validate(&bp).unwrap_err()).contains("blueprint"));
    }

    #[test]
    fn test_empty_node_id() {
        let mut bp = create_valid_blueprint();
        bp.nodes.push(node("", None));
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_duplicate_node_id() {
        let mut bp = create_valid_blueprint();
        bp.nodes.push(node("hud", None));
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("duplicate node id"));
    }

    #[test]
    fn test_duplicate_edge_id() {
        let mut bp = create_valid_blueprint();
        bp.edges
            .push(edge("hud_from_root", "hud", SyncDirection::ToParent));
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("duplicate edge id"));
    }

    #[test]
    fn test_missing_parent() {
        let mut bp = create_valid_blueprint();
        bp.nodes.push(node("orphan", Some("ghost")));
        assert_eq!(field_of(validate(&bp).unwrap_err()), "nodes[orphan].parent");
    }

    #[test]
    fn test_parent_cycle() {
        let mut bp = create_valid_blueprint();
        bp.nodes.push(node("a", Some("b")));
        bp.nodes.push(node("b", Some("a")));
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_self_parent() {
        let mut bp = create_valid_blueprint();
        bp.nodes.push(node("loop", Some("loop")));
        assert!(validate(&bp).unwrap_err().to_string().contains("cycle"));
    }

    #[test]
    fn test_duplicate_param() {
        let mut bp = create_valid_blueprint();
        bp.nodes[1].params = vec![
            ParamDecl::new("x", ParamType::Int),
            ParamDecl::new("x", ParamType::Bool),
        ];
        assert!(validate(&bp)
            .unwrap_err()
            .to_string()
            .contains("duplicate param name"));
    }

    #[test]
    fn test_bad_initial_value() {
        let mut bp = create_valid_blueprint();
        bp.nodes[1].params =
            vec![ParamDecl::new("flag", ParamType::Bool).with_value(InitialValue::Int(1))];
        assert_eq!(
            field_of(validate(&bp).unwrap_err()),
            "nodes[hud].params[flag].value"
        );
    }

    #[test]
    fn test_edge_on_storeless_node() {
        let mut bp = create_valid_blueprint();
        bp.nodes[1].has_store = false;
        bp.script.clear();
        assert_eq!(field_of(validate(&bp).unwrap_err()), "edges[hud_from_root].node");
    }

    #[test]
    fn test_script_unknown_edge() {
        let mut bp = create_valid_blueprint();
        bp.script.push(ScriptStep {
            tick: 3,
            action: ScriptAction::DisableEdge {
                edge: "nope".to_string(),
            },
        });
        assert_eq!(field_of(validate(&bp).unwrap_err()), "script[1].action.edge");
    }
}
