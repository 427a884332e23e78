//! Tick-indexed scripted actions from a blueprint.

use std::collections::BTreeMap;

use contracts::{ContractError, RuntimeGraph, ScriptAction, ScriptStep};

use crate::SyncHost;

/// Script steps grouped by the tick they run on
#[derive(Debug, Clone, Default)]
pub struct Script {
    steps: BTreeMap<u64, Vec<ScriptAction>>,
}

impl Script {
    pub fn new(steps: &[ScriptStep]) -> Self {
        let mut grouped: BTreeMap<u64, Vec<ScriptAction>> = BTreeMap::new();
        for step in steps {
            grouped.entry(step.tick).or_default().push(step.action.clone());
        }
        Self { steps: grouped }
    }

    /// Actions for `tick`, in blueprint order
    pub fn actions_at(&self, tick: u64) -> &[ScriptAction] {
        self.steps.get(&tick).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn last_tick(&self) -> Option<u64> {
        self.steps.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.steps.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every action scheduled for `tick`; stops at the first failure
    pub fn run_tick(
        &self,
        tick: u64,
        host: &mut SyncHost,
        graph: &RuntimeGraph,
    ) -> Result<usize, ContractError> {
        let actions = self.actions_at(tick);
        for action in actions {
            apply_action(host, graph, action)?;
        }
        Ok(actions.len())
    }
}

/// Execute one scripted action against the host
pub fn apply_action(
    host: &mut SyncHost,
    graph: &RuntimeGraph,
    action: &ScriptAction,
) -> Result<(), ContractError> {
    let node = |id: &str| graph.node(id).ok_or_else(|| ContractError::unknown_node(id));
    let edge = |id: &str| graph.edge(id).ok_or_else(|| ContractError::unknown_edge(id));

    tracing::debug!(?action, "script action");

    match action {
        ScriptAction::SetFloat { node: id, name, value } => host.set_float(node(id)?, name, *value),
        ScriptAction::SetInt { node: id, name, value } => host.set_int(node(id)?, name, *value),
        ScriptAction::SetBool { node: id, name, value } => host.set_bool(node(id)?, name, *value),
        ScriptAction::FireTrigger { node: id, name } => host.fire_trigger(node(id)?, name),
        ScriptAction::ClearTrigger { node: id, name } => host.clear_trigger(node(id)?, name),
        ScriptAction::MarkReady { node: id } => host.mark_ready(node(id)?, true),
        ScriptAction::EnableEdge { edge: id } => host.enable_edge(edge(id)?),
        ScriptAction::DisableEdge { edge: id } => host.disable_edge(edge(id)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HostBuilder;
    use contracts::{EdgeState, HierarchyBlueprint, ParameterStore};

    const BLUEPRINT: &str = r#"
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

[[script]]
tick = 4
action = { kind = "set_float", node = "root", name = "health", value = 0.25 }

[[script]]
tick = 2
action = { kind = "fire_trigger", node = "root", name = "flash" }
"#;

    #[test]
    fn test_grouping() {
        let bp: HierarchyBlueprint = toml::from_str(BLUEPRINT).unwrap();
        let script = Script::new(&bp.script);
        assert_eq!(script.len(), 3);
        assert_eq!(script.actions_at(2).len(), 2);
        assert!(script.actions_at(3).is_empty());
        assert_eq!(script.last_tick(), Some(4));
    }

    #[test]
    fn test_readiness_script() {
        let bp: HierarchyBlueprint = toml::from_str(BLUEPRINT).unwrap();
        let script = Script::new(&bp.script);
        let (mut host, graph) = HostBuilder::from_blueprint(&bp).unwrap();
        let edge = graph.edge("hud_from_root").unwrap();
        let hud = graph.node("hud").unwrap();
        host.start();

        for tick in 1..=4 {
            script.run_tick(tick, &mut host, &graph).unwrap();
            host.tick();
            if tick == 1 {
                assert_eq!(host.edge_state(edge).unwrap(), EdgeState::WaitingForReady);
            }
        }

        let store = host.world().store(hud).unwrap();
        assert_eq!(store.get_float("health"), Some(0.25));
        assert_eq!(store.get_bool("flash"), Some(true));
        assert_eq!(host.edge_report(edge).unwrap().stats.bootstraps, 1);
    }

    #[test]
    fn test_unknown_reference() {
        let mut host = SyncHost::default();
        let graph = RuntimeGraph::new();
        let action = ScriptAction::EnableEdge {
            edge: "missing".to_string(),
        };
        let err = apply_action(&mut host, &graph, &action).unwrap_err();
        assert!(matches!(err, ContractError::UnknownEdge { .. }));
    }
}
