//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 配置 -> HostBuilder -> SyncHost 的场景测试
//! - 基于 tokio interval 的帧循环 e2e 测试

#[cfg(test)]
mod support {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::RuntimeGraph;
    use param_sync::{HostBuilder, SyncHost};

    /// Load, validate and build a host from TOML
    pub fn build(toml: &str) -> (SyncHost, RuntimeGraph) {
        let blueprint = ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap();
        HostBuilder::from_blueprint(&blueprint).unwrap()
    }

    pub fn started(toml: &str) -> (SyncHost, RuntimeGraph) {
        let (mut host, graph) = build(toml);
        host.start();
        (host, graph)
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{
        FilterConfig, NotifyPolicy, ParamName, ParamSnapshotEntry, ParamType, ParamUpdate,
        ParamValue, ParameterStore, RequirePolicy, WriteOptions,
    };
    use param_sync::{snapshot_to_update, FilterSpec, MemoryStore};

    #[test]
    fn test_param_update_json_contract() {
        let updates = vec![
            ParamUpdate::float("health", 0.5),
            ParamUpdate::trigger_set("hit"),
            ParamUpdate::trigger_clear("hit"),
        ];
        let json = serde_json::to_string(&updates).unwrap();
        let decoded: Vec<ParamUpdate> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, updates);
        assert_eq!(decoded[2].value(), None);
    }

    #[test]
    fn test_filter_include_wins_over_exclude() {
        let filter = FilterSpec::from(&FilterConfig {
            include: vec![ParamName::from("a")],
            exclude: vec![ParamName::from("a")],
        });
        assert!(filter.should_sync("a"));
        assert!(!filter.should_sync("b"));
    }

    #[test]
    fn test_filter_default_allows_all() {
        let filter = FilterSpec::from(&FilterConfig::default());
        for name in ["a", "health", "", "debug"] {
            assert!(filter.should_sync(name));
        }
    }

    #[test]
    fn test_change_only_broadcast() {
        let mut store = MemoryStore::new();
        let options = WriteOptions::new(NotifyPolicy::NotifyOnChange, RequirePolicy::CreateIfAbsent);

        assert!(store.set_float("speed", 1.5, options).unwrap().is_some());
        assert!(store.set_float("speed", 1.5, options).unwrap().is_none());
        assert!(store.set_bool("flag", false, options).unwrap().is_some());
        assert!(store.set_bool("flag", false, options).unwrap().is_none());

        let always = WriteOptions::new(NotifyPolicy::AlwaysNotify, RequirePolicy::CreateIfAbsent);
        assert_eq!(
            store.set_float("speed", 1.5, always).unwrap(),
            Some(ParamUpdate::float("speed", 1.5))
        );
    }

    #[test]
    fn test_trigger_snapshot_translation() {
        let set = ParamSnapshotEntry::new("t", ParamType::Trigger, ParamValue::Bool(true));
        let clear = ParamSnapshotEntry::new("t", ParamType::Trigger, ParamValue::Bool(false));
        assert_eq!(snapshot_to_update(&set), ParamUpdate::trigger_set("t"));
        assert_eq!(snapshot_to_update(&clear), ParamUpdate::trigger_clear("t"));
    }
}

#[cfg(test)]
mod scenario_tests {
    use contracts::{EdgeState, ParamType, ParameterStore};

    use super::support::{build, started};

    const PARENT_CHILD: &str = r#"
[[nodes]]
id = "parent"
params = [
    { name = "x", type = "float", value = 1.0 },
    { name = "y", type = "int", value = 5 },
]

[[nodes]]
id = "child"
parent = "parent"
params = [{ name = "x", type = "float", value = 9.0 }]

[[edges]]
id = "child_from_parent"
node = "child"
direction = "from_parent"
"#;

    #[test]
    fn test_bootstrap_ownership_skip_and_apply() {
        let (host, graph) = started(PARENT_CHILD);
        let child = graph.node("child").unwrap();
        let store = host.world().store(child).unwrap();

        // Declared locally: not overwritten by the initial pull
        assert_eq!(store.get_float("x"), Some(9.0));
        // Not declared: pulled from the parent
        assert_eq!(store.get_int("y"), Some(5));

        let report = host
            .edge_report(graph.edge("child_from_parent").unwrap())
            .unwrap();
        assert_eq!(report.stats.owned_skipped, 1);
        assert_eq!(report.stats.bootstraps, 1);
    }

    #[test]
    fn test_incremental_overrides_owned_param() {
        let (mut host, graph) = started(PARENT_CHILD);
        let parent = graph.node("parent").unwrap();
        let child = graph.node("child").unwrap();

        host.set_float(parent, "x", 2.0).unwrap();
        assert_eq!(host.world().store(child).unwrap().get_float("x"), Some(2.0));
    }

    #[test]
    fn test_trigger_round_trip() {
        let (mut host, graph) = started(PARENT_CHILD);
        let parent = graph.node("parent").unwrap();
        let child = graph.node("child").unwrap();

        host.fire_trigger(parent, "t").unwrap();
        let store = host.world().store(child).unwrap();
        assert_eq!(store.get_bool("t"), Some(true));
        assert_eq!(store.param_type("t"), Some(ParamType::Trigger));

        // Stays set across ticks until cleared
        host.tick();
        host.tick();
        assert_eq!(host.world().store(child).unwrap().get_bool("t"), Some(true));

        // Pull side forwards the clear downward
        host.clear_trigger(parent, "t").unwrap();
        assert_eq!(host.world().store(child).unwrap().get_bool("t"), Some(false));
    }

    #[test]
    fn test_readiness_deferral_runs_once() {
        let (mut host, graph) = started(
            r#"
[[nodes]]
id = "parent"
params = [{ name = "y", type = "int", value = 5 }]

[[nodes]]
id = "child"
parent = "parent"
ready = false

[[edges]]
id = "down"
node = "child"
direction = "from_parent"
"#,
        );
        let child = graph.node("child").unwrap();
        let edge = graph.edge("down").unwrap();

        host.tick();
        assert_eq!(host.edge_state(edge).unwrap(), EdgeState::WaitingForReady);
        assert_eq!(host.world().store(child).unwrap().get_int("y"), None);

        host.mark_ready(child, true).unwrap();
        host.tick();
        host.tick();

        assert_eq!(host.edge_state(edge).unwrap(), EdgeState::Bound);
        assert_eq!(host.world().store(child).unwrap().get_int("y"), Some(5));
        assert_eq!(host.edge_report(edge).unwrap().stats.bootstraps, 1);
    }

    #[test]
    fn test_directional_asymmetry() {
        let (mut host, graph) = started(
            r#"
[[nodes]]
id = "parent"

[[nodes]]
id = "child"
parent = "parent"

[[edges]]
id = "up"
node = "child"
direction = "to_parent"
"#,
        );
        let parent = graph.node("parent").unwrap();
        let child = graph.node("child").unwrap();

        host.fire_trigger(child, "t").unwrap();
        assert_eq!(host.world().store(parent).unwrap().get_bool("t"), Some(true));

        host.clear_trigger(child, "t").unwrap();
        assert_eq!(host.world().store(child).unwrap().get_bool("t"), Some(false));
        assert_eq!(host.world().store(parent).unwrap().get_bool("t"), Some(true));

        let report = host.edge_report(graph.edge("up").unwrap()).unwrap();
        assert_eq!(report.stats.not_forwarded, 1);
    }

    #[test]
    fn test_exclude_debug_scenario() {
        let (mut host, graph) = started(
            r#"
[[nodes]]
id = "parent"

[[nodes]]
id = "child"
parent = "parent"

[[edges]]
id = "down"
node = "child"
direction = "from_parent"
exclude = ["debug"]
"#,
        );
        let parent = graph.node("parent").unwrap();
        let child = graph.node("child").unwrap();

        host.set_float(parent, "health", 0.5).unwrap();
        host.set_bool(parent, "debug", true).unwrap();

        let store = host.world().store(child).unwrap();
        assert_eq!(store.get_float("health"), Some(0.5));
        assert!(!store.contains("debug"));
    }

    #[test]
    fn test_missing_parent_is_not_fatal() {
        let (mut host, graph) = build(
            r#"
[[nodes]]
id = "root"

[[edges]]
id = "down"
node = "root"
direction = "from_parent"

[[edges]]
id = "up"
node = "root"
direction = "to_parent"
"#,
        );
        host.start();
        host.tick();

        assert_eq!(
            host.edge_state(graph.edge("down").unwrap()).unwrap(),
            EdgeState::Inactive
        );
        // Push side is bound but inert
        assert_eq!(
            host.edge_state(graph.edge("up").unwrap()).unwrap(),
            EdgeState::Bound
        );
        host.set_int(graph.node("root").unwrap(), "n", 1).unwrap();
    }

    #[test]
    fn test_deep_chain_through_storeless_group() {
        let (mut host, graph) = started(
            r#"
[[nodes]]
id = "root"

[[nodes]]
id = "group"
parent = "root"
has_store = false

[[nodes]]
id = "panel"
parent = "group"

[[nodes]]
id = "button"
parent = "panel"

[[edges]]
id = "panel_down"
node = "panel"
direction = "from_parent"

[[edges]]
id = "button_down"
node = "button"
direction = "from_parent"
"#,
        );
        let root = graph.node("root").unwrap();
        let button = graph.node("button").unwrap();

        host.set_int(root, "theme", 3).unwrap();

        assert_eq!(host.world().store(button).unwrap().get_int("theme"), Some(3));
        assert_eq!(host.propagation_stats().max_depth, 2);
    }

    #[test]
    fn test_type_mismatch_skips_only_that_update() {
        let (mut host, graph) = started(
            r#"
[[nodes]]
id = "parent"

[[nodes]]
id = "child"
parent = "parent"
params = [{ name = "mode", type = "int", value = 1 }]

[[edges]]
id = "down"
node = "child"
direction = "from_parent"
"#,
        );
        let parent = graph.node("parent").unwrap();
        let child = graph.node("child").unwrap();

        host.set_bool(parent, "mode", true).unwrap();
        host.set_float(parent, "speed", 4.0).unwrap();

        let store = host.world().store(child).unwrap();
        assert_eq!(store.get_int("mode"), Some(1));
        assert_eq!(store.get_float("speed"), Some(4.0));

        let report = host.edge_report(graph.edge("down").unwrap()).unwrap();
        assert_eq!(report.stats.type_mismatches, 1);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::ParameterStore;
    use observability::SyncStatsAggregator;
    use param_sync::{HostBuilder, Script};

    const HIERARCHY: &str = r#"
[runtime]
tick_interval_ms = 1
max_ticks = 6

[[nodes]]
id = "root"
auto_clear_triggers = true
params = [
    { name = "health", type = "float", value = 1.0 },
    { name = "hit", type = "trigger" },
]

[[nodes]]
id = "hud"
parent = "root"
ready = false
params = [{ name = "visible", type = "bool", value = true }]

[[nodes]]
id = "minimap"
parent = "hud"

[[edges]]
id = "hud_from_root"
node = "hud"
direction = "from_parent"
exclude = ["debug"]

[[edges]]
id = "minimap_from_hud"
node = "minimap"
direction = "from_parent"

[[edges]]
id = "minimap_to_hud"
node = "minimap"
direction = "to_parent"
include = ["zoom"]

[[script]]
tick = 2
action = { kind = "mark_ready", node = "hud" }

[[script]]
tick = 3
action = { kind = "set_float", node = "root", name = "health", value = 0.5 }

[[script]]
tick = 3
action = { kind = "set_bool", node = "root", name = "debug", value = true }

[[script]]
tick = 4
action = { kind = "set_int", node = "minimap", name = "zoom", value = 2 }

[[script]]
tick = 5
action = { kind = "fire_trigger", node = "root", name = "hit" }
"#;

    /// End-to-end test: blueprint -> HostBuilder -> tokio interval tick loop
    ///
    /// 验证完整的数据流：
    /// 1. 就绪前 hud 边等待，就绪后 bootstrap 一次
    /// 2. root 的写入逐层传到 minimap，debug 被过滤
    /// 3. minimap 的 zoom 向上同步到 hud
    /// 4. root 的 trigger 在帧末自动清除并向下传播
    #[tokio::test]
    async fn test_e2e_tick_loop() {
        let blueprint = ConfigLoader::load_from_str(HIERARCHY, ConfigFormat::Toml).unwrap();
        let script = Script::new(&blueprint.script);
        let (mut host, graph) = HostBuilder::from_blueprint(&blueprint).unwrap();
        host.start();

        let mut aggregator = SyncStatsAggregator::new();
        let mut interval = tokio::time::interval(Duration::from_millis(
            blueprint.runtime.tick_interval_ms,
        ));

        let mut hit_seen_on_minimap = false;
        for tick in 1..=blueprint.runtime.max_ticks {
            interval.tick().await;
            script.run_tick(tick, &mut host, &graph).unwrap();

            let minimap = graph.node("minimap").unwrap();
            if host.world().store(minimap).unwrap().get_bool("hit") == Some(true) {
                hit_seen_on_minimap = true;
            }

            let report = host.tick();
            assert_eq!(report.frame, tick);
            aggregator.update(&report);
        }
        aggregator.update_edges(&host.edge_reports());

        let hud = host.world().store(graph.node("hud").unwrap()).unwrap();
        let minimap = host.world().store(graph.node("minimap").unwrap()).unwrap();
        let root = host.world().store(graph.node("root").unwrap()).unwrap();

        assert_eq!(hud.get_float("health"), Some(0.5));
        assert_eq!(minimap.get_float("health"), Some(0.5));
        assert!(!hud.contains("debug"));
        assert_eq!(hud.get_int("zoom"), Some(2));
        assert_eq!(hud.get_bool("visible"), Some(true));
        assert_eq!(minimap.get_bool("visible"), Some(true));

        assert!(hit_seen_on_minimap);
        assert_eq!(root.get_bool("hit"), Some(false));
        assert_eq!(minimap.get_bool("hit"), Some(false));

        let summary = aggregator.summary();
        assert_eq!(summary.total_ticks, 6);
        assert!(summary.totals.applied > 0);
        assert_eq!(summary.edges["hud_from_root"].bootstraps, 1);
        assert_eq!(summary.edges["hud_from_root"].filtered, 1);
    }
}
