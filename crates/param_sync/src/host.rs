//! Sync host: owns the world and every edge, drives lifecycle and ticks,
//! and delivers change events depth-first with a reentrancy guard.
//!
//! Every write that reaches a store (host-side write, bootstrap, apply) yields
//! an optional change event. The host routes each event to the engines
//! subscribed to the emitting store; whatever those engines write is routed
//! again, until the chain runs out. One originating change carries an
//! in-flight set of `(edge, param)` pairs: an edge asked to handle the same
//! parameter twice within one chain is a sync cycle, and the repeat is
//! dropped.

use std::collections::HashSet;

use contracts::{
    ContractError, EdgeId, EdgeReport, EdgeState, NodeId, NotifyPolicy, ParamName, ParamSnapshotEntry, ParamUpdate,
    ParameterStore, PropagationStats, RequirePolicy, SyncDirection, SyncEdgeConfig, TickReport, WriteOptions,
};
use slab::Slab;
use tracing::instrument;

use crate::engine::{EdgeEngine, Propagation};
use crate::lifecycle::{LifecycleAction, LifecycleBinder};
use crate::{SyncFromParent, SyncToParent, World};

type Guard = HashSet<(EdgeId, ParamName)>;

/// Originating fires always broadcast: a trigger fired while still set is a
/// new event, even though the stored value does not change.
const FIRE: WriteOptions = WriteOptions::new(NotifyPolicy::AlwaysNotify, RequirePolicy::CreateIfAbsent);

#[derive(Debug)]
struct EdgeSlot {
    name: String,
    lifecycle: LifecycleBinder,
    engine: Box<dyn EdgeEngine>,
}

#[derive(Debug, Default)]
pub struct SyncHost {
    world: World,
    edges: Slab<EdgeSlot>,
    frame: u64,
    stats: PropagationStats,
    pending_depths: Vec<u64>,
}

impl SyncHost {
    pub fn new(world: World) -> Self {
        Self {
            world,
            ..Self::default()
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct world access; writes made here are not propagated
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Ticks completed so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn propagation_stats(&self) -> &PropagationStats {
        &self.stats
    }

    /// Add an enabled edge of the configured direction to `node`
    pub fn add_edge(
        &mut self,
        name: impl Into<String>,
        node: NodeId,
        config: &SyncEdgeConfig,
    ) -> Result<EdgeId, ContractError> {
        self.add_edge_with_state(name, node, config, true)
    }

    pub fn add_edge_with_state(
        &mut self,
        name: impl Into<String>,
        node: NodeId,
        config: &SyncEdgeConfig,
        enabled: bool,
    ) -> Result<EdgeId, ContractError> {
        let name = name.into();
        let engine: Box<dyn EdgeEngine> = match config.direction {
            SyncDirection::FromParent => Box::new(SyncFromParent::new(name.clone(), node, config)),
            SyncDirection::ToParent => Box::new(SyncToParent::new(name.clone(), node, config)),
        };
        self.add_engine(name, engine, enabled)
    }

    /// Register a custom engine. The engine's node must exist.
    pub fn add_engine(
        &mut self,
        name: impl Into<String>,
        engine: Box<dyn EdgeEngine>,
        enabled: bool,
    ) -> Result<EdgeId, ContractError> {
        if !self.world.contains(engine.node()) {
            return Err(ContractError::unknown_node(engine.node()));
        }
        let key = self.edges.insert(EdgeSlot {
            name: name.into(),
            lifecycle: LifecycleBinder::new(enabled),
            engine,
        });
        Ok(EdgeId(key))
    }

    /// Start every edge that has not started yet, in insertion order
    pub fn start(&mut self) {
        let ids: Vec<EdgeId> = self.edges.iter().map(|(key, _)| EdgeId(key)).collect();
        for id in ids {
            let action = self.edges.get_mut(id.0).and_then(|slot| slot.lifecycle.start());
            self.run_lifecycle(id, action);
        }
    }

    pub fn start_edge(&mut self, edge: EdgeId) -> Result<(), ContractError> {
        let action = self.slot_mut(edge)?.lifecycle.start();
        self.run_lifecycle(edge, action);
        Ok(())
    }

    pub fn enable_edge(&mut self, edge: EdgeId) -> Result<(), ContractError> {
        let action = self.slot_mut(edge)?.lifecycle.enable();
        self.run_lifecycle(edge, action);
        Ok(())
    }

    pub fn disable_edge(&mut self, edge: EdgeId) -> Result<(), ContractError> {
        let action = self.slot_mut(edge)?.lifecycle.disable();
        self.run_lifecycle(edge, action);
        Ok(())
    }

    /// One scheduler step: poll live edges once, then auto-clear triggers.
    #[instrument(skip(self), fields(frame = self.frame + 1))]
    pub fn tick(&mut self) -> TickReport {
        self.frame += 1;

        let ids: Vec<EdgeId> = self.edges.iter().map(|(key, _)| EdgeId(key)).collect();
        for id in ids {
            let Some(slot) = self.edges.get_mut(id.0) else {
                continue;
            };
            if !slot.lifecycle.is_live() {
                continue;
            }
            let emitted = slot.engine.on_tick(id, &mut self.world);
            self.dispatch_all(emitted);
        }

        let triggers_cleared = self.auto_clear_triggers();

        let bound_edges = self
            .edges
            .iter()
            .filter(|(_, slot)| slot.engine.state() == EdgeState::Bound)
            .count();

        tracing::trace!(bound_edges, triggers_cleared, "tick complete");

        TickReport {
            frame: self.frame,
            bound_edges,
            triggers_cleared,
            depths: std::mem::take(&mut self.pending_depths),
        }
    }

    pub fn set_float(&mut self, node: NodeId, name: &str, value: f64) -> Result<(), ContractError> {
        let emitted = self
            .world
            .require_store_mut(node)?
            .set_float(name, value, WriteOptions::SYNC)?;
        self.originate(node, emitted);
        Ok(())
    }

    pub fn set_int(&mut self, node: NodeId, name: &str, value: i64) -> Result<(), ContractError> {
        let emitted = self
            .world
            .require_store_mut(node)?
            .set_int(name, value, WriteOptions::SYNC)?;
        self.originate(node, emitted);
        Ok(())
    }

    pub fn set_bool(&mut self, node: NodeId, name: &str, value: bool) -> Result<(), ContractError> {
        let emitted = self
            .world
            .require_store_mut(node)?
            .set_bool(name, value, WriteOptions::SYNC)?;
        self.originate(node, emitted);
        Ok(())
    }

    pub fn fire_trigger(&mut self, node: NodeId, name: &str) -> Result<(), ContractError> {
        let emitted = self
            .world
            .require_store_mut(node)?
            .fire_trigger(name, FIRE)?;
        self.originate(node, emitted);
        Ok(())
    }

    pub fn clear_trigger(&mut self, node: NodeId, name: &str) -> Result<(), ContractError> {
        let emitted = self
            .world
            .require_store_mut(node)?
            .clear_trigger(name, WriteOptions::SYNC)?;
        self.originate(node, emitted);
        Ok(())
    }

    /// Flip a store's readiness; pull edges notice on their next tick
    pub fn mark_ready(&mut self, node: NodeId, ready: bool) -> Result<(), ContractError> {
        self.world.require_store_mut(node)?.set_ready(ready);
        tracing::debug!(node = %self.world.label(node), ready, "store readiness changed");
        Ok(())
    }

    pub fn snapshot(&self, node: NodeId) -> Result<Vec<ParamSnapshotEntry>, ContractError> {
        if !self.world.contains(node) {
            return Err(ContractError::unknown_node(node));
        }
        self.world
            .store(node)
            .map(|store| store.snapshot())
            .ok_or_else(|| ContractError::no_store(self.world.label(node)))
    }

    pub fn edge_state(&self, edge: EdgeId) -> Result<EdgeState, ContractError> {
        Ok(self.slot(edge)?.engine.state())
    }

    pub fn edge_report(&self, edge: EdgeId) -> Result<EdgeReport, ContractError> {
        let slot = self.slot(edge)?;
        Ok(EdgeReport {
            name: slot.name.clone(),
            node: self.world.label(slot.engine.node()),
            direction: slot.engine.direction(),
            state: slot.engine.state(),
            stats: slot.engine.stats().clone(),
        })
    }

    /// Reports for every edge, in insertion order
    pub fn edge_reports(&self) -> Vec<EdgeReport> {
        self.edges
            .iter()
            .filter_map(|(key, _)| self.edge_report(EdgeId(key)).ok())
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn slot(&self, edge: EdgeId) -> Result<&EdgeSlot, ContractError> {
        self.edges
            .get(edge.0)
            .ok_or_else(|| ContractError::unknown_edge(edge))
    }

    fn slot_mut(&mut self, edge: EdgeId) -> Result<&mut EdgeSlot, ContractError> {
        self.edges
            .get_mut(edge.0)
            .ok_or_else(|| ContractError::unknown_edge(edge))
    }

    fn run_lifecycle(&mut self, id: EdgeId, action: Option<LifecycleAction>) {
        let Some(action) = action else {
            return;
        };
        let Some(slot) = self.edges.get_mut(id.0) else {
            return;
        };
        match action {
            LifecycleAction::Activate => {
                tracing::debug!(edge = %slot.name, direction = %slot.engine.direction(), "activating edge");
                let emitted = slot.engine.activate(id, &mut self.world);
                self.dispatch_all(emitted);
            }
            LifecycleAction::Deactivate => {
                tracing::debug!(edge = %slot.name, "deactivating edge");
                slot.engine.deactivate(&mut self.world);
            }
        }
    }

    /// Reset set triggers on stores that clear them once per tick
    fn auto_clear_triggers(&mut self) -> usize {
        let mut cleared = 0;
        for node in self.world.node_ids() {
            let names = match self.world.store(node) {
                Some(store) if store.auto_clear_triggers() => store.set_triggers(),
                _ => continue,
            };
            for name in names {
                let Some(store) = self.world.store_mut(node) else {
                    break;
                };
                match store.clear_trigger(&name, WriteOptions::SYNC) {
                    Ok(emitted) => {
                        cleared += 1;
                        self.originate(node, emitted);
                    }
                    Err(err) => {
                        tracing::warn!(param = %name, error = %err, "failed to auto-clear trigger");
                    }
                }
            }
        }
        cleared
    }

    fn originate(&mut self, source: NodeId, emitted: Option<ParamUpdate>) {
        if let Some(update) = emitted {
            self.dispatch(Propagation { source, update });
        }
    }

    /// Dispatch a batch; each event is its own originating change
    fn dispatch_all(&mut self, batch: Vec<Propagation>) {
        for propagation in batch {
            self.dispatch(propagation);
        }
    }

    fn dispatch(&mut self, origin: Propagation) {
        let mut guard = Guard::new();
        let depth = self.propagate(origin, &mut guard, 0);

        self.stats.changes += 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);
        self.pending_depths.push(depth);
        metrics::histogram!("param_sync_propagation_depth").record(depth as f64);
    }

    /// Deliver `propagation` to every subscriber of its source, depth-first.
    ///
    /// Returns the deepest level reached below `depth`.
    fn propagate(&mut self, propagation: Propagation, guard: &mut Guard, depth: u64) -> u64 {
        let mut deepest = depth;
        for edge in self.world.subscribers(propagation.source) {
            if let Some(next) = self.deliver(edge, &propagation.update, guard) {
                deepest = deepest.max(self.propagate(next, guard, depth + 1));
            }
        }
        deepest
    }

    fn deliver(
        &mut self,
        edge: EdgeId,
        update: &ParamUpdate,
        guard: &mut Guard,
    ) -> Option<Propagation> {
        let slot = self.edges.get_mut(edge.0)?;

        if !guard.insert((edge, update.name().clone())) {
            slot.engine.stats_mut().suppressed += 1;
            self.stats.suppressed += 1;
            metrics::counter!("param_sync_cycle_suppressed_total").increment(1);
            tracing::warn!(
                edge = %slot.name,
                param = %update.name(),
                "sync cycle detected; suppressing re-delivery"
            );
            return None;
        }

        self.stats.deliveries += 1;
        slot.engine.on_update(&mut self.world, update)
    }
}
