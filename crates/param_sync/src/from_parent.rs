//! Pull direction: nearest ancestor store -> local store.
//!
//! State machine `Inactive -> WaitingForReady -> Bound`. Binding subscribes
//! to the parent's change stream and runs one bootstrap reconciliation over
//! the parent's snapshot, skipping names the local node declares itself.
//! Incremental updates after that are applied without the ownership check.

use contracts::{
    EdgeId, EdgeState, EdgeStats, NodeId, ParamUpdate, ParameterStore, SubscriptionId,
    SyncDirection, SyncEdgeConfig,
};
use tracing::instrument;

use crate::engine::{EdgeCore, EdgeEngine, Propagation};
use crate::protocol;
use crate::World;

/// Keeps a node's store consistent with its nearest ancestor's store
#[derive(Debug)]
pub struct SyncFromParent {
    core: EdgeCore,
    state: EdgeState,
    parent: Option<NodeId>,
    subscription: Option<SubscriptionId>,
    /// Activation already polled readiness for the frame in progress
    polled_on_activate: bool,
}

impl SyncFromParent {
    pub fn new(name: impl Into<String>, node: NodeId, config: &SyncEdgeConfig) -> Self {
        let mut config = config.clone();
        config.direction = SyncDirection::FromParent;
        Self {
            core: EdgeCore::new(name, node, &config),
            state: EdgeState::Inactive,
            parent: None,
            subscription: None,
            polled_on_activate: false,
        }
    }

    fn both_ready(&self, world: &World, parent: NodeId) -> bool {
        let local = world.store(self.core.node).is_some_and(|s| s.is_ready());
        let remote = world.store(parent).is_some_and(|s| s.is_ready());
        local && remote
    }

    /// One readiness check; binds and bootstraps if both stores are ready.
    fn try_bind(&mut self, id: EdgeId, world: &mut World) -> Vec<Propagation> {
        let Some(parent) = self.parent else {
            return Vec::new();
        };

        if !self.both_ready(world, parent) {
            self.core.stats.ready_polls += 1;
            tracing::trace!(edge = %self.core.name, "stores not ready; deferring bootstrap");
            return Vec::new();
        }

        self.subscription = Some(world.subscribe(parent, id));
        self.state = EdgeState::Bound;
        self.bootstrap(world, parent)
    }

    /// Apply the parent's snapshot to the local store, once per bind.
    ///
    /// All writes land before any resulting event is returned, so no other
    /// engine observes a half-reconciled store.
    #[instrument(
        name = "sync_from_parent_bootstrap",
        level = "debug",
        skip(self, world),
        fields(edge = %self.core.name)
    )]
    fn bootstrap(&mut self, world: &mut World, parent: NodeId) -> Vec<Propagation> {
        let snapshot = match world.store(parent) {
            Some(store) => store.snapshot(),
            None => return Vec::new(),
        };
        let owned = world.declared_params(self.core.node);

        let mut emitted = Vec::new();
        for entry in &snapshot {
            if !self.core.passes_filter(&entry.name) {
                continue;
            }
            if owned.contains(entry.name.as_str()) {
                self.core.stats.owned_skipped += 1;
                metrics::counter!("param_sync_owned_skipped_total").increment(1);
                self.core.log_param(&entry.name, "keeping locally declared param");
                continue;
            }
            let update = protocol::snapshot_to_update(entry);
            if let Some(propagation) = self.core.apply(world, self.core.node, &update) {
                emitted.push(propagation);
            }
        }

        self.core.stats.bootstraps += 1;
        metrics::counter!("param_sync_bootstrap_total").increment(1);
        tracing::debug!(
            edge = %self.core.name,
            entries = snapshot.len(),
            changed = emitted.len(),
            "bootstrap reconciliation complete"
        );
        emitted
    }
}

impl EdgeEngine for SyncFromParent {
    fn direction(&self) -> SyncDirection {
        SyncDirection::FromParent
    }

    fn node(&self) -> NodeId {
        self.core.node
    }

    fn state(&self) -> EdgeState {
        self.state
    }

    fn counterpart(&self) -> Option<NodeId> {
        self.parent
    }

    fn stats(&self) -> &EdgeStats {
        &self.core.stats
    }

    fn stats_mut(&mut self) -> &mut EdgeStats {
        &mut self.core.stats
    }

    fn activate(&mut self, id: EdgeId, world: &mut World) -> Vec<Propagation> {
        if self.state != EdgeState::Inactive {
            return Vec::new();
        }

        if !world.has_store(self.core.node) {
            tracing::warn!(
                edge = %self.core.name,
                node = %world.label(self.core.node),
                "no local parameter store; edge stays inactive"
            );
            return Vec::new();
        }

        let Some(parent) = world.nearest_ancestor_store(self.core.node) else {
            tracing::warn!(
                edge = %self.core.name,
                node = %world.label(self.core.node),
                "no parent state to bind to"
            );
            return Vec::new();
        };

        self.parent = Some(parent);
        self.state = EdgeState::WaitingForReady;
        tracing::debug!(
            edge = %self.core.name,
            parent = %world.label(parent),
            "resolved parent store"
        );
        self.polled_on_activate = true;
        self.try_bind(id, world)
    }

    fn deactivate(&mut self, world: &mut World) {
        if let Some(subscription) = self.subscription.take() {
            world.unsubscribe(subscription);
        }
        self.parent = None;
        self.polled_on_activate = false;
        self.state = EdgeState::Inactive;
    }

    /// At most one readiness check per frame; the activation check counts
    /// for the frame it happened in.
    fn on_tick(&mut self, id: EdgeId, world: &mut World) -> Vec<Propagation> {
        let already_polled = std::mem::take(&mut self.polled_on_activate);
        if self.state == EdgeState::WaitingForReady && !already_polled {
            self.try_bind(id, world)
        } else {
            Vec::new()
        }
    }

    fn on_update(&mut self, world: &mut World, update: &ParamUpdate) -> Option<Propagation> {
        if self.state != EdgeState::Bound {
            return None;
        }
        if !self.core.passes_filter(update.name()) {
            return None;
        }
        let node = self.core.node;
        self.core.apply(world, node, update)
    }
}
