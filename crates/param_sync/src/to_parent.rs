//! Push direction: local store -> direct parent store, incremental only.
//!
//! No readiness gating and no reconciliation: the edge binds on activation
//! and only reacts to future local changes. Trigger clears are not forwarded
//! upward; only the set edge of a trigger travels to the parent.

use contracts::{
    EdgeId, EdgeState, EdgeStats, NodeId, ParamUpdate, SubscriptionId, SyncDirection,
    SyncEdgeConfig,
};

use crate::engine::{EdgeCore, EdgeEngine, Propagation};
use crate::protocol;
use crate::World;

/// Forwards a node's own changes to its direct parent's store
#[derive(Debug)]
pub struct SyncToParent {
    core: EdgeCore,
    state: EdgeState,
    parent: Option<NodeId>,
    subscription: Option<SubscriptionId>,
}

impl SyncToParent {
    pub fn new(name: impl Into<String>, node: NodeId, config: &SyncEdgeConfig) -> Self {
        let mut config = config.clone();
        config.direction = SyncDirection::ToParent;
        Self {
            core: EdgeCore::new(name, node, &config),
            state: EdgeState::Inactive,
            parent: None,
            subscription: None,
        }
    }
}

impl EdgeEngine for SyncToParent {
    fn direction(&self) -> SyncDirection {
        SyncDirection::ToParent
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

        // Bound even without a target; the subscription is simply skipped.
        self.state = EdgeState::Bound;

        match world.direct_parent_store(self.core.node) {
            Some(parent) => {
                self.parent = Some(parent);
                self.subscription = Some(world.subscribe(self.core.node, id));
                tracing::debug!(
                    edge = %self.core.name,
                    parent = %world.label(parent),
                    "bound to parent store"
                );
            }
            None => {
                tracing::warn!(
                    edge = %self.core.name,
                    node = %world.label(self.core.node),
                    "no parent state to sync to; edge is inert"
                );
            }
        }

        Vec::new()
    }

    fn deactivate(&mut self, world: &mut World) {
        if let Some(subscription) = self.subscription.take() {
            world.unsubscribe(subscription);
        }
        self.parent = None;
        self.state = EdgeState::Inactive;
    }

    fn on_tick(&mut self, _id: EdgeId, _world: &mut World) -> Vec<Propagation> {
        Vec::new()
    }

    fn on_update(&mut self, world: &mut World, update: &ParamUpdate) -> Option<Propagation> {
        if self.state != EdgeState::Bound {
            return None;
        }
        let parent = self.parent?;

        if !self.core.passes_filter(update.name()) {
            return None;
        }

        if !protocol::forwards_upward(update) {
            self.core.stats.not_forwarded += 1;
            self.core.log_param(update.name(), "trigger clear stays local");
            return None;
        }

        self.core.apply(world, parent, update)
    }
}
