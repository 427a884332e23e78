//! Engine seam between the host and the two sync directions.

use std::fmt;

use contracts::{EdgeId, EdgeState, EdgeStats, NodeId, ParamUpdate, SyncDirection, SyncEdgeConfig};

use crate::protocol;
use crate::{FilterSpec, World};

/// A change event emitted by `source`'s store that the host must deliver
/// to the subscribers of that store.
#[derive(Debug, Clone, PartialEq)]
pub struct Propagation {
    pub source: NodeId,
    pub update: ParamUpdate,
}

/// One directional sync relationship, driven by the host.
///
/// Engines never deliver events themselves: every method that writes to a
/// store returns the resulting [`Propagation`]s and the host dispatches them.
pub trait EdgeEngine: fmt::Debug {
    fn direction(&self) -> SyncDirection;

    /// Node that carries this edge
    fn node(&self) -> NodeId;

    fn state(&self) -> EdgeState;

    /// Counterpart store resolved for the current bind cycle
    fn counterpart(&self) -> Option<NodeId>;

    fn stats(&self) -> &EdgeStats;

    fn stats_mut(&mut self) -> &mut EdgeStats;

    /// Resolve the counterpart and subscribe. May complete a bootstrap.
    fn activate(&mut self, id: EdgeId, world: &mut World) -> Vec<Propagation>;

    /// Unsubscribe and drop the counterpart reference
    fn deactivate(&mut self, world: &mut World);

    /// Called exactly once per scheduler tick
    fn on_tick(&mut self, id: EdgeId, world: &mut World) -> Vec<Propagation>;

    /// Deliver one update from the subscribed store
    fn on_update(&mut self, world: &mut World, update: &ParamUpdate) -> Option<Propagation>;
}

/// Configuration and bookkeeping shared by both engines
#[derive(Debug)]
pub(crate) struct EdgeCore {
    pub name: String,
    pub node: NodeId,
    pub direction: SyncDirection,
    pub filter: FilterSpec,
    pub debug: bool,
    pub stats: EdgeStats,
}

impl EdgeCore {
    pub fn new(name: impl Into<String>, node: NodeId, config: &SyncEdgeConfig) -> Self {
        Self {
            name: name.into(),
            node,
            direction: config.direction,
            filter: FilterSpec::from(&config.filter),
            debug: config.debug,
            stats: EdgeStats::default(),
        }
    }

    /// Filter check that records rejected names
    pub fn passes_filter(&mut self, name: &str) -> bool {
        if self.filter.should_sync(name) {
            return true;
        }
        self.stats.filtered += 1;
        metrics::counter!(
            "param_sync_updates_filtered_total",
            "direction" => self.direction.as_str()
        )
        .increment(1);
        self.log_param(name, "ignoring param");
        false
    }

    /// Write `update` into `target`'s store.
    ///
    /// A store rejection skips only this update.
    pub fn apply(
        &mut self,
        world: &mut World,
        target: NodeId,
        update: &ParamUpdate,
    ) -> Option<Propagation> {
        let Some(store) = world.store_mut(target) else {
            tracing::warn!(edge = %self.name, target = %target, "target store disappeared");
            return None;
        };

        match protocol::apply_update(store, update) {
            Ok(emitted) => {
                self.stats.applied += 1;
                metrics::counter!(
                    "param_sync_updates_applied_total",
                    "direction" => self.direction.as_str()
                )
                .increment(1);
                if self.debug {
                    tracing::debug!(
                        edge = %self.name,
                        direction = %self.direction,
                        %update,
                        changed = emitted.is_some(),
                        "sync param"
                    );
                } else {
                    tracing::trace!(edge = %self.name, %update, changed = emitted.is_some(), "sync param");
                }
                emitted.map(|update| Propagation {
                    source: target,
                    update,
                })
            }
            Err(err) => {
                self.stats.type_mismatches += 1;
                metrics::counter!(
                    "param_sync_type_mismatch_total",
                    "direction" => self.direction.as_str()
                )
                .increment(1);
                tracing::warn!(
                    edge = %self.name,
                    param = %update.name(),
                    error = %err,
                    "target store rejected update; skipping"
                );
                None
            }
        }
    }

    pub fn log_param(&self, name: &str, message: &'static str) {
        if self.debug {
            tracing::debug!(edge = %self.name, param = name, "{}", message);
        } else {
            tracing::trace!(edge = %self.name, param = name, "{}", message);
        }
    }
}
