//! Sync edge configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ParamName;

/// Direction of a sync edge relative to the node that carries it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    /// Pull: nearest ancestor store -> local store, with bootstrap
    FromParent,
    /// Push: local store -> direct parent store, incremental only
    ToParent,
}

impl SyncDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncDirection::FromParent => "from_parent",
            SyncDirection::ToParent => "to_parent",
        }
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Include / exclude lists for one edge.
///
/// Set `include` to sync ONLY those params; set `exclude` to sync ALL params
/// EXCEPT those. A non-empty `include` wins outright.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub include: Vec<ParamName>,
    #[serde(default)]
    pub exclude: Vec<ParamName>,
}

/// Edge configuration consumed by the engines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEdgeConfig {
    pub direction: SyncDirection,

    #[serde(default)]
    pub filter: FilterConfig,

    /// Log every synced / ignored param at debug level
    #[serde(default)]
    pub debug: bool,
}

impl SyncEdgeConfig {
    pub fn new(direction: SyncDirection) -> Self {
        Self {
            direction,
            filter: FilterConfig::default(),
            debug: false,
        }
    }

    pub fn with_include<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ParamName>,
    {
        self.filter.include = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ParamName>,
    {
        self.filter.exclude = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Engine state as seen by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeState {
    Inactive,
    /// Pull edge with a resolved parent, polling readiness each tick
    WaitingForReady,
    Bound,
}

impl fmt::Display for EdgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EdgeState::Inactive => "inactive",
            EdgeState::WaitingForReady => "waiting_for_ready",
            EdgeState::Bound => "bound",
        };
        f.write_str(s)
    }
}

/// Per-edge counters (for diagnostics)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeStats {
    /// Updates written to the target store
    pub applied: u64,

    /// Updates rejected by the include/exclude filter
    pub filtered: u64,

    /// Bootstrap entries skipped because the local node declares them
    pub owned_skipped: u64,

    /// Updates the engine does not forward in its direction
    pub not_forwarded: u64,

    /// Writes rejected by the target store (type mismatch / missing param)
    pub type_mismatches: u64,

    /// Re-deliveries suppressed by the reentrancy guard
    pub suppressed: u64,

    /// Completed bootstrap passes
    pub bootstraps: u64,

    /// Readiness polls that found a store not ready
    pub ready_polls: u64,
}

impl EdgeStats {
    pub fn merge(&mut self, other: &EdgeStats) {
        self.applied += other.applied;
        self.filtered += other.filtered;
        self.owned_skipped += other.owned_skipped;
        self.not_forwarded += other.not_forwarded;
        self.type_mismatches += other.type_mismatches;
        self.suppressed += other.suppressed;
        self.bootstraps += other.bootstraps;
        self.ready_polls += other.ready_polls;
    }
}

/// Snapshot of one edge for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeReport {
    pub name: String,
    pub node: String,
    pub direction: SyncDirection,
    pub state: EdgeState,
    pub stats: EdgeStats,
}

/// Host-wide dispatch counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationStats {
    /// Originating changes dispatched
    pub changes: u64,

    /// Updates handed to a subscribed engine
    pub deliveries: u64,

    pub suppressed: u64,

    /// Deepest chain seen from a single originating change
    pub max_depth: u64,
}

/// Result of one host tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub frame: u64,

    /// Edges in the `Bound` state after the tick
    pub bound_edges: usize,

    /// Triggers reset by auto-clearing stores
    pub triggers_cleared: usize,

    /// Chain depth of every change dispatched during the tick
    pub depths: Vec<u64>,
}
