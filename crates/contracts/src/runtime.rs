//! RuntimeGraph - HostBuilder output
//!
//! Arena handles and the mapping from configured ids to them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Handle of a node in the host's hierarchy arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Handle of a sync edge registered with the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub usize);

/// Handle of one change-stream subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge#{}", self.0)
    }
}

/// Runtime handle graph
///
/// Contains every node and edge created from a blueprint.
#[derive(Debug, Clone)]
pub struct RuntimeGraph {
    /// Node ID -> handle
    pub nodes: HashMap<String, NodeId>,

    /// Edge ID -> handle
    pub edges: HashMap<String, EdgeId>,

    /// Edge ID -> owning node ID
    pub edge_to_node: HashMap<String, String>,
}

impl RuntimeGraph {
    /// Create empty RuntimeGraph
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            edge_to_node: HashMap::new(),
        }
    }

    /// Register node
    pub fn register_node(&mut self, id: String, handle: NodeId) {
        self.nodes.insert(id, handle);
    }

    /// Register edge
    pub fn register_edge(&mut self, edge_id: String, node_id: String, handle: EdgeId) {
        self.edge_to_node.insert(edge_id.clone(), node_id);
        self.edges.insert(edge_id, handle);
    }

    pub fn node(&self, id: &str) -> Option<NodeId> {
        self.nodes.get(id).copied()
    }

    pub fn edge(&self, id: &str) -> Option<EdgeId> {
        self.edges.get(id).copied()
    }
}

impl Default for RuntimeGraph {
    fn default() -> Self {
        Self::new()
    }
}
