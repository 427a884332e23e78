//! Hierarchy arena: nodes, their stores, and change-stream subscriptions.
//!
//! Nodes refer to each other by `NodeId` (a slab key). A parent must exist
//! before its children are added, so the parent chain is always acyclic.

use std::collections::HashSet;

use contracts::{
    ContractError, EdgeId, NodeId, ParamName, ParamType, ParamValue, SubscriptionId,
};
use slab::Slab;

use crate::MemoryStore;

#[derive(Debug)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    store: Option<MemoryStore>,
    /// Owned-parameter manifest consulted during bootstrap
    declared: HashSet<ParamName>,
}

#[derive(Debug, Clone, Copy)]
struct Subscription {
    source: NodeId,
    edge: EdgeId,
}

/// Nodes, stores and subscriptions owned by the host
#[derive(Debug, Default)]
pub struct World {
    nodes: Slab<Node>,
    subscriptions: Slab<Subscription>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node under `parent` (None = root)
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ContractError> {
        if let Some(parent) = parent {
            if !self.nodes.contains(parent.0) {
                return Err(ContractError::unknown_node(parent));
            }
        }
        let key = self.nodes.insert(Node {
            name: name.into(),
            parent,
            store: None,
            declared: HashSet::new(),
        });
        Ok(NodeId(key))
    }

    /// Attach (or replace) the node's parameter store
    pub fn attach_store(&mut self, node: NodeId, store: MemoryStore) -> Result<(), ContractError> {
        self.node_mut(node)?.store = Some(store);
        Ok(())
    }

    /// Declare a locally owned parameter and seed it into the node's store
    pub fn declare_param(
        &mut self,
        node: NodeId,
        name: impl Into<ParamName>,
        param_type: ParamType,
        value: ParamValue,
    ) -> Result<(), ContractError> {
        let name = name.into();
        let Node {
            name: node_name,
            store,
            declared,
            ..
        } = self.node_mut(node)?;
        let store = store
            .as_mut()
            .ok_or_else(|| ContractError::no_store(node_name.clone()))?;
        store.declare(name.clone(), param_type, value)?;
        declared.insert(name);
        Ok(())
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(node.0)
    }

    pub fn node_name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).map(|n| n.name.as_str())
    }

    /// Name for log fields; falls back to the handle
    pub fn label(&self, node: NodeId) -> String {
        self.node_name(node)
            .map(str::to_string)
            .unwrap_or_else(|| node.to_string())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.parent == Some(node))
            .map(|(key, _)| NodeId(key))
            .collect()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|(key, _)| NodeId(key)).collect()
    }

    /// Number of ancestors above `node`
    pub fn depth(&self, node: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(node);
        while let Some(id) = current {
            depth += 1;
            current = self.parent(id);
        }
        depth
    }

    pub fn has_store(&self, node: NodeId) -> bool {
        self.store(node).is_some()
    }

    pub fn store(&self, node: NodeId) -> Option<&MemoryStore> {
        self.nodes.get(node.0).and_then(|n| n.store.as_ref())
    }

    pub fn store_mut(&mut self, node: NodeId) -> Option<&mut MemoryStore> {
        self.nodes.get_mut(node.0).and_then(|n| n.store.as_mut())
    }

    /// Store of `node`, or `NoStore` / `UnknownNode`
    pub fn require_store_mut(&mut self, node: NodeId) -> Result<&mut MemoryStore, ContractError> {
        let entry = self.node_mut(node)?;
        let name = entry.name.clone();
        entry.store.as_mut().ok_or_else(|| ContractError::no_store(name))
    }

    /// First node above `node` (starting at its parent) that carries a store
    pub fn nearest_ancestor_store(&self, node: NodeId) -> Option<NodeId> {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if self.has_store(id) {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    /// The direct parent, only if it carries a store
    pub fn direct_parent_store(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).filter(|&parent| self.has_store(parent))
    }

    /// Parameters the node declares itself; empty for unknown nodes
    pub fn declared_params(&self, node: NodeId) -> HashSet<ParamName> {
        self.nodes
            .get(node.0)
            .map(|n| n.declared.clone())
            .unwrap_or_default()
    }

    /// Register `edge` on the change stream of `source`'s store
    pub fn subscribe(&mut self, source: NodeId, edge: EdgeId) -> SubscriptionId {
        SubscriptionId(self.subscriptions.insert(Subscription { source, edge }))
    }

    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        self.subscriptions.try_remove(subscription.0).is_some()
    }

    /// Edges subscribed to `source`, in subscription-slot order
    pub fn subscribers(&self, source: NodeId) -> Vec<EdgeId> {
        self.subscriptions
            .iter()
            .filter(|(_, s)| s.source == source)
            .map(|(_, s)| s.edge)
            .collect()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut Node, ContractError> {
        self.nodes
            .get_mut(node.0)
            .ok_or_else(|| ContractError::unknown_node(node))
    }
}
