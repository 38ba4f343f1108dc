//! Node Registry - slot allocation and lifecycle for one session.
//!
//! Manages:
//! - ID ↔ slot mapping
//! - Free slot pool for O(1) reuse
//! - Dirty set ordered by creation serial (parents before children)
//! - Pending destroy operations, pruned when an ancestor is destroyed
//! - Dispose callbacks per node

use std::collections::{BTreeMap, HashMap};

use crate::config::Growth;
use crate::engine::id_gen::IdSource;
use crate::engine::node::{Node, NodeData};
use crate::error::{Result, SyncError};
use crate::types::{NodeFlags, NodeId};

/// A DESTROY waiting for the next render cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDestroy {
    pub id: NodeId,
    /// Ids of the node's ancestors at dispose time, nearest first.
    pub ancestors: Vec<NodeId>,
}

pub struct Registry {
    nodes: Vec<Option<Node>>,
    id_to_index: HashMap<NodeId, usize>,
    free_indices: Vec<usize>,
    next_serial: u64,
    ids: IdSource,
    pub(crate) growth: Growth,
    /// serial → slot
    dirty: BTreeMap<u64, usize>,
    destroyed: Vec<PendingDestroy>,
    destroy_callbacks: HashMap<usize, Vec<Box<dyn FnOnce()>>>,
}

impl Registry {
    pub fn new(ids: IdSource, growth: Growth) -> Self {
        Self {
            nodes: Vec::new(),
            id_to_index: HashMap::new(),
            free_indices: Vec::new(),
            next_serial: 0,
            ids,
            growth,
            dirty: BTreeMap::new(),
            destroyed: Vec::new(),
            destroy_callbacks: HashMap::new(),
        }
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Allocate a slot for a new node and mark it dirty.
    ///
    /// An explicit `id` must not be in use. Generated ids skip any value
    /// already taken by an explicit one.
    pub fn allocate(
        &mut self,
        id: Option<&str>,
        type_name: &str,
        data: NodeData,
        flags: NodeFlags,
        parent: Option<usize>,
    ) -> Result<usize> {
        let node_id = match id {
            Some(id) => {
                if self.id_to_index.contains_key(id) {
                    return Err(SyncError::InvalidArgument(format!("duplicate node id {}", id)));
                }
                NodeId::from(id)
            }
            None => loop {
                let candidate = self.ids.next_id();
                if !self.id_to_index.contains_key(&candidate) {
                    break candidate;
                }
            },
        };

        let serial = self.next_serial;
        self.next_serial += 1;

        let mut node = Node::new(node_id.clone(), type_name, serial, data);
        node.flags = flags;
        node.parent = parent;

        let index = match self.free_indices.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                index
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };

        self.id_to_index.insert(node_id, index);
        self.dirty.insert(serial, index);
        Ok(index)
    }

    /// Dispose a node and its subtree.
    ///
    /// Queues a single DESTROY for `index` if the client knows it, dropping
    /// any queued DESTROY of its descendants. A tree row disposal renumbers
    /// the remaining rows once.
    pub fn dispose(&mut self, index: usize) {
        if let Some(tree) = self.dispose_node(index) {
            if self.get(tree).is_some() {
                self.update_flat_indices(tree);
            }
        }
    }

    /// Dispose without recomputing flat indices. Returns the owning tree of a
    /// disposed tree row.
    pub(crate) fn dispose_node(&mut self, index: usize) -> Option<usize> {
        let node = self.get(index)?;
        let id = node.id.clone();
        let initialized = node.is_initialized();
        let tree = match &node.data {
            NodeData::TreeItem(item) => Some(item.tree),
            _ => None,
        };
        let ancestors = self.ancestor_ids(index);

        self.release(index);

        if initialized {
            self.destroyed.retain(|pending| !pending.ancestors.contains(&id));
            self.destroyed.push(PendingDestroy { id, ancestors });
        }
        tree
    }

    /// Release a slot and, first, every child below it.
    fn release(&mut self, index: usize) {
        let Some(node) = self.get(index) else { return };
        let children = self.children_of(node);

        // Highest position first keeps each detach at the tail.
        for child in children.into_iter().rev() {
            self.release(child);
        }

        self.run_destroy_callbacks(index);
        self.detach(index);

        if let Some(mut node) = self.nodes[index].take() {
            node.flags.insert(NodeFlags::DISPOSED);
            node.store.clear();
            self.id_to_index.remove(&node.id);
            self.dirty.remove(&node.serial);
            self.free_indices.push(index);
            tracing::trace!("Released node {}", node.id);
        }
    }

    /// Unlink `index` from its parent's child list, renumbering later siblings.
    fn detach(&mut self, index: usize) {
        let Some(node) = self.get(index) else { return };
        let Some(parent) = node.parent else { return };
        let position = node.tree_index();
        let growth = self.growth;

        let Some(parent_node) = self.get_mut(parent) else { return };
        let shifted: Vec<(usize, usize)> = match (parent_node.data.slots_mut(), position) {
            (Some(slots), Some(position)) => {
                slots.remove(position, growth);
                (position..slots.count())
                    .filter_map(|sibling| slots.get(sibling).map(|slot| (sibling, slot)))
                    .collect()
            }
            _ => {
                parent_node.children.retain(|&child| child != index);
                self.renumber_children(parent);
                return;
            }
        };

        self.mark_dirty(parent);
        for (position, slot) in shifted {
            if let Some(NodeData::TreeItem(item)) = self.get_mut(slot).map(|node| &mut node.data) {
                item.index = position;
            }
            self.mark_dirty(slot);
        }
    }

    /// Resync the positions of plain children that carry one, marking the
    /// ones that moved dirty.
    pub(crate) fn renumber_children(&mut self, parent: usize) {
        let Some(children) = self.get(parent).map(|node| node.children.clone()) else {
            return;
        };
        for (position, child) in children.into_iter().enumerate() {
            let moved = match self.get_mut(child) {
                Some(node) if node.position.is_some_and(|current| current != position) => {
                    node.position = Some(position);
                    true
                }
                _ => false,
            };
            if moved {
                self.mark_dirty(child);
            }
        }
    }

    // =========================================================================
    // Dispose Callbacks
    // =========================================================================

    /// Register a callback to run when the node at `index` is released.
    pub fn on_destroy(&mut self, index: usize, callback: impl FnOnce() + 'static) {
        self.destroy_callbacks
            .entry(index)
            .or_default()
            .push(Box::new(callback));
    }

    fn run_destroy_callbacks(&mut self, index: usize) {
        if let Some(callbacks) = self.destroy_callbacks.remove(&index) {
            for callback in callbacks {
                callback();
            }
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index).and_then(Option::as_mut)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.id_to_index.get(id).copied()
    }

    /// Slot of a live node, or [`SyncError::Disposed`].
    pub fn resolve(&self, id: &NodeId) -> Result<usize> {
        self.index_of(id.as_str())
            .ok_or_else(|| SyncError::Disposed(id.clone()))
    }

    pub fn node_id(&self, index: usize) -> Option<&NodeId> {
        self.get(index).map(|node| &node.id)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.id_to_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_index.is_empty()
    }

    /// Constructed children in order: plain children, then tree rows.
    pub fn children_of(&self, node: &Node) -> Vec<usize> {
        let mut children = node.children.clone();
        if let Some(slots) = node.data.slots() {
            children.extend(slots.constructed());
        }
        children
    }

    /// Ids of every ancestor, nearest first.
    pub fn ancestor_ids(&self, index: usize) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut current = self.get(index).and_then(|node| node.parent);
        while let Some(parent) = current {
            let Some(node) = self.get(parent) else { break };
            ancestors.push(node.id.clone());
            current = node.parent;
        }
        ancestors
    }

    // =========================================================================
    // Dirty Tracking
    // =========================================================================

    pub fn mark_dirty(&mut self, index: usize) {
        if let Some(serial) = self.get(index).map(|node| node.serial) {
            self.dirty.insert(serial, index);
        }
    }

    pub fn is_dirty(&self, index: usize) -> bool {
        self.get(index)
            .is_some_and(|node| self.dirty.contains_key(&node.serial))
    }

    /// Dirty slots in creation order.
    pub fn dirty_indices(&self) -> Vec<usize> {
        self.dirty.values().copied().collect()
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    pub fn pending_destroys(&self) -> &[PendingDestroy] {
        &self.destroyed
    }

    pub(crate) fn clear_destroys(&mut self) {
        self.destroyed.clear();
    }
}
