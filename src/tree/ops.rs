//! Virtual tree operations on the registry.
//!
//! Rows live in the registry like every other node; a tree or row keeps its
//! children in a [`ChildSlots`](super::ChildSlots) array. In virtual mode
//! the slots stay empty until a row is requested, at which point the row is
//! constructed and handed to the [`DataProvider`].
//!
//! Every structural mutation (insert, dispose, item count change, expand or
//! collapse) ends with exactly one flat-index pass over the visible rows.

use crate::engine::node::{Node, NodeData, TreeItemData};
use crate::engine::registry::Registry;
use crate::error::{Result, SyncError};
use crate::tree::provider::DataProvider;
use crate::tree::slots::ChildSlots;
use crate::types::{NodeFlags, NodeKind};

const TREE_ITEM_TYPE: &str = "rwt.widgets.TreeItem";

/// Where a new row goes: owning tree, depth, virtual flag, interactive growth.
struct Placement {
    tree: usize,
    depth: usize,
    virtual_mode: bool,
    interactive: bool,
}

impl Registry {
    // =========================================================================
    // Structure
    // =========================================================================

    /// Insert a row under a tree or row at `index` (append when `None`).
    pub fn insert_tree_item(
        &mut self,
        parent: usize,
        index: Option<usize>,
        id: Option<&str>,
    ) -> Result<usize> {
        let count = self.slots_of(parent)?.count();
        let index = index.unwrap_or(count);
        if index > count {
            return Err(SyncError::range(index, count));
        }

        let placement = self.placement(parent)?;
        let slot = self.allocate_row(parent, index, id, &placement)?;

        let growth = self.growth;
        let shifted = {
            let slots = self.slots_of_mut(parent)?;
            slots.insert(index, slot, growth, placement.interactive);
            (index + 1..slots.count())
                .filter_map(|sibling| slots.get(sibling).map(|child| (sibling, child)))
                .collect::<Vec<_>>()
        };
        for (position, child) in shifted {
            self.set_row_index(child, position);
            self.mark_dirty(child);
        }

        self.mark_dirty(parent);
        self.update_flat_indices(placement.tree);
        Ok(slot)
    }

    /// Row at `index` under `parent`, constructed and populated if needed.
    pub fn tree_item(
        &mut self,
        parent: usize,
        index: usize,
        provider: &mut dyn DataProvider,
    ) -> Result<usize> {
        let slot = self.construct_row(parent, index)?;
        self.materialize(slot, provider)?;
        Ok(slot)
    }

    /// Row at `index` without populating it.
    ///
    /// A new row takes over the display position of its empty slot, so only
    /// its own flat index is computed. Hidden rows get theirs when an
    /// ancestor expands.
    pub(crate) fn construct_row(&mut self, parent: usize, index: usize) -> Result<usize> {
        let (slot, built) = self.build_row(parent, index)?;
        if built && self.is_row_visible(slot) {
            let flat = self.slot_flat_index(parent, index);
            if let Some(NodeData::TreeItem(item)) = self.get_mut(slot).map(|node| &mut node.data) {
                item.flat_index = flat;
            }
        }
        Ok(slot)
    }

    /// Every row under `parent`, constructing and populating as needed.
    /// Runs at most one flat-index pass for the whole batch.
    pub fn tree_items(
        &mut self,
        parent: usize,
        provider: &mut dyn DataProvider,
    ) -> Result<Vec<usize>> {
        let count = self.slots_of(parent)?.count();
        let mut rows = Vec::with_capacity(count);
        let mut built_any = false;
        for index in 0..count {
            let (slot, built) = self.build_row(parent, index)?;
            built_any |= built;
            rows.push(slot);
        }
        if built_any {
            let tree = self.placement(parent)?.tree;
            self.update_flat_indices(tree);
        }
        for &slot in &rows {
            self.materialize(slot, provider)?;
        }
        Ok(rows)
    }

    /// Row at `index`, allocated if the slot is empty. The flag tells
    /// whether it was allocated now.
    fn build_row(&mut self, parent: usize, index: usize) -> Result<(usize, bool)> {
        let slots = self.slots_of(parent)?;
        let count = slots.count();
        if index >= count {
            return Err(SyncError::range(index, count));
        }
        if let Some(slot) = slots.get(index) {
            return Ok((slot, false));
        }

        let placement = self.placement(parent)?;
        let slot = self.allocate_row(parent, index, None, &placement)?;
        self.slots_of_mut(parent)?.set(index, slot);
        tracing::trace!("Constructed virtual row {} under slot {}", index, parent);
        Ok((slot, true))
    }

    /// Change the logical row count of a tree or row.
    ///
    /// Excess rows are disposed from the tail. Outside virtual mode the new
    /// rows are constructed right away; in virtual mode they stay empty.
    pub fn set_item_count(&mut self, parent: usize, count: usize) -> Result<()> {
        let old_count = self.slots_of(parent)?.count();
        if count == old_count {
            return Ok(());
        }
        let placement = self.placement(parent)?;

        for position in (count..old_count).rev() {
            if let Some(child) = self.slots_of(parent)?.get(position) {
                self.dispose_node(child);
            }
        }

        let growth = self.growth;
        self.slots_of_mut(parent)?.resize(count, growth);

        if !placement.virtual_mode {
            for position in old_count..count {
                let slot = self.allocate_row(parent, position, None, &placement)?;
                self.slots_of_mut(parent)?.set(position, slot);
            }
        }

        self.mark_dirty(parent);
        self.update_flat_indices(placement.tree);
        Ok(())
    }

    /// Dispose every row under `parent`.
    pub fn remove_all_items(&mut self, parent: usize) -> Result<()> {
        self.set_item_count(parent, 0)
    }

    /// Logical row count, without populating `parent`.
    pub fn item_count(&self, parent: usize) -> Result<usize> {
        Ok(self.slots_of(parent)?.count())
    }

    /// Constructed rows under `parent`, skipping empty virtual slots.
    pub fn created_items(&self, parent: usize) -> Result<Vec<usize>> {
        Ok(self.slots_of(parent)?.constructed())
    }

    /// Position of `child` under `parent`, or -1 when it lives elsewhere.
    pub fn tree_index_of(&self, parent: usize, child: usize) -> Result<i32> {
        self.slots_of(parent)?;
        let node = self
            .get(child)
            .ok_or_else(|| SyncError::InvalidArgument("row is disposed".to_string()))?;
        match (&node.data, node.parent) {
            (NodeData::TreeItem(item), Some(owner)) if owner == parent => Ok(item.index as i32),
            _ => Ok(-1),
        }
    }

    // =========================================================================
    // Row Data
    // =========================================================================

    /// Run the provider for an uncached row. A failing provider leaves the
    /// row uncached, so the next read asks again.
    pub fn materialize(&mut self, slot: usize, provider: &mut dyn DataProvider) -> Result<()> {
        let node = self
            .get_mut(slot)
            .ok_or_else(|| SyncError::InvalidArgument("row is disposed".to_string()))?;
        if node.kind() != NodeKind::TreeItem || node.is_cached() {
            return Ok(());
        }
        let index = node.tree_index().unwrap_or(0);

        if let Err(source) = provider.populate(node, index) {
            tracing::warn!("Data request for row {} ({}) failed: {}", index, node.id, source);
            node.flags.remove(NodeFlags::CACHED);
            return Err(SyncError::Populate { index, source });
        }
        node.flags.insert(NodeFlags::CACHED);
        tracing::trace!("Materialized row {} ({})", index, node.id);
        self.mark_dirty(slot);
        Ok(())
    }

    /// Forget the data of the row at `index`; the next read repopulates it.
    pub fn clear_item(&mut self, parent: usize, index: usize, recursive: bool) -> Result<()> {
        let slots = self.slots_of(parent)?;
        if index >= slots.count() {
            return Err(SyncError::range(index, slots.count()));
        }
        if let Some(child) = slots.get(index) {
            self.clear_row(child);
            if recursive {
                self.clear_all_items(child, true)?;
            }
        }
        Ok(())
    }

    /// Forget the data of every constructed row under `parent`.
    pub fn clear_all_items(&mut self, parent: usize, recursive: bool) -> Result<()> {
        for child in self.slots_of(parent)?.constructed() {
            self.clear_row(child);
            if recursive {
                self.clear_all_items(child, true)?;
            }
        }
        Ok(())
    }

    fn clear_row(&mut self, slot: usize) {
        if let Some(node) = self.get_mut(slot) {
            node.clear_data();
            self.mark_dirty(slot);
        }
    }

    // =========================================================================
    // Expansion & Flat Index
    // =========================================================================

    /// Expand or collapse a row. Expanding a row without children is a no-op.
    pub fn set_expanded(&mut self, slot: usize, expanded: bool) -> Result<()> {
        let (node, item) = self.row(slot)?;
        let tree = item.tree;
        let has_children = item.slots.count() > 0;
        if (expanded && !has_children) || node.is_expanded() == expanded {
            return Ok(());
        }

        if let Some(node) = self.get_mut(slot) {
            node.flags.set(NodeFlags::EXPANDED, expanded);
        }
        self.mark_dirty(slot);
        self.update_flat_indices(tree);
        Ok(())
    }

    /// Visible row position, or `None` while an ancestor is collapsed.
    pub fn flat_index(&self, slot: usize) -> Result<Option<usize>> {
        let (_, item) = self.row(slot)?;
        Ok(self.is_row_visible(slot).then_some(item.flat_index))
    }

    /// Number of flat-index passes run for `tree`.
    pub fn reindex_count(&self, tree: usize) -> u64 {
        match self.get(tree).map(|node| &node.data) {
            Some(NodeData::Tree(data)) => data.reindex_count,
            _ => 0,
        }
    }

    /// Renumber every visible row of `tree` in display order.
    ///
    /// Empty virtual slots occupy one row each. Collapsed subtrees are
    /// skipped, so their rows keep stale values until shown again.
    pub(crate) fn update_flat_indices(&mut self, tree: usize) {
        let roots = match self.get(tree).map(|node| &node.data) {
            Some(NodeData::Tree(data)) => data.slots.logical().to_vec(),
            _ => return,
        };
        let mut flat = 0;
        self.assign_flat_indices(&roots, &mut flat);
        if let Some(NodeData::Tree(data)) = self.get_mut(tree).map(|node| &mut node.data) {
            data.reindex_count += 1;
        }
    }

    fn assign_flat_indices(&mut self, entries: &[Option<usize>], flat: &mut usize) {
        for entry in entries {
            let Some(slot) = *entry else {
                *flat += 1;
                continue;
            };
            let Some(node) = self.get_mut(slot) else { continue };
            let expanded = node.is_expanded();
            let children = match &mut node.data {
                NodeData::TreeItem(item) => {
                    item.flat_index = *flat;
                    expanded.then(|| item.slots.logical().to_vec())
                }
                _ => None,
            };
            *flat += 1;
            if let Some(children) = children {
                self.assign_flat_indices(&children, flat);
            }
        }
    }

    /// A row is visible when every ancestor row is expanded.
    fn is_row_visible(&self, slot: usize) -> bool {
        let mut current = self.get(slot).and_then(|node| node.parent);
        while let Some(parent) = current {
            let Some(node) = self.get(parent) else { return false };
            match node.kind() {
                NodeKind::Tree => return true,
                NodeKind::TreeItem if node.is_expanded() => current = node.parent,
                _ => return false,
            }
        }
        false
    }

    /// Display position of logical slot `index` under a visible `parent`.
    ///
    /// Counts from the nearest constructed sibling before it, or from the
    /// parent when there is none; every empty slot in between is one row.
    fn slot_flat_index(&self, parent: usize, index: usize) -> usize {
        let (start, entries) = match self.get(parent).map(|node| &node.data) {
            Some(NodeData::Tree(tree)) => (0, tree.slots.logical()),
            Some(NodeData::TreeItem(item)) => (item.flat_index + 1, item.slots.logical()),
            _ => return 0,
        };
        for position in (0..index).rev() {
            let Some(sibling) = entries[position] else { continue };
            let Some(NodeData::TreeItem(item)) = self.get(sibling).map(|node| &node.data) else {
                continue;
            };
            return item.flat_index + self.visible_rows(Some(sibling)) + (index - position - 1);
        }
        start + index
    }

    /// Rows a slot occupies on screen: itself plus its expanded subtree.
    fn visible_rows(&self, entry: Option<usize>) -> usize {
        let Some(node) = entry.and_then(|slot| self.get(slot)) else {
            return 1;
        };
        let nested = match node.data.slots() {
            Some(slots) if node.is_expanded() => slots
                .logical()
                .iter()
                .map(|&child| self.visible_rows(child))
                .sum(),
            _ => 0,
        };
        1 + nested
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn row(&self, slot: usize) -> Result<(&Node, &TreeItemData)> {
        let node = self
            .get(slot)
            .ok_or_else(|| SyncError::InvalidArgument("row is disposed".to_string()))?;
        match &node.data {
            NodeData::TreeItem(item) => Ok((node, item)),
            _ => Err(SyncError::InvalidArgument(format!(
                "{} is a {}, not a tree item",
                node.id,
                node.kind()
            ))),
        }
    }

    fn slots_of(&self, parent: usize) -> Result<&ChildSlots> {
        let node = self
            .get(parent)
            .ok_or_else(|| SyncError::InvalidArgument("parent is disposed".to_string()))?;
        node.data.slots().ok_or_else(|| {
            SyncError::InvalidArgument(format!("{} is a {} and holds no rows", node.id, node.kind()))
        })
    }

    fn slots_of_mut(&mut self, parent: usize) -> Result<&mut ChildSlots> {
        self.get_mut(parent)
            .and_then(|node| node.data.slots_mut())
            .ok_or_else(|| SyncError::InvalidArgument("parent holds no rows".to_string()))
    }

    fn placement(&self, parent: usize) -> Result<Placement> {
        let node = self
            .get(parent)
            .ok_or_else(|| SyncError::InvalidArgument("parent is disposed".to_string()))?;
        let (tree, depth) = match &node.data {
            NodeData::Tree(_) => (parent, 0),
            NodeData::TreeItem(item) => (item.tree, item.depth + 1),
            _ => {
                return Err(SyncError::InvalidArgument(format!(
                    "{} is a {} and holds no rows",
                    node.id,
                    node.kind()
                )));
            }
        };
        let tree_node = self
            .get(tree)
            .ok_or_else(|| SyncError::InvalidArgument("tree is disposed".to_string()))?;
        Ok(Placement {
            tree,
            depth,
            virtual_mode: tree_node.flags.contains(NodeFlags::VIRTUAL),
            interactive: tree_node.is_initialized(),
        })
    }

    fn allocate_row(
        &mut self,
        parent: usize,
        index: usize,
        id: Option<&str>,
        placement: &Placement,
    ) -> Result<usize> {
        let flags = if placement.virtual_mode {
            NodeFlags::VIRTUAL
        } else {
            NodeFlags::NONE
        };
        let data = NodeData::TreeItem(TreeItemData {
            tree: placement.tree,
            index,
            depth: placement.depth,
            flat_index: 0,
            slots: ChildSlots::new(self.growth.floor),
        });
        self.allocate(id, TREE_ITEM_TYPE, data, flags, Some(parent))
    }

    fn set_row_index(&mut self, slot: usize, position: usize) {
        if let Some(NodeData::TreeItem(item)) = self.get_mut(slot).map(|node| &mut node.data) {
            item.index = position;
        }
    }
}
