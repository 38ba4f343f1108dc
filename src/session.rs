//! Session - the user-level API of one UI session.
//!
//! A session owns an independent node registry, its change stores, the
//! data-request callback and the queue of pending method calls. Every
//! mutation that affects what the client sees marks the node dirty; the
//! next render cycle turns the dirty set into wire operations.
//!
//! Nodes are addressed by [`NodeId`]. Passing the id of a disposed node
//! fails with [`SyncError::Disposed`].

use crate::config::SessionConfig;
use crate::engine::id_gen::{IdGenerator, IdSource};
use crate::engine::{Node, NodeData, Registry, TreeData, VARIANT_PROPERTY};
use crate::error::{Result, SyncError};
use crate::model::{ItemCollection, Removal, Selection};
use crate::pipeline::{ChangeSink, Message, RenderCycle};
use crate::tree::{ChildSlots, DataProvider, NoData};
use crate::types::{NodeFlags, NodeId, NodeKind, PropValue, PropertyMap};

const LIST_TYPE: &str = "rwt.widgets.List";
const TREE_TYPE: &str = "rwt.widgets.Tree";

/// A method call waiting for the next committed cycle.
#[derive(Debug, Clone)]
pub(crate) struct PendingCall {
    pub(crate) target: NodeId,
    pub(crate) method: String,
    pub(crate) properties: PropertyMap,
}

pub struct Session {
    pub(crate) registry: Registry,
    pub(crate) config: SessionConfig,
    pub(crate) provider: Box<dyn DataProvider>,
    pub(crate) calls: Vec<PendingCall>,
    pub(crate) request_counter: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let ids = if config.shared_ids {
            IdSource::Shared
        } else {
            IdSource::Isolated(IdGenerator::new(config.id_prefix.clone()))
        };
        Self {
            registry: Registry::new(ids, config.growth()),
            config,
            provider: Box::new(NoData),
            calls: Vec::new(),
            request_counter: 0,
        }
    }

    /// Use `provider` to populate virtual tree rows.
    pub fn with_provider(mut self, provider: impl DataProvider + 'static) -> Self {
        self.set_provider(provider);
        self
    }

    pub fn set_provider(&mut self, provider: impl DataProvider + 'static) {
        self.provider = Box::new(provider);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Counter of the last committed cycle; 0 before the first.
    pub fn request_counter(&self) -> u64 {
        self.request_counter
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Create a plain widget under `parent` at `index` (append when `None`).
    pub fn create_node(
        &mut self,
        type_name: &str,
        parent: Option<&NodeId>,
        index: Option<usize>,
    ) -> Result<NodeId> {
        self.create(None, type_name, parent, index, NodeData::Widget, NodeFlags::NONE)
    }

    pub fn create_node_with_id(
        &mut self,
        id: &str,
        type_name: &str,
        parent: Option<&NodeId>,
        index: Option<usize>,
    ) -> Result<NodeId> {
        self.create(Some(id), type_name, parent, index, NodeData::Widget, NodeFlags::NONE)
    }

    pub fn create_list(&mut self, parent: Option<&NodeId>, single: bool) -> Result<NodeId> {
        let data = NodeData::List(ItemCollection::new(single));
        self.create(None, LIST_TYPE, parent, None, data, NodeFlags::NONE)
    }

    pub fn create_list_with_id(
        &mut self,
        id: &str,
        parent: Option<&NodeId>,
        single: bool,
    ) -> Result<NodeId> {
        let data = NodeData::List(ItemCollection::new(single));
        self.create(Some(id), LIST_TYPE, parent, None, data, NodeFlags::NONE)
    }

    /// Create a tree. In virtual mode rows are constructed on first read.
    pub fn create_tree(&mut self, parent: Option<&NodeId>, virtual_mode: bool) -> Result<NodeId> {
        self.create_tree_inner(None, parent, virtual_mode)
    }

    pub fn create_tree_with_id(
        &mut self,
        id: &str,
        parent: Option<&NodeId>,
        virtual_mode: bool,
    ) -> Result<NodeId> {
        self.create_tree_inner(Some(id), parent, virtual_mode)
    }

    /// Insert a row under a tree or row at `index` (append when `None`).
    pub fn create_tree_item(&mut self, parent: &NodeId, index: Option<usize>) -> Result<NodeId> {
        let parent = self.registry.resolve(parent)?;
        let slot = self.registry.insert_tree_item(parent, index, None)?;
        self.id_at(slot)
    }

    pub fn create_tree_item_with_id(
        &mut self,
        id: &str,
        parent: &NodeId,
        index: Option<usize>,
    ) -> Result<NodeId> {
        let parent = self.registry.resolve(parent)?;
        let slot = self.registry.insert_tree_item(parent, index, Some(id))?;
        self.id_at(slot)
    }

    fn create_tree_inner(
        &mut self,
        id: Option<&str>,
        parent: Option<&NodeId>,
        virtual_mode: bool,
    ) -> Result<NodeId> {
        let data = NodeData::Tree(TreeData {
            slots: ChildSlots::new(self.registry.growth.floor),
            reindex_count: 0,
        });
        let flags = if virtual_mode {
            NodeFlags::VIRTUAL
        } else {
            NodeFlags::NONE
        };
        self.create(id, TREE_TYPE, parent, None, data, flags)
    }

    fn create(
        &mut self,
        id: Option<&str>,
        type_name: &str,
        parent: Option<&NodeId>,
        index: Option<usize>,
        data: NodeData,
        flags: NodeFlags,
    ) -> Result<NodeId> {
        let parent = match parent {
            Some(parent) => {
                let slot = self.registry.resolve(parent)?;
                let node = self.node_at(slot)?;
                if node.data().slots().is_some() {
                    return Err(SyncError::InvalidArgument(format!(
                        "{} holds tree rows; use create_tree_item",
                        node.id()
                    )));
                }
                let count = node.children.len();
                if index.is_some_and(|index| index > count) {
                    return Err(SyncError::range(index.unwrap_or(count), count));
                }
                Some(slot)
            }
            None => None,
        };

        let slot = self.registry.allocate(id, type_name, data, flags, parent)?;
        if let Some(parent) = parent {
            if let Some(node) = self.registry.get_mut(parent) {
                let position = index.unwrap_or(node.children.len());
                node.children.insert(position, slot);
            }
            // Placed children carry their position; later siblings shift.
            if let (Some(position), Some(node)) = (index, self.registry.get_mut(slot)) {
                node.position = Some(position);
            }
            self.registry.renumber_children(parent);
        }
        self.id_at(slot)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Set a property through the dynamic path.
    ///
    /// Capability-backed names (`items`, `selectionIndices`, `itemCount`,
    /// `expanded`, `customVariant`) are routed to their model; anything else
    /// is stored as-is and null clears it back to the client default.
    pub fn set_property(&mut self, id: &NodeId, name: &str, value: impl Into<PropValue>) -> Result<()> {
        let slot = self.registry.resolve(id)?;
        let value = value.into();
        let kind = self.node_at(slot)?.kind();

        match (kind, name) {
            (_, VARIANT_PROPERTY) => {
                let variant = match &value {
                    PropValue::Null => None,
                    PropValue::Str(variant) => Some(variant.as_str()),
                    _ => return Err(invalid_type(name, "a string")),
                };
                return self.set_variant(id, variant);
            }
            (NodeKind::List, "items") => {
                let items = string_array(name, &value)?;
                return self.update_list(id, |list| {
                    list.set_items(items);
                    Ok(())
                });
            }
            (NodeKind::List, "selectionIndices") => {
                let indices = int_array(name, &value)?;
                return self.set_selection(id, Selection::Indices(indices));
            }
            (NodeKind::Tree | NodeKind::TreeItem, "itemCount") => {
                let count = value
                    .as_int()
                    .and_then(|count| usize::try_from(count).ok())
                    .ok_or_else(|| invalid_type(name, "a non-negative integer"))?;
                return self.set_item_count(id, count);
            }
            (NodeKind::TreeItem, "expanded") => {
                let expanded = value
                    .as_bool()
                    .ok_or_else(|| invalid_type(name, "a boolean"))?;
                return self.set_expanded(id, expanded);
            }
            (NodeKind::TreeItem, "text") if value.is_null() => {
                return Err(SyncError::null(name));
            }
            _ => {}
        }

        if let Some(node) = self.registry.get_mut(slot) {
            node.set_property(name, value);
        }
        self.registry.mark_dirty(slot);
        Ok(())
    }

    /// Current value of `name` as the client would see it. Tree rows are
    /// populated first.
    pub fn get_property(&mut self, id: &NodeId, name: &str) -> Result<PropValue> {
        let slot = self.materialized(id)?;
        Ok(self
            .node_at(slot)?
            .synced_properties()
            .remove(name)
            .unwrap_or_default())
    }

    /// Set or remove the custom variant, sent as `variant_<name>`.
    pub fn set_variant(&mut self, id: &NodeId, variant: Option<&str>) -> Result<()> {
        let slot = self.registry.resolve(id)?;
        if let Some(node) = self.registry.get_mut(slot) {
            node.variant = variant.map(str::to_string);
        }
        self.registry.mark_dirty(slot);
        Ok(())
    }

    /// Read access to a node. Does not populate tree rows.
    pub fn node(&self, id: &NodeId) -> Result<&Node> {
        let slot = self.registry.resolve(id)?;
        self.node_at(slot)
    }

    // =========================================================================
    // Item Count & Tree Rows
    // =========================================================================

    /// Number of items of a list, tree or row. A tree row is populated first.
    pub fn get_item_count(&mut self, id: &NodeId) -> Result<usize> {
        let slot = self.materialized(id)?;
        let node = self.node_at(slot)?;
        match node.data() {
            NodeData::List(list) => Ok(list.item_count()),
            NodeData::Tree(_) | NodeData::TreeItem(_) => self.registry.item_count(slot),
            NodeData::Widget => Err(SyncError::InvalidArgument(format!(
                "{} is a {} and has no items",
                node.id(),
                node.kind()
            ))),
        }
    }

    pub fn set_item_count(&mut self, id: &NodeId, count: usize) -> Result<()> {
        let slot = self.registry.resolve(id)?;
        self.registry.set_item_count(slot, count)
    }

    /// Row at `index`, constructed and populated on demand.
    pub fn get_item(&mut self, parent: &NodeId, index: usize) -> Result<NodeId> {
        let parent = self.registry.resolve(parent)?;
        let slot = self.registry.tree_item(parent, index, self.provider.as_mut())?;
        self.id_at(slot)
    }

    /// Every row under `parent`, populating all of them.
    pub fn get_items(&mut self, parent: &NodeId) -> Result<Vec<NodeId>> {
        let parent = self.registry.resolve(parent)?;
        let slots = self.registry.tree_items(parent, self.provider.as_mut())?;
        self.ids_at(&slots)
    }

    /// Rows that exist as nodes, without constructing any.
    pub fn created_children(&self, parent: &NodeId) -> Result<Vec<NodeId>> {
        let parent = self.registry.resolve(parent)?;
        let slots = self.registry.created_items(parent)?;
        self.ids_at(&slots)
    }

    /// Position of `child` under `parent`, or -1 when it is not a direct row.
    pub fn index_of(&self, parent: &NodeId, child: &NodeId) -> Result<i32> {
        let parent = self.registry.resolve(parent)?;
        let child = self
            .registry
            .index_of(child.as_str())
            .ok_or_else(|| SyncError::InvalidArgument(format!("{} is disposed", child)))?;
        self.registry.tree_index_of(parent, child)
    }

    pub fn remove_all(&mut self, parent: &NodeId) -> Result<()> {
        let parent = self.registry.resolve(parent)?;
        self.registry.remove_all_items(parent)
    }

    /// Drop the data of row `index`; the next read populates it again.
    pub fn clear(&mut self, parent: &NodeId, index: usize, recursive: bool) -> Result<()> {
        let parent = self.registry.resolve(parent)?;
        self.registry.clear_item(parent, index, recursive)
    }

    pub fn clear_all(&mut self, parent: &NodeId, recursive: bool) -> Result<()> {
        let parent = self.registry.resolve(parent)?;
        self.registry.clear_all_items(parent, recursive)
    }

    pub fn set_expanded(&mut self, id: &NodeId, expanded: bool) -> Result<()> {
        let slot = self.registry.resolve(id)?;
        self.registry.set_expanded(slot, expanded)
    }

    pub fn is_expanded(&self, id: &NodeId) -> Result<bool> {
        Ok(self.node(id)?.is_expanded())
    }

    pub fn depth(&self, id: &NodeId) -> Result<usize> {
        let node = self.node(id)?;
        node.depth().ok_or_else(|| not_a_row(node))
    }

    /// Visible row position, `None` while an ancestor is collapsed.
    pub fn flat_index(&self, id: &NodeId) -> Result<Option<usize>> {
        let slot = self.registry.resolve(id)?;
        self.registry.flat_index(slot)
    }

    /// Parent row of a row; `None` for rows directly under the tree.
    pub fn parent_item(&self, id: &NodeId) -> Result<Option<NodeId>> {
        let node = self.node(id)?;
        if node.kind() != NodeKind::TreeItem {
            return Err(not_a_row(node));
        }
        Ok(node
            .parent
            .and_then(|parent| self.registry.get(parent))
            .filter(|parent| parent.kind() == NodeKind::TreeItem)
            .map(|parent| parent.id().clone()))
    }

    /// Flat-index passes run for `tree` so far.
    pub fn reindex_count(&self, tree: &NodeId) -> Result<u64> {
        let slot = self.registry.resolve(tree)?;
        Ok(self.registry.reindex_count(slot))
    }

    // =========================================================================
    // List Model
    // =========================================================================

    pub fn list(&self, id: &NodeId) -> Result<&ItemCollection> {
        match self.node(id)?.data() {
            NodeData::List(list) => Ok(list),
            _ => Err(not_a_list(id)),
        }
    }

    pub fn add_item(&mut self, id: &NodeId, item: &str) -> Result<()> {
        self.update_list(id, |list| {
            list.add(item);
            Ok(())
        })
    }

    pub fn insert_item(&mut self, id: &NodeId, item: &str, index: usize) -> Result<()> {
        self.update_list(id, |list| list.insert(item, index))
    }

    pub fn set_item(&mut self, id: &NodeId, index: usize, item: &str) -> Result<()> {
        self.update_list(id, |list| list.set_item(index, item))
    }

    pub fn set_items<S: AsRef<str>>(&mut self, id: &NodeId, items: &[S]) -> Result<()> {
        self.update_list(id, |list| {
            list.set_items(items.iter().map(|item| item.as_ref().to_string()));
            Ok(())
        })
    }

    pub fn remove_items(&mut self, id: &NodeId, removal: Removal) -> Result<()> {
        self.update_list(id, |list| list.apply_removal(&removal))
    }

    /// Replace the selection. Invalid entries are dropped silently.
    pub fn set_selection(&mut self, id: &NodeId, selection: Selection) -> Result<()> {
        self.update_list(id, |list| {
            list.apply_selection(&selection);
            Ok(())
        })
    }

    pub fn add_selection(&mut self, id: &NodeId, index: i32) -> Result<()> {
        self.update_list(id, |list| {
            list.add_selection(index);
            Ok(())
        })
    }

    pub fn select_all(&mut self, id: &NodeId) -> Result<()> {
        self.update_list(id, |list| {
            list.select_all();
            Ok(())
        })
    }

    pub fn deselect_all(&mut self, id: &NodeId) -> Result<()> {
        self.update_list(id, |list| {
            list.deselect_all();
            Ok(())
        })
    }

    pub fn selection_index(&self, id: &NodeId) -> Result<i32> {
        Ok(self.list(id)?.selection_index())
    }

    fn update_list<R>(
        &mut self,
        id: &NodeId,
        update: impl FnOnce(&mut ItemCollection) -> Result<R>,
    ) -> Result<R> {
        let slot = self.registry.resolve(id)?;
        let Some(NodeData::List(list)) = self.registry.get_mut(slot).map(|node| &mut node.data)
        else {
            return Err(not_a_list(id));
        };
        let result = update(list)?;
        self.registry.mark_dirty(slot);
        Ok(result)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Dispose a node and its subtree. A node the client never saw leaves
    /// no trace on the wire.
    pub fn dispose(&mut self, id: &NodeId) -> Result<()> {
        let slot = self.registry.resolve(id)?;
        self.registry.dispose(slot);
        Ok(())
    }

    /// Run `callback` once when the node is released.
    pub fn on_dispose(&mut self, id: &NodeId, callback: impl FnOnce() + 'static) -> Result<()> {
        let slot = self.registry.resolve(id)?;
        self.registry.on_destroy(slot, callback);
        Ok(())
    }

    /// Queue a client-side method call for the next committed cycle.
    pub fn call(&mut self, id: &NodeId, method: &str, properties: PropertyMap) -> Result<()> {
        self.registry.resolve(id)?;
        self.calls.push(PendingCall {
            target: id.clone(),
            method: method.to_string(),
            properties,
        });
        Ok(())
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.registry.index_of(id.as_str()).is_some()
    }

    pub fn is_dirty(&self, id: &NodeId) -> bool {
        self.registry
            .index_of(id.as_str())
            .is_some_and(|slot| self.registry.is_dirty(slot))
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Compute the next cycle without committing it.
    pub fn prepare(&mut self) -> Result<RenderCycle<'_>> {
        RenderCycle::prepare(self)
    }

    /// Compute and commit the next cycle.
    pub fn render(&mut self) -> Result<Message> {
        Ok(self.prepare()?.commit())
    }

    /// Feed the next cycle to `sink`, committing only if it accepts
    /// everything. Returns the committed request counter.
    pub fn render_to(&mut self, sink: &mut dyn ChangeSink) -> Result<u64> {
        let cycle = self.prepare()?;
        cycle.replay_into(sink)?;
        Ok(cycle.commit().head.request_counter)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Resolve `id`, populating it first when it is a tree row.
    fn materialized(&mut self, id: &NodeId) -> Result<usize> {
        let slot = self.registry.resolve(id)?;
        self.registry.materialize(slot, self.provider.as_mut())?;
        Ok(slot)
    }

    fn node_at(&self, slot: usize) -> Result<&Node> {
        self.registry
            .get(slot)
            .ok_or_else(|| SyncError::InvalidArgument(format!("slot {} holds no node", slot)))
    }

    fn id_at(&self, slot: usize) -> Result<NodeId> {
        Ok(self.node_at(slot)?.id().clone())
    }

    fn ids_at(&self, slots: &[usize]) -> Result<Vec<NodeId>> {
        slots.iter().map(|&slot| self.id_at(slot)).collect()
    }
}

fn not_a_list(id: &NodeId) -> SyncError {
    SyncError::InvalidArgument(format!("{} is not a list", id))
}

fn not_a_row(node: &Node) -> SyncError {
    SyncError::InvalidArgument(format!("{} is a {}, not a tree item", node.id(), node.kind()))
}

fn invalid_type(name: &str, expected: &str) -> SyncError {
    SyncError::InvalidArgument(format!("{} must be {}", name, expected))
}

fn string_array(name: &str, value: &PropValue) -> Result<Vec<String>> {
    let entries = match value {
        PropValue::Null => return Err(SyncError::null(name)),
        PropValue::Array(entries) => entries,
        _ => return Err(invalid_type(name, "an array of strings")),
    };
    entries
        .iter()
        .map(|entry| match entry {
            PropValue::Str(item) => Ok(item.clone()),
            PropValue::Null => Err(SyncError::null("list item")),
            _ => Err(invalid_type(name, "an array of strings")),
        })
        .collect()
}

fn int_array(name: &str, value: &PropValue) -> Result<Vec<i32>> {
    let to_i32 = |entry: &PropValue| {
        entry
            .as_int()
            .map(|index| i32::try_from(index).unwrap_or(-1))
            .ok_or_else(|| invalid_type(name, "an array of integers"))
    };
    match value {
        PropValue::Null => Err(SyncError::null(name)),
        PropValue::Array(entries) => entries.iter().map(to_i32).collect(),
        single => Ok(vec![to_i32(single)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PopulateError;
    use std::cell::Cell;
    use std::rc::Rc;

    fn session() -> Session {
        Session::new(SessionConfig::default())
    }

    fn list_with(session: &mut Session, single: bool, items: &[&str]) -> NodeId {
        let list = session.create_list(None, single).unwrap();
        session.set_items(&list, items).unwrap();
        list
    }

    #[test]
    fn test_generated_ids_are_session_scoped() {
        let mut first = session();
        let mut second = session();
        assert_eq!(first.create_node("t", None, None).unwrap().as_str(), "w1");
        assert_eq!(second.create_node("t", None, None).unwrap().as_str(), "w1");
    }

    #[test]
    fn test_create_under_parent_respects_index() {
        let mut session = session();
        let shell = session.create_node("rwt.widgets.Shell", None, None).unwrap();
        let a = session.create_node("t", Some(&shell), None).unwrap();
        let b = session.create_node("t", Some(&shell), Some(0)).unwrap();

        let children: Vec<&NodeId> = session
            .node(&shell)
            .unwrap()
            .children
            .iter()
            .map(|&slot| session.registry.node_id(slot).unwrap())
            .collect();
        assert_eq!(children, vec![&b, &a]);
        assert!(matches!(
            session.create_node("t", Some(&shell), Some(5)),
            Err(SyncError::InvalidRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn test_duplicate_explicit_id() {
        let mut session = session();
        session.create_node_with_id("shell", "t", None, None).unwrap();
        assert!(matches!(
            session.create_list_with_id("shell", None, false),
            Err(SyncError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_selection_reindex_through_session() {
        let mut session = session();
        let list = list_with(&mut session, false, &["a", "b", "c", "d"]);
        session.set_selection(&list, Selection::Indices(vec![1, 3])).unwrap();

        session.remove_items(&list, Removal::Index(0)).unwrap();

        let model = session.list(&list).unwrap();
        assert_eq!(model.items(), &["b", "c", "d"]);
        assert_eq!(model.selection_indices(), &[0, 2]);
        assert_eq!(model.selected_items(), vec!["b", "d"]);
    }

    #[test]
    fn test_lenient_selection_vs_strict_remove() {
        let mut session = session();
        let list = list_with(&mut session, false, &["a", "b", "c"]);
        session.set_selection(&list, Selection::Index(99)).unwrap();
        assert_eq!(session.selection_index(&list).unwrap(), -1);

        assert!(matches!(
            session.remove_items(&list, Removal::Index(99)),
            Err(SyncError::InvalidRange { index: 99, len: 3 })
        ));
    }

    #[test]
    fn test_single_selection_through_session() {
        let mut session = session();
        let list = list_with(&mut session, true, &["a", "b", "c", "d", "e"]);
        session.set_selection(&list, Selection::Indices(vec![0, 1])).unwrap();
        assert_eq!(session.list(&list).unwrap().selection_count(), 0);

        session.set_selection(&list, Selection::Indices(vec![2])).unwrap();
        assert_eq!(session.list(&list).unwrap().selection_indices(), &[2]);
    }

    #[test]
    fn test_dynamic_property_null_checks() {
        let mut session = session();
        let list = session.create_list(None, false).unwrap();
        assert!(matches!(
            session.set_property(&list, "items", PropValue::Null),
            Err(SyncError::InvalidArgument(_))
        ));
        assert!(matches!(
            session.set_property(&list, "items", PropValue::Array(vec!["a".into(), PropValue::Null])),
            Err(SyncError::InvalidArgument(_))
        ));
        assert!(matches!(
            session.set_property(&list, "selectionIndices", PropValue::Null),
            Err(SyncError::InvalidArgument(_))
        ));

        session.set_property(&list, "items", vec!["x", "y"]).unwrap();
        session.set_property(&list, "selectionIndices", vec![1, 7]).unwrap();
        assert_eq!(session.list(&list).unwrap().selection_indices(), &[1]);
    }

    #[test]
    fn test_wrong_capability_is_invalid_argument() {
        let mut session = session();
        let button = session.create_node("rwt.widgets.Button", None, None).unwrap();
        assert!(matches!(
            session.add_item(&button, "a"),
            Err(SyncError::InvalidArgument(_))
        ));
        assert!(matches!(
            session.get_item_count(&button),
            Err(SyncError::InvalidArgument(_))
        ));
        assert!(matches!(
            session.create_tree_item(&button, None),
            Err(SyncError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_disposed_id_is_rejected() {
        let mut session = session();
        let button = session.create_node("t", None, None).unwrap();
        session.dispose(&button).unwrap();
        assert!(!session.contains(&button));
        assert!(matches!(
            session.set_property(&button, "text", "x"),
            Err(SyncError::Disposed(_))
        ));
    }

    #[test]
    fn test_get_item_count_populates_row() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut session = session().with_provider(move |item: &mut Node, _: usize| -> std::result::Result<(), PopulateError> {
            counter.set(counter.get() + 1);
            item.set_text("row");
            Ok(())
        });
        let tree = session.create_tree(None, true).unwrap();
        session.set_item_count(&tree, 3).unwrap();
        let row = session.get_item(&tree, 1).unwrap();
        assert_eq!(calls.get(), 1);

        session.clear(&tree, 1, false).unwrap();
        assert_eq!(session.get_item_count(&row).unwrap(), 0);
        assert_eq!(calls.get(), 2);
        assert_eq!(session.get_property(&row, "text").unwrap(), PropValue::from("row"));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_parent_item_and_depth() {
        let mut session = session();
        let tree = session.create_tree(None, false).unwrap();
        let root = session.create_tree_item(&tree, None).unwrap();
        let child = session.create_tree_item(&root, None).unwrap();

        assert_eq!(session.parent_item(&root).unwrap(), None);
        assert_eq!(session.parent_item(&child).unwrap(), Some(root.clone()));
        assert_eq!(session.depth(&child).unwrap(), 1);
        assert_eq!(session.index_of(&root, &child).unwrap(), 0);
        assert_eq!(session.index_of(&tree, &child).unwrap(), -1);
        assert!(session.depth(&tree).is_err());
    }

    #[test]
    fn test_on_dispose_runs_for_subtree() {
        let mut session = session();
        let tree = session.create_tree(None, false).unwrap();
        let row = session.create_tree_item(&tree, None).unwrap();
        let released = Rc::new(Cell::new(false));
        let flag = released.clone();
        session.on_dispose(&row, move || flag.set(true)).unwrap();

        session.dispose(&tree).unwrap();
        assert!(released.get());
        assert!(session.is_empty());
    }
}
