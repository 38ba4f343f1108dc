//! Node - one addressable UI element held by the registry.
//!
//! A node carries the generic adapter state every element shares (id,
//! lifecycle flags, parent link, live properties, change store) plus a
//! tagged [`NodeData`] payload selecting the kind-specific capability.
//! Parent links are plain slot indices and never own anything; ownership
//! flows parent to child through the child lists.

use crate::engine::store::ChangeStore;
use crate::model::ItemCollection;
use crate::tree::ChildSlots;
use crate::types::{NodeFlags, NodeId, NodeKind, PropValue, PropertyMap};

/// Property carrying the custom variant on the wire.
pub const VARIANT_PROPERTY: &str = "customVariant";

/// Property carrying a node's position among its siblings.
pub const INDEX_PROPERTY: &str = "index";

// =============================================================================
// Capability Payloads
// =============================================================================

/// Tree root state.
#[derive(Debug, Clone)]
pub struct TreeData {
    pub(crate) slots: ChildSlots,
    /// Number of flat-index recomputations so far.
    pub(crate) reindex_count: u64,
}

/// Tree row state.
#[derive(Debug, Clone)]
pub struct TreeItemData {
    /// Slot of the owning tree.
    pub(crate) tree: usize,
    /// Position among siblings.
    pub(crate) index: usize,
    pub(crate) depth: usize,
    /// Last computed visible row; stale while an ancestor is collapsed.
    pub(crate) flat_index: usize,
    pub(crate) slots: ChildSlots,
}

/// Kind-specific payload of a node.
#[derive(Debug, Clone)]
pub enum NodeData {
    Widget,
    List(ItemCollection),
    Tree(TreeData),
    TreeItem(TreeItemData),
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Widget => NodeKind::Widget,
            NodeData::List(_) => NodeKind::List,
            NodeData::Tree(_) => NodeKind::Tree,
            NodeData::TreeItem(_) => NodeKind::TreeItem,
        }
    }

    pub(crate) fn slots(&self) -> Option<&ChildSlots> {
        match self {
            NodeData::Tree(tree) => Some(&tree.slots),
            NodeData::TreeItem(item) => Some(&item.slots),
            _ => None,
        }
    }

    pub(crate) fn slots_mut(&mut self) -> Option<&mut ChildSlots> {
        match self {
            NodeData::Tree(tree) => Some(&mut tree.slots),
            NodeData::TreeItem(item) => Some(&mut item.slots),
            _ => None,
        }
    }
}

// =============================================================================
// Node
// =============================================================================

/// A UI element instance.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) type_name: String,
    /// Creation order; parents always precede their children.
    pub(crate) serial: u64,
    pub(crate) flags: NodeFlags,
    pub(crate) parent: Option<usize>,
    /// Ordered children of plain widgets and lists.
    pub(crate) children: Vec<usize>,
    /// Position among plain siblings, tracked once created at an explicit index.
    pub(crate) position: Option<usize>,
    pub(crate) variant: Option<String>,
    pub(crate) props: PropertyMap,
    pub(crate) store: ChangeStore,
    pub(crate) data: NodeData,
}

impl Node {
    pub(crate) fn new(id: NodeId, type_name: &str, serial: u64, data: NodeData) -> Self {
        Self {
            id,
            type_name: type_name.to_string(),
            serial,
            flags: NodeFlags::NONE,
            parent: None,
            children: Vec::new(),
            position: None,
            variant: None,
            props: PropertyMap::new(),
            store: ChangeStore::new(),
            data,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Client-side type, e.g. `rwt.widgets.Tree`.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn is_initialized(&self) -> bool {
        self.flags.contains(NodeFlags::INITIALIZED)
    }

    pub fn is_disposed(&self) -> bool {
        self.flags.contains(NodeFlags::DISPOSED)
    }

    /// Row data present. Always true outside virtual trees.
    pub fn is_cached(&self) -> bool {
        !self.flags.contains(NodeFlags::VIRTUAL) || self.flags.contains(NodeFlags::CACHED)
    }

    pub fn is_expanded(&self) -> bool {
        self.flags.contains(NodeFlags::EXPANDED)
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    pub fn property(&self, name: &str) -> Option<&PropValue> {
        self.props.get(name)
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.props
    }

    pub fn store(&self) -> &ChangeStore {
        &self.store
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Position the client is told about: the row index for tree rows, the
    /// explicit position for other children.
    pub fn position(&self) -> Option<usize> {
        self.tree_index().or(self.position)
    }

    /// Position among tree siblings.
    pub fn tree_index(&self) -> Option<usize> {
        match &self.data {
            NodeData::TreeItem(item) => Some(item.index),
            _ => None,
        }
    }

    pub fn depth(&self) -> Option<usize> {
        match &self.data {
            NodeData::TreeItem(item) => Some(item.depth),
            _ => None,
        }
    }

    /// Set a live property. In a virtual tree this also marks the row cached.
    pub fn set_property(&mut self, name: &str, value: impl Into<PropValue>) {
        self.props.insert(name.to_string(), value.into());
        if self.kind() == NodeKind::TreeItem {
            self.mark_cached();
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.set_property("text", PropValue::Str(text.into()));
    }

    pub fn text(&self) -> Option<&str> {
        self.property("text").and_then(PropValue::as_str)
    }

    pub(crate) fn mark_cached(&mut self) {
        if self.flags.contains(NodeFlags::VIRTUAL) {
            self.flags.insert(NodeFlags::CACHED);
        }
    }

    /// Reset every live property to null and forget the cached row data.
    pub(crate) fn clear_data(&mut self) {
        for value in self.props.values_mut() {
            *value = PropValue::Null;
        }
        self.flags.remove(NodeFlags::CACHED);
    }

    // =========================================================================
    // Synchronized View
    // =========================================================================

    /// Everything the client mirrors: live properties, the variant and the
    /// values derived from the node's capability.
    pub fn synced_properties(&self) -> PropertyMap {
        let mut props = self.props.clone();
        // Null once the variant is removed, so the client hears about it.
        let variant = match &self.variant {
            Some(variant) => PropValue::Str(format!("variant_{}", variant)),
            None => PropValue::Null,
        };
        props.insert(VARIANT_PROPERTY.to_string(), variant);
        if let Some(position) = self.position() {
            props.insert(INDEX_PROPERTY.to_string(), position.into());
        }
        match &self.data {
            NodeData::Widget => {}
            NodeData::List(list) => {
                props.insert("items".to_string(), list.items().to_vec().into());
                props.insert(
                    "selectionIndices".to_string(),
                    list.selection_indices().to_vec().into(),
                );
            }
            NodeData::Tree(tree) => {
                props.insert("itemCount".to_string(), tree.slots.count().into());
            }
            NodeData::TreeItem(item) => {
                props.insert("itemCount".to_string(), item.slots.count().into());
                props.insert("expanded".to_string(), self.is_expanded().into());
            }
        }
        props
    }

    /// Whether `value` is what the client assumes before being told anything.
    ///
    /// A position is never a default: the client needs it to place the node.
    pub fn is_default(&self, name: &str, value: &PropValue) -> bool {
        if value.is_null() {
            return true;
        }
        match (&self.data, name) {
            (_, INDEX_PROPERTY) => false,
            (NodeData::List(_), "items" | "selectionIndices") => {
                value.as_array().is_some_and(<[PropValue]>::is_empty)
            }
            (NodeData::Tree(_) | NodeData::TreeItem(_), "itemCount") => value.as_int() == Some(0),
            (NodeData::TreeItem(_), "expanded") => value.as_bool() == Some(false),
            (NodeData::TreeItem(_), "text") => value.as_str() == Some(""),
            _ => false,
        }
    }
}
