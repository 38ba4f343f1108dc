//! Sync Engine - node registry, change stores and id generation.
//!
//! The engine manages the core data structures:
//! - Registry: slot allocation, id mapping, dirty set, pending destroys
//! - Node: generic adapter state plus a kind-specific payload
//! - ChangeStore: the snapshot of what the client last saw
//! - IdGenerator: session-scoped or process-wide id issuing
//!
//! # Architecture
//!
//! Nodes are NOT linked objects. They live in one arena and refer to each
//! other by slot index:
//!
//! ```text
//! Slot 0: Tree      (parent=None, itemCount=3, rows=[1, _, 2])
//! Slot 1: TreeItem  (parent=0, index=0, cached)
//! Slot 2: TreeItem  (parent=0, index=2, cached)
//! ```
//!
//! Freed slots are recycled, so a slot index is only meaningful while the
//! node it names is alive. Ids are never reused within a session.

pub mod id_gen;
pub(crate) mod node;
pub(crate) mod registry;
mod store;

pub use id_gen::{init_shared_ids, next_shared_id, reset_shared_ids, IdGenerator, IdSource};
pub use node::{Node, NodeData, TreeData, TreeItemData, INDEX_PROPERTY, VARIANT_PROPERTY};
pub use registry::{PendingDestroy, Registry};
pub use store::ChangeStore;
