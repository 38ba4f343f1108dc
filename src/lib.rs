//! # spark-remote
//!
//! Server-side retained UI model kept in sync with a remote rendering client.
//!
//! ## Architecture
//!
//! The server owns the widget tree; the client mirrors it. Every request
//! cycle turns the nodes touched since the last cycle into an ordered list
//! of wire operations:
//!
//! ```text
//! Session mutations → dirty set → change store diff → CREATE / SET / DESTROY / CALL
//! ```
//!
//! Nodes live in an arena registry and refer to each other by slot index.
//! Lists keep an index-based selection that survives removals. Trees can run
//! in virtual mode, where rows are constructed and populated only when read.
//!
//! ## Modules
//!
//! - [`types`] - Core types (NodeId, PropValue, NodeFlags, NodeKind)
//! - [`engine`] - Node registry, change stores, id generation
//! - [`model`] - Item collection with single or multi selection
//! - [`tree`] - Virtual tree rows, child slots, data provider
//! - [`pipeline`] - Render cycles, wire operations, change sinks
//! - [`session`] - The user-level API tying it together

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod session;
pub mod tree;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::{parse_env_flag, SessionConfig};
pub use error::{PopulateError, Result, SyncError};

pub use engine::{
    init_shared_ids, next_shared_id, reset_shared_ids, ChangeStore, IdGenerator, Node, NodeData,
    INDEX_PROPERTY, VARIANT_PROPERTY,
};

pub use model::{ItemCollection, Removal, Selection};

pub use tree::{DataProvider, NoData};

pub use pipeline::{ChangeSink, Head, Message, MessageWriter, Operation, RenderCycle};

pub use session::Session;
