//! Item models shared by list-like widgets.

mod list;

pub use list::{ItemCollection, Removal, Selection};
