//! Virtual Tree - lazily materialized rows with flat indices.
//!
//! - [`ChildSlots`]: physical child array with a logical count
//! - [`DataProvider`]: callback filling a row on first read
//! - registry operations for rows (insert, item count, expand, clear)

mod ops;
mod provider;
mod slots;

pub use provider::{DataProvider, NoData};
pub use slots::ChildSlots;
