//! Data-request callback.
//!
//! In a virtual tree, row data is supplied on demand. The provider is
//! called synchronously with the row node and its index among its siblings
//! and must fill in the node's observable fields before returning.

use crate::engine::Node;
use crate::error::PopulateError;

/// Populates tree rows on first read.
pub trait DataProvider {
    fn populate(&mut self, item: &mut Node, index: usize) -> Result<(), PopulateError>;
}

impl<F> DataProvider for F
where
    F: FnMut(&mut Node, usize) -> Result<(), PopulateError>,
{
    fn populate(&mut self, item: &mut Node, index: usize) -> Result<(), PopulateError> {
        self(item, index)
    }
}

/// Provider that supplies nothing. Rows become cached without data.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoData;

impl DataProvider for NoData {
    fn populate(&mut self, _item: &mut Node, _index: usize) -> Result<(), PopulateError> {
        Ok(())
    }
}
