//! Item Collection - ordered string items plus an index-based selection.
//!
//! Two error regimes live side by side here:
//! - indexed item access (`get_item`, `remove`, `insert`) is strict and
//!   fails with [`SyncError::InvalidRange`]
//! - the selection setters are lenient: out-of-range indices and unmatched
//!   strings are dropped, possibly leaving the selection empty
//!
//! Selection indices reference items by position. Removing item `k` drops
//! `k` from the selection and shifts every selected index above `k` down by
//! one. Inserting does not shift the selection.

use crate::error::{Result, SyncError};

/// Flat list model with single or multi selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemCollection {
    single: bool,
    items: Vec<String>,
    /// Insertion order, no duplicates, every entry `< items.len()`.
    selection: Vec<usize>,
}

/// Lenient selection request. Invalid entries are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Index(i32),
    Indices(Vec<i32>),
    /// Inclusive, clamped to the item range.
    Range(i32, i32),
    Items(Vec<String>),
}

/// Strict removal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Index(usize),
    /// Inclusive.
    Range(usize, usize),
    Indices(Vec<usize>),
    Item(String),
    All,
}

impl ItemCollection {
    pub fn new(single: bool) -> Self {
        Self {
            single,
            items: Vec::new(),
            selection: Vec::new(),
        }
    }

    pub fn is_single(&self) -> bool {
        self.single
    }

    // =========================================================================
    // Items
    // =========================================================================

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn get_item(&self, index: usize) -> Result<&str> {
        self.check_index(index)?;
        Ok(&self.items[index])
    }

    /// First position holding `item`.
    pub fn index_of(&self, item: &str) -> Option<usize> {
        self.items.iter().position(|candidate| candidate == item)
    }

    /// Append an item.
    pub fn add(&mut self, item: impl Into<String>) {
        self.items.push(item.into());
    }

    /// Insert at `index`; `index == item_count()` appends.
    ///
    /// The selection is left untouched, so a selected position now refers to
    /// whichever item moved into it.
    pub fn insert(&mut self, item: impl Into<String>, index: usize) -> Result<()> {
        if index != self.items.len() {
            self.check_index(index)?;
        }
        self.items.insert(index, item.into());
        Ok(())
    }

    pub fn set_item(&mut self, index: usize, item: impl Into<String>) -> Result<()> {
        self.check_index(index)?;
        self.items[index] = item.into();
        Ok(())
    }

    /// Replace every item and clear the selection.
    pub fn set_items<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = items.into_iter().map(Into::into).collect();
        self.deselect_all();
    }

    pub fn remove(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.items.remove(index);
        self.remove_from_selection(index);
        Ok(())
    }

    /// Remove `start..=end`, highest index first.
    pub fn remove_range(&mut self, start: usize, end: usize) -> Result<()> {
        self.check_index(start)?;
        self.check_index(end)?;
        for index in (start..=end).rev() {
            self.remove(index)?;
        }
        Ok(())
    }

    /// Remove every listed index. Bounds are checked on the sorted extremes
    /// before anything is removed.
    pub fn remove_indices(&mut self, indices: &[usize]) -> Result<()> {
        if indices.is_empty() {
            return Ok(());
        }
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        self.check_index(sorted[0])?;
        self.check_index(sorted[sorted.len() - 1])?;
        for &index in sorted.iter().rev() {
            self.remove(index)?;
        }
        Ok(())
    }

    /// Remove the first item equal to `item`.
    pub fn remove_item(&mut self, item: &str) -> Result<()> {
        match self.index_of(item) {
            Some(index) => self.remove(index),
            None => Err(SyncError::range(-1, self.items.len())),
        }
    }

    pub fn remove_all(&mut self) {
        self.items.clear();
        self.deselect_all();
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// First selected index, or -1 when nothing is selected.
    pub fn selection_index(&self) -> i32 {
        self.selection.first().map_or(-1, |&index| index as i32)
    }

    pub fn selection_indices(&self) -> &[usize] {
        &self.selection
    }

    pub fn selection_count(&self) -> usize {
        self.selection.len()
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selection.contains(&index)
    }

    /// Selected items in selection order.
    pub fn selected_items(&self) -> Vec<&str> {
        self.selection
            .iter()
            .map(|&index| self.items[index].as_str())
            .collect()
    }

    /// Select exactly `index`; out of range clears the selection.
    pub fn set_selection(&mut self, index: i32) {
        self.deselect_all();
        if let Some(index) = self.valid_index(index) {
            self.selection.push(index);
        }
    }

    /// Select every in-range index of `indices`, dropping the rest.
    pub fn set_selection_indices(&mut self, indices: &[i32]) {
        self.deselect_all();
        let mut resolved = Vec::with_capacity(indices.len());
        for &index in indices {
            if let Some(index) = self.valid_index(index) {
                if !resolved.contains(&index) {
                    resolved.push(index);
                }
            }
        }
        self.apply_resolved(resolved);
    }

    /// Select `start..=end` clamped to the item range.
    pub fn set_selection_range(&mut self, start: i32, end: i32) {
        self.deselect_all();
        let count = self.items.len() as i64;
        let (start, end) = (start as i64, end as i64);
        if count == 0 || end < 0 || start > end || start > count - 1 {
            return;
        }
        let first = start.max(0) as usize;
        let last = end.min(count - 1) as usize;
        self.apply_resolved((first..=last).collect());
    }

    /// Select items by value; unmatched strings are dropped.
    pub fn set_selection_items<S: AsRef<str>>(&mut self, items: &[S]) {
        self.deselect_all();
        let mut resolved = Vec::with_capacity(items.len());
        for item in items {
            if let Some(index) = self.index_of(item.as_ref()) {
                if !resolved.contains(&index) {
                    resolved.push(index);
                }
            }
        }
        self.apply_resolved(resolved);
    }

    /// Add `index` to the selection if it is in range and not yet selected.
    pub fn add_selection(&mut self, index: i32) {
        if let Some(index) = self.valid_index(index) {
            if !self.selection.contains(&index) {
                self.selection.push(index);
            }
        }
    }

    /// Select every item. No-op in single-selection mode.
    pub fn select_all(&mut self) {
        if !self.single {
            self.selection = (0..self.items.len()).collect();
        }
    }

    pub fn deselect_all(&mut self) {
        self.selection.clear();
    }

    /// Replace the selection. Never fails; see [`Selection`].
    pub fn apply_selection(&mut self, selection: &Selection) {
        match selection {
            Selection::Index(index) => self.set_selection(*index),
            Selection::Indices(indices) => self.set_selection_indices(indices),
            Selection::Range(start, end) => self.set_selection_range(*start, *end),
            Selection::Items(items) => self.set_selection_items(items),
        }
    }

    pub fn apply_removal(&mut self, removal: &Removal) -> Result<()> {
        match removal {
            Removal::Index(index) => self.remove(*index),
            Removal::Range(start, end) => self.remove_range(*start, *end),
            Removal::Indices(indices) => self.remove_indices(indices),
            Removal::Item(item) => self.remove_item(item),
            Removal::All => {
                self.remove_all();
                Ok(())
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn apply_resolved(&mut self, resolved: Vec<usize>) {
        if self.single && resolved.len() != 1 {
            return;
        }
        self.selection = resolved;
    }

    fn valid_index(&self, index: i32) -> Option<usize> {
        usize::try_from(index)
            .ok()
            .filter(|&index| index < self.items.len())
    }

    fn remove_from_selection(&mut self, removed: usize) {
        self.selection.retain(|&index| index != removed);
        for index in self.selection.iter_mut() {
            if *index > removed {
                *index -= 1;
            }
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.items.len() {
            return Err(SyncError::range(index, self.items.len()));
        }
        Ok(())
    }
}
