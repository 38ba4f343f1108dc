//! Child slot array with a separate logical count.
//!
//! The physical array is allowed to be longer than the number of logical
//! children, and in virtual mode logical slots may be empty until the row is
//! requested.

use crate::config::Growth;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildSlots {
    slots: Vec<Option<usize>>,
    count: usize,
}

impl ChildSlots {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            count: 0,
        }
    }

    /// Logical number of children.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Physical array length.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Constructed child at `index`, if any.
    pub fn get(&self, index: usize) -> Option<usize> {
        if index < self.count {
            self.slots[index]
        } else {
            None
        }
    }

    pub fn position_of(&self, slot: usize) -> Option<usize> {
        self.logical().iter().position(|&entry| entry == Some(slot))
    }

    /// Logical slots, `None` where the row has not been constructed.
    pub fn logical(&self) -> &[Option<usize>] {
        &self.slots[..self.count]
    }

    /// Constructed children in order.
    pub fn constructed(&self) -> Vec<usize> {
        self.logical().iter().flatten().copied().collect()
    }

    pub(crate) fn set(&mut self, index: usize, slot: usize) {
        self.slots[index] = Some(slot);
    }

    /// Insert at `index <= count`, growing the physical array when full.
    ///
    /// While `interactive` the array grows by a fixed increment, otherwise by
    /// half its length.
    pub(crate) fn insert(&mut self, index: usize, slot: usize, growth: Growth, interactive: bool) {
        if self.count == self.slots.len() {
            let length = if interactive {
                self.slots.len() + growth.increment
            } else {
                growth.floor.max(self.slots.len() * 3 / 2)
            };
            self.slots.resize(length, None);
        }
        self.slots[index..=self.count].rotate_right(1);
        self.slots[index] = Some(slot);
        self.count += 1;
    }

    /// Remove the logical slot at `index`, shifting later siblings down.
    pub(crate) fn remove(&mut self, index: usize, growth: Growth) -> Option<usize> {
        let removed = self.slots[index];
        self.slots[index..self.count].rotate_left(1);
        self.count -= 1;
        self.slots[self.count] = None;
        if self.count == 0 {
            self.slots = vec![None; growth.floor];
        }
        removed
    }

    /// Set the logical count to `count` and size the physical array to the
    /// next multiple of `growth.floor` (at least `growth.floor`).
    ///
    /// Slots beyond the new count are dropped; callers dispose them first.
    pub(crate) fn resize(&mut self, count: usize, growth: Growth) {
        for entry in self.slots.iter_mut().skip(count) {
            *entry = None;
        }
        let length = growth.floor.max(count.div_ceil(growth.floor) * growth.floor);
        self.slots.resize(length, None);
        self.count = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn growth() -> Growth {
        Growth {
            increment: 4,
            floor: 4,
        }
    }

    #[test]
    fn test_insert_shifts_and_grows() {
        let mut slots = ChildSlots::new(4);
        for slot in 0..4 {
            slots.insert(slot, slot + 10, growth(), false);
        }
        assert_eq!(slots.capacity(), 4);

        slots.insert(1, 99, growth(), false);
        assert_eq!(slots.capacity(), 6);
        assert_eq!(slots.constructed(), vec![10, 99, 11, 12, 13]);
    }

    #[test]
    fn test_interactive_growth_is_fixed_increment() {
        let mut slots = ChildSlots::new(4);
        for slot in 0..5 {
            slots.insert(slot, slot, growth(), true);
        }
        assert_eq!(slots.capacity(), 8);
    }

    #[test]
    fn test_remove_compacts() {
        let mut slots = ChildSlots::new(4);
        for slot in 0..3 {
            slots.insert(slot, slot, growth(), false);
        }
        assert_eq!(slots.remove(0, growth()), Some(0));
        assert_eq!(slots.logical(), [Some(1), Some(2)]);
        slots.remove(0, growth());
        slots.remove(0, growth());
        assert_eq!(slots.count(), 0);
        assert_eq!(slots.capacity(), 4);
    }

    #[test]
    fn test_resize_rounds_to_four() {
        let mut slots = ChildSlots::new(4);
        slots.resize(1000, growth());
        assert_eq!(slots.count(), 1000);
        assert_eq!(slots.capacity(), 1000);
        assert!(slots.constructed().is_empty());

        slots.resize(5, growth());
        assert_eq!(slots.capacity(), 8);

        slots.resize(0, growth());
        assert_eq!(slots.capacity(), 4);
    }
}
