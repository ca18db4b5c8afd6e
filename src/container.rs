//! The shared, fixed-length array the workers write into.
//!
//! No lock guards the cells. Instead [`SharedContainer::slots_mut`] splits the
//! array into one exclusive [`Slot`] borrow per index, so the borrow checker
//! guarantees that no two workers ever touch the same cell.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedContainer {
    cells: Vec<i64>,
}

impl SharedContainer {
    /// Allocates `len` zero-filled cells.
    pub fn new(len: usize) -> Self {
        Self {
            cells: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Zeroes every cell, as at allocation.
    pub fn reset(&mut self) {
        self.cells.fill(0);
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.cells
    }

    /// One slot per index, in index order. The slots partition the container.
    pub fn slots_mut(&mut self) -> impl Iterator<Item = Slot<'_>> {
        self.cells
            .iter_mut()
            .enumerate()
            .map(|(index, cell)| Slot { index, cell })
    }

    pub fn into_vec(self) -> Vec<i64> {
        self.cells
    }
}

/// Exclusive access to a single cell of a [`SharedContainer`].
#[derive(Debug)]
pub struct Slot<'a> {
    index: usize,
    cell: &'a mut i64,
}

impl Slot<'_> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn write(&mut self, value: i64) {
        *self.cell = value;
    }

    pub fn read(&self) -> i64 {
        *self.cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_zero_initialized() {
        let container = SharedContainer::new(3);
        assert_eq!(container.len(), 3);
        assert_eq!(container.as_slice(), &[0, 0, 0]);
    }

    #[test]
    fn test_empty_container_has_no_slots() {
        let mut container = SharedContainer::new(0);
        assert!(container.is_empty());
        assert_eq!(container.slots_mut().count(), 0);
    }

    #[test]
    fn test_slots_partition_indices() {
        let mut container = SharedContainer::new(5);
        let indices: Vec<usize> = container.slots_mut().map(|slot| slot.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_slot_write_is_visible() {
        let mut container = SharedContainer::new(3);
        for mut slot in container.slots_mut() {
            let value = slot.index() as i64 * 10;
            slot.write(value);
            assert_eq!(slot.read(), value);
        }
        assert_eq!(container.into_vec(), vec![0, 10, 20]);
    }

    #[test]
    fn test_reset_zeroes_cells() {
        let mut container = SharedContainer::new(3);
        for mut slot in container.slots_mut() {
            slot.write(9);
        }
        container.reset();
        assert_eq!(container.as_slice(), &[0, 0, 0]);
        assert_eq!(container.len(), 3);
    }

    #[test]
    fn test_slots_move_into_scoped_threads() {
        let mut container = SharedContainer::new(4);

        thread::scope(|s| {
            for mut slot in container.slots_mut() {
                s.spawn(move || {
                    let index = slot.index() as i64;
                    slot.write(index + 1);
                });
            }
        });

        assert_eq!(container.as_slice(), &[1, 2, 3, 4]);
    }
}
