use serde::{Deserialize, Serialize};

/// Stable index into an [`Arena`].
///
/// Slots are never reclaimed while a simulation runs, so a plain index is a
/// sound identity — no generation counter is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArenaIndex(pub u32);

impl ArenaIndex {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Append-only store handing out stable indices.
///
/// The collision code frequently needs simultaneous mutable access to both
/// halves of a pair; [`Arena::get2_mut`] provides that through a disjoint
/// split instead of interior mutability.
#[derive(Debug, Default)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn insert(&mut self, item: T) -> ArenaIndex {
        let index = self.items.len() as u32;
        self.items.push(item);
        ArenaIndex(index)
    }

    pub fn get(&self, id: ArenaIndex) -> Option<&T> {
        self.items.get(id.index())
    }

    pub fn get_mut(&mut self, id: ArenaIndex) -> Option<&mut T> {
        self.items.get_mut(id.index())
    }

    /// Mutable references to two distinct slots at once.
    ///
    /// Returns `None` when the indices alias or either is out of range.
    pub fn get2_mut(&mut self, a: ArenaIndex, b: ArenaIndex) -> Option<(&mut T, &mut T)> {
        if a == b || a.index() >= self.items.len() || b.index() >= self.items.len() {
            return None;
        }
        let (low, high, flipped) = if a.index() < b.index() {
            (a.index(), b.index(), false)
        } else {
            (b.index(), a.index(), true)
        };
        let (left, right) = self.items.split_at_mut(high);
        let first = &mut left[low];
        let second = &mut right[0];
        if flipped {
            Some((second, first))
        } else {
            Some((first, second))
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = ArenaIndex> + '_ {
        (0..self.items.len() as u32).map(ArenaIndex)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    /// Contiguous view of every slot, for data-parallel sweeps.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
