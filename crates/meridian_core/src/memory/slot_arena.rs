//! # Slot Arena
//!
//! Fixed-capacity slot storage addressed by stable integer indices.

/// A slot arena for long-lived records.
///
/// Every live value sits at a stable index for its whole lifetime. Indices
/// are handed out lowest-first. A freed index is quarantined and only
/// becomes allocatable again after [`SlotArena::recycle`], which the owner
/// calls once every reader has observed the release.
///
/// A reused slot never carries state over: [`SlotArena::allocate`] stores a
/// freshly constructed value.
///
/// # Example
///
/// ```rust
/// use meridian_core::SlotArena;
///
/// let mut arena: SlotArena<&str> = SlotArena::new(4);
/// let guard = arena.allocate("guard").unwrap();
/// arena.free(guard);
///
/// // Still quarantined.
/// assert_ne!(arena.allocate("rat"), Some(guard));
///
/// arena.recycle();
/// assert_eq!(arena.allocate("cow"), Some(guard));
/// ```
pub struct SlotArena<T> {
    /// The storage array.
    storage: Box<[Option<T>]>,
    /// Free list, kept in descending order so `pop` yields the lowest index.
    free_list: Vec<usize>,
    /// Indices released since the last recycle.
    quarantine: Vec<usize>,
    /// Number of live values.
    allocated_count: usize,
}

impl<T> SlotArena<T> {
    /// Creates a new arena with the specified capacity.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of simultaneously live values
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let storage: Vec<Option<T>> = (0..capacity).map(|_| None).collect();
        let free_list: Vec<usize> = (0..capacity).rev().collect();

        Self {
            storage: storage.into_boxed_slice(),
            free_list,
            quarantine: Vec::new(),
            allocated_count: 0,
        }
    }

    /// Returns the total capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Returns the number of live values.
    #[inline]
    #[must_use]
    pub const fn allocated_count(&self) -> usize {
        self.allocated_count
    }

    /// Returns the number of indices that can be allocated right now.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Returns the number of quarantined indices.
    #[inline]
    #[must_use]
    pub fn quarantined_count(&self) -> usize {
        self.quarantine.len()
    }

    /// Stores a value in the lowest free slot.
    ///
    /// # Returns
    ///
    /// The slot index, or None if every slot is live or quarantined.
    pub fn allocate(&mut self, value: T) -> Option<usize> {
        self.allocate_with(|_| value)
    }

    /// Stores a value built from its own slot index.
    ///
    /// `build` is only called if a slot is available.
    pub fn allocate_with(&mut self, build: impl FnOnce(usize) -> T) -> Option<usize> {
        let index = self.free_list.pop()?;
        self.storage[index] = Some(build(index));
        self.allocated_count += 1;
        Some(index)
    }

    /// Removes the value at `index` and quarantines the index.
    ///
    /// # Returns
    ///
    /// The removed value, or None if the slot was empty.
    pub fn free(&mut self, index: usize) -> Option<T> {
        let value = self.storage.get_mut(index)?.take()?;
        self.quarantine.push(index);
        self.allocated_count -= 1;
        Some(value)
    }

    /// Makes every quarantined index allocatable again.
    ///
    /// Returns the number of indices released from quarantine.
    pub fn recycle(&mut self) -> usize {
        let released = self.quarantine.len();
        if released > 0 {
            self.free_list.append(&mut self.quarantine);
            self.free_list.sort_unstable_by(|a, b| b.cmp(a));
        }
        released
    }

    /// Returns true if `index` holds a live value.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        matches!(self.storage.get(index), Some(Some(_)))
    }

    /// Gets a reference to a live value.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.storage.get(index)?.as_ref()
    }

    /// Gets a mutable reference to a live value.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.storage.get_mut(index)?.as_mut()
    }

    /// Returns the raw slots, in index order.
    ///
    /// Used to split the arena across worker threads.
    #[inline]
    pub fn slots_mut(&mut self) -> &mut [Option<T>] {
        &mut self.storage
    }

    /// Iterates over live values in increasing index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.storage
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|v| (index, v)))
    }

    /// Iterates mutably over live values in increasing index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.storage
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_mut().map(|v| (index, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_lowest_first() {
        let mut arena: SlotArena<u32> = SlotArena::new(4);
        assert_eq!(arena.allocate(10), Some(0));
        assert_eq!(arena.allocate(11), Some(1));
        assert_eq!(*arena.get(1).unwrap(), 11);
        assert_eq!(arena.allocated_count(), 2);
    }

    #[test]
    fn test_allocate_with_sees_index() {
        let mut arena: SlotArena<usize> = SlotArena::new(4);
        arena.allocate(0);
        let index = arena.allocate_with(|index| index * 10).unwrap();
        assert_eq!(index, 1);
        assert_eq!(arena.get(1), Some(&10));
    }

    #[test]
    fn test_full() {
        let mut arena: SlotArena<u8> = SlotArena::new(2);
        let _ = arena.allocate(1).unwrap();
        let _ = arena.allocate(2).unwrap();
        assert!(arena.allocate(3).is_none());
    }

    #[test]
    fn test_free_quarantines_until_recycle() {
        let mut arena: SlotArena<u32> = SlotArena::new(3);
        let a = arena.allocate(1).unwrap();
        let _b = arena.allocate(2).unwrap();

        assert_eq!(arena.free(a), Some(1));
        assert!(!arena.contains(a));
        assert_eq!(arena.quarantined_count(), 1);

        // Slot 0 is quarantined, so the next allocation lands on 2.
        assert_eq!(arena.allocate(3), Some(2));
        assert!(arena.allocate(4).is_none());

        assert_eq!(arena.recycle(), 1);
        assert_eq!(arena.allocate(5), Some(a));
        assert_eq!(*arena.get(a).unwrap(), 5);
    }

    #[test]
    fn test_recycle_keeps_lowest_first() {
        let mut arena: SlotArena<u32> = SlotArena::new(4);
        for i in 0..4 {
            arena.allocate(i).unwrap();
        }
        arena.free(3);
        arena.free(1);
        arena.recycle();

        assert_eq!(arena.allocate(9), Some(1));
        assert_eq!(arena.allocate(9), Some(3));
    }

    #[test]
    fn test_double_free_is_noop() {
        let mut arena: SlotArena<u32> = SlotArena::new(2);
        let a = arena.allocate(1).unwrap();
        assert!(arena.free(a).is_some());
        assert!(arena.free(a).is_none());
        assert!(arena.free(99).is_none());
        assert_eq!(arena.quarantined_count(), 1);
    }

    #[test]
    fn test_iter_in_index_order() {
        let mut arena: SlotArena<char> = SlotArena::new(4);
        arena.allocate('a');
        arena.allocate('b');
        arena.allocate('c');
        arena.free(1);

        let seen: Vec<_> = arena.iter().map(|(i, v)| (i, *v)).collect();
        assert_eq!(seen, vec![(0, 'a'), (2, 'c')]);
    }
}
