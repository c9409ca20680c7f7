//! # Avatar Repository
//!
//! Owns every live avatar in a [`SlotArena`], indexed by the same 16-bit
//! index the client sees.
//!
//! ## Index Lifecycle
//!
//! ```text
//! allocate ──► live ──release──► quarantined ──end of tick──► free
//!                                     │
//!                                     └─ observers write "remove" this tick
//! ```
//!
//! An index released during a tick is not reissued before the tick that
//! tells every observer about the removal has finished.

use meridian_core::SlotArena;
use meridian_shared::constants::MAX_AVATAR_INDEX;
use meridian_shared::ClientTypeSet;

use super::details::{AvatarDetails, AvatarSpawn};
use crate::error::{InfoError, InfoResult};
use crate::extended_info::AvatarExtendedInfo;

/// Per-tick bookkeeping filled in by the coordinator.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct TickScratch {
    /// Client types of observers that see this avatar this tick.
    pub clients: ClientTypeSet,
    /// Client types of observers that start tracking it this tick.
    pub entering: ClientTypeSet,
    /// Encoder invocations made for this avatar this tick.
    pub precompute_runs: u64,
}

/// One live avatar.
#[derive(Debug)]
pub struct Avatar {
    pub(crate) details: AvatarDetails,
    pub(crate) extended_info: AvatarExtendedInfo,
    pub(crate) scratch: TickScratch,
}

impl Avatar {
    fn new(index: u16, spawn: &AvatarSpawn, cycle: u32) -> Self {
        Self {
            details: AvatarDetails::new(index, spawn, cycle),
            extended_info: AvatarExtendedInfo::new(index),
            scratch: TickScratch::default(),
        }
    }

    /// Movement and identity state.
    #[inline]
    #[must_use]
    pub const fn details(&self) -> &AvatarDetails {
        &self.details
    }

    /// Extended info blocks.
    #[inline]
    #[must_use]
    pub const fn extended_info(&self) -> &AvatarExtendedInfo {
        &self.extended_info
    }
}

/// Storage for every avatar, addressed by index.
pub struct AvatarRepository {
    arena: SlotArena<Avatar>,
    cycle: u32,
}

impl AvatarRepository {
    /// Creates a repository with `capacity` slots.
    ///
    /// Capacity is limited to the indices the wire format can carry.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            arena: SlotArena::new(capacity.min(MAX_AVATAR_INDEX + 1)),
            cycle: 0,
        }
    }

    /// The tick that will run next. Allocations are stamped with it.
    #[must_use]
    pub const fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Number of live avatars.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.arena.allocated_count()
    }

    /// Returns true if no avatar is live.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slot count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Allocates the lowest free index to a fresh avatar.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::AvatarCapacityExhausted`] when every index is
    /// live or still quarantined.
    pub fn allocate(&mut self, spawn: AvatarSpawn) -> InfoResult<u16> {
        let cycle = self.cycle;
        let index = self
            .arena
            .allocate_with(|index| {
                // Capacity is clamped in `new`, so every slot fits the field.
                #[allow(clippy::cast_possible_truncation)]
                let index = index as u16;
                Avatar::new(index, &spawn, cycle)
            })
            .ok_or(InfoError::AvatarCapacityExhausted(self.arena.capacity()))?;

        tracing::trace!("Allocated avatar {} (type {})", index, spawn.type_id);
        u16::try_from(index).map_err(|_| InfoError::IndexOutOfRange(index))
    }

    /// Releases an avatar. Its index stays reserved until the end of the
    /// next tick.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::UnknownAvatar`] if the index is not live.
    pub fn release(&mut self, index: u16) -> InfoResult<()> {
        let index = usize::from(index);
        if self.arena.free(index).is_none() {
            return Err(InfoError::UnknownAvatar(index));
        }
        tracing::trace!("Released avatar {}", index);
        Ok(())
    }

    /// Returns the avatar at `index`.
    #[inline]
    #[must_use]
    pub fn get(&self, index: u16) -> Option<&Avatar> {
        self.arena.get(usize::from(index))
    }

    /// Movement state of the avatar at `index`, for the game logic setters.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::UnknownAvatar`] if the index is not live.
    pub fn details_mut(&mut self, index: u16) -> InfoResult<&mut AvatarDetails> {
        self.live_mut(index).map(|avatar| &mut avatar.details)
    }

    /// Extended info of the avatar at `index`, for the game logic setters.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::UnknownAvatar`] if the index is not live.
    pub fn extended_info_mut(&mut self, index: u16) -> InfoResult<&mut AvatarExtendedInfo> {
        self.live_mut(index).map(|avatar| &mut avatar.extended_info)
    }

    /// Hides or reveals an avatar for every observer.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::UnknownAvatar`] if the index is not live.
    pub fn set_inaccessible(&mut self, index: u16, inaccessible: bool) -> InfoResult<()> {
        self.details_mut(index)
            .map(|details| details.set_inaccessible(inaccessible))
    }

    /// Iterates over live avatars in increasing index order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Avatar)> {
        self.arena.iter().map(|(_, avatar)| (avatar.details.index(), avatar))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Avatar> {
        self.arena.iter_mut().map(|(_, avatar)| avatar)
    }

    pub(crate) fn get_mut(&mut self, index: u16) -> Option<&mut Avatar> {
        self.arena.get_mut(usize::from(index))
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Option<Avatar>] {
        self.arena.slots_mut()
    }

    /// Frees quarantined indices and moves on to the next cycle.
    pub(crate) fn end_tick(&mut self, recycle: bool) -> usize {
        self.cycle = self.cycle.wrapping_add(1);
        if recycle {
            self.arena.recycle()
        } else {
            0
        }
    }

    fn live_mut(&mut self, index: u16) -> InfoResult<&mut Avatar> {
        self.arena
            .get_mut(usize::from(index))
            .ok_or(InfoError::UnknownAvatar(usize::from(index)))
    }
}

impl std::fmt::Debug for AvatarRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvatarRepository")
            .field("live", &self.len())
            .field("capacity", &self.capacity())
            .field("cycle", &self.cycle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_shared::{CoordGrid, Direction};

    fn spawn() -> AvatarSpawn {
        AvatarSpawn::new(1, CoordGrid::new(0, 3200, 3200))
    }

    #[test]
    fn test_allocate_lowest_index() {
        let mut repo = AvatarRepository::new(8);
        assert_eq!(repo.allocate(spawn()).unwrap(), 0);
        assert_eq!(repo.allocate(spawn()).unwrap(), 1);
        assert_eq!(repo.len(), 2);
        assert_eq!(repo.get(1).unwrap().details().index(), 1);
    }

    #[test]
    fn test_capacity_exhausted() {
        let mut repo = AvatarRepository::new(1);
        repo.allocate(spawn()).unwrap();
        assert!(matches!(
            repo.allocate(spawn()),
            Err(InfoError::AvatarCapacityExhausted(1))
        ));
    }

    #[test]
    fn test_release_quarantines_until_end_of_tick() {
        let mut repo = AvatarRepository::new(2);
        let a = repo.allocate(spawn()).unwrap();
        repo.release(a).unwrap();

        assert_eq!(repo.allocate(spawn()).unwrap(), 1);
        assert!(repo.allocate(spawn()).is_err());

        assert_eq!(repo.end_tick(true), 1);
        assert_eq!(repo.allocate(spawn()).unwrap(), a);
    }

    #[test]
    fn test_reused_slot_is_fresh() {
        let mut repo = AvatarRepository::new(1);
        let a = repo.allocate(spawn()).unwrap();
        repo.details_mut(a).unwrap().walk(Direction::North);
        repo.extended_info_mut(a).unwrap().set_sequence(1, 0);
        repo.set_inaccessible(a, true).unwrap();
        repo.release(a).unwrap();
        repo.end_tick(true);

        let b = repo.allocate(spawn()).unwrap();
        assert_eq!(a, b);
        let avatar = repo.get(b).unwrap();
        assert!(!avatar.details().has_moved());
        assert!(!avatar.details().is_inaccessible());
        assert!(avatar.extended_info().dirty_mask().is_empty());
        assert_eq!(avatar.details().allocate_cycle(), 1);
    }

    #[test]
    fn test_unknown_avatar() {
        let mut repo = AvatarRepository::new(4);
        assert!(matches!(repo.release(3), Err(InfoError::UnknownAvatar(3))));
        assert!(matches!(repo.details_mut(0), Err(InfoError::UnknownAvatar(0))));
    }

    #[test]
    fn test_capacity_clamped_to_index_field() {
        let repo = AvatarRepository::new(1 << 20);
        assert_eq!(repo.capacity(), MAX_AVATAR_INDEX + 1);
    }
}
