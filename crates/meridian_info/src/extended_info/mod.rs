//! # Extended Info
//!
//! Optional per-avatar payloads that ride after the bit section of a
//! packet: animation sequences, colour tints, name changes and move speed.
//!
//! ## Precompute Once, Copy Many
//!
//! ```text
//!                     ┌───────────────┐
//!   setter ──dirty──► │ ExtendedInfo  │
//!                     │    Block      │── precompute(desktop) ──► [bytes] ─┐
//!                     └───────────────┘── precompute(android) ──► [bytes] ─┤
//!                                                                          │
//!   observer 1 (desktop) ◄── copy ────────────────────────────────────────┤
//!   observer 2 (desktop) ◄── copy ────────────────────────────────────────┤
//!   observer 3 (android) ◄── copy ────────────────────────────────────────┘
//! ```
//!
//! A block is encoded at most once per client type per tick, no matter how
//! many observers see it. All buffers are dropped when the tick ends.
//!
//! ## Transient vs Persistent
//!
//! Transient blocks (sequence, tinting, name change) are events: they are
//! sent to the observers that see the avatar on the tick they happen, then
//! reset. Persistent blocks (move speed) are state: they keep their value
//! and are re-sent to every observer that starts tracking the avatar.

mod blocks;
mod cache;
mod encoders;
mod set;

pub use blocks::{BlockPayload, ExtendedInfoBlock, MoveSpeed, NameChange, Sequence, Tinting};
pub use cache::PrecomputedBuffer;
pub use encoders::{
    BlockEncoder, DesktopBlockEncoder, ExtendedInfoEncoders, PlainTextCodec, TextCodec,
};
pub use set::AvatarExtendedInfo;

use std::ops::{BitOr, BitOrAssign};

/// The block kinds, in mask bit order.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtendedInfoKind {
    /// Persistent movement speed.
    MoveSpeed = 0,
    /// Animation sequence.
    Sequence = 1,
    /// Colour tint over a cycle range.
    Tinting = 2,
    /// Display name change.
    NameChange = 3,
}

impl ExtendedInfoKind {
    /// Number of block kinds.
    pub const COUNT: usize = 4;

    /// All kinds in the order they are written.
    pub const ALL: [Self; Self::COUNT] = [
        Self::MoveSpeed,
        Self::Sequence,
        Self::Tinting,
        Self::NameChange,
    ];

    /// Bit of this kind in the mask byte.
    #[inline]
    #[must_use]
    pub const fn flag(self) -> u8 {
        1 << self as u8
    }

    /// Dense id for array lookups.
    #[inline]
    #[must_use]
    pub const fn id(self) -> usize {
        self as usize
    }

    /// Persistent blocks keep their value across ticks and are re-sent to
    /// every new observer.
    #[must_use]
    pub const fn is_persistent(self) -> bool {
        matches!(self, Self::MoveSpeed)
    }
}

/// A set of block kinds, written as the mask byte of a flagged avatar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockMask(u8);

impl BlockMask {
    /// No blocks.
    pub const EMPTY: Self = Self(0);

    /// Creates a mask from raw bits. Unknown bits are dropped.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x0F)
    }

    /// The mask byte.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if no kind is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if `kind` is set.
    #[must_use]
    pub const fn contains(self, kind: ExtendedInfoKind) -> bool {
        self.0 & kind.flag() != 0
    }

    /// Adds a kind.
    pub fn insert(&mut self, kind: ExtendedInfoKind) {
        self.0 |= kind.flag();
    }

    /// Iterates over the set kinds in ascending bit order.
    pub fn iter(self) -> impl Iterator<Item = ExtendedInfoKind> {
        ExtendedInfoKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl BitOr for BlockMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for BlockMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<ExtendedInfoKind> for BlockMask {
    fn from(kind: ExtendedInfoKind) -> Self {
        Self(kind.flag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        assert_eq!(ExtendedInfoKind::MoveSpeed.flag(), 0x01);
        assert_eq!(ExtendedInfoKind::Sequence.flag(), 0x02);
        assert_eq!(ExtendedInfoKind::Tinting.flag(), 0x04);
        assert_eq!(ExtendedInfoKind::NameChange.flag(), 0x08);
    }

    #[test]
    fn test_mask_order() {
        let mut mask = BlockMask::from(ExtendedInfoKind::NameChange);
        mask.insert(ExtendedInfoKind::MoveSpeed);
        assert_eq!(mask.bits(), 0x09);
        assert_eq!(
            mask.iter().collect::<Vec<_>>(),
            vec![ExtendedInfoKind::MoveSpeed, ExtendedInfoKind::NameChange]
        );
    }

    #[test]
    fn test_persistence() {
        assert!(ExtendedInfoKind::MoveSpeed.is_persistent());
        assert!(!ExtendedInfoKind::Sequence.is_persistent());
        assert!(!ExtendedInfoKind::NameChange.is_persistent());
    }
}
