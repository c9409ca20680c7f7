//! # Movement Flags
//!
//! The single home of the movement type bits. Every avatar kind shares
//! these values, so they live here instead of next to any one avatar type.
//!
//! ## Priority
//!
//! ```text
//! TELEJUMP > TELE > RUN > WALK | CRAWL
//! ```

use std::ops::{BitOr, BitOrAssign};

/// Bitset of the movement types an avatar used during one tick.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MovementFlags(u8);

impl MovementFlags {
    /// No movement this tick.
    pub const EMPTY: Self = Self(0);

    /// The avatar crawled one step.
    pub const CRAWL: Self = Self(0x1);

    /// The avatar walked one step.
    pub const WALK: Self = Self(0x2);

    /// The avatar took two steps (two walks, two crawls, or one of each).
    pub const RUN: Self = Self(0x4);

    /// The avatar teleported.
    pub const TELE: Self = Self(0x8);

    /// The teleport is rendered as a jump regardless of distance.
    pub const TELEJUMP: Self = Self(0x10);

    /// Creates flags from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x1F)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if no flag is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if any bit of `other` is set.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Sets the bits of `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Jumping to the destination, however close it is.
    #[must_use]
    pub const fn is_jumping(self) -> bool {
        self.contains(Self::TELEJUMP)
    }

    /// Teleporting with the client allowed to interpolate.
    #[must_use]
    pub const fn is_tele_without_jump(self) -> bool {
        self.contains(Self::TELE) && !self.contains(Self::TELEJUMP)
    }

    /// Teleporting in either form.
    #[must_use]
    pub const fn is_teleporting(self) -> bool {
        self.intersects(Self(Self::TELE.0 | Self::TELEJUMP.0))
    }

    /// The highest priority flag that is set, if any.
    #[must_use]
    pub const fn dominant(self) -> Self {
        if self.contains(Self::TELEJUMP) {
            Self::TELEJUMP
        } else if self.contains(Self::TELE) {
            Self::TELE
        } else if self.contains(Self::RUN) {
            Self::RUN
        } else if self.contains(Self::WALK) {
            Self::WALK
        } else if self.contains(Self::CRAWL) {
            Self::CRAWL
        } else {
            Self::EMPTY
        }
    }
}

impl BitOr for MovementFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for MovementFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_values() {
        assert_eq!(MovementFlags::CRAWL.bits(), 0x1);
        assert_eq!(MovementFlags::WALK.bits(), 0x2);
        assert_eq!(MovementFlags::RUN.bits(), 0x4);
        assert_eq!(MovementFlags::TELE.bits(), 0x8);
        assert_eq!(MovementFlags::TELEJUMP.bits(), 0x10);
    }

    #[test]
    fn test_dominance() {
        let flags = MovementFlags::WALK | MovementFlags::TELE | MovementFlags::TELEJUMP;
        assert_eq!(flags.dominant(), MovementFlags::TELEJUMP);
        assert_eq!((MovementFlags::RUN | MovementFlags::TELE).dominant(), MovementFlags::TELE);
        assert_eq!((MovementFlags::WALK | MovementFlags::RUN).dominant(), MovementFlags::RUN);
        assert_eq!(MovementFlags::EMPTY.dominant(), MovementFlags::EMPTY);
    }

    #[test]
    fn test_teleport_queries() {
        let tele = MovementFlags::TELE;
        assert!(tele.is_tele_without_jump());
        assert!(tele.is_teleporting());
        assert!(!tele.is_jumping());

        let jump = MovementFlags::TELE | MovementFlags::TELEJUMP;
        assert!(!jump.is_tele_without_jump());
        assert!(jump.is_jumping());
        assert!(jump.is_teleporting());

        assert!(!MovementFlags::RUN.is_teleporting());
    }
}
