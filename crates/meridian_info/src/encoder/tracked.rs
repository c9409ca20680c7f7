//! Per-tick update of an avatar the observer already tracks.
//!
//! ```text
//! 0                                no update
//! 1 00 ext:1                       extended info only
//! 1 01 dir:3 ext:1                 walk
//! 1 10 0 dir:3 ext:1               crawl
//! 1 10 1 dir:3 dir:3 ext:1         run
//! 1 11                             remove
//! ```

use meridian_core::BitBuf;
use meridian_shared::constants::{
    DIRECTION_BITS, OPCODE_CRAWL_OR_RUN, OPCODE_EXTENDED_INFO, OPCODE_REMOVE, OPCODE_WALK,
    UPDATE_OPCODE_BITS,
};
use meridian_shared::{Direction, MovementFlags};

use crate::avatar::AvatarDetails;

/// What a tracked avatar did this tick, from the observer's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackedUpdate {
    /// Nothing to send.
    Idle,
    /// Only extended info changed.
    ExtendedInfo,
    /// One walk step.
    Walk {
        /// Step direction.
        direction: Direction,
        /// Extended info follows.
        extended_info: bool,
    },
    /// One crawl step.
    Crawl {
        /// Step direction.
        direction: Direction,
        /// Extended info follows.
        extended_info: bool,
    },
    /// Two steps.
    Run {
        /// First step direction.
        first: Direction,
        /// Second step direction.
        second: Direction,
        /// Extended info follows.
        extended_info: bool,
    },
    /// Drop the avatar from the tracked list.
    Remove,
}

impl TrackedUpdate {
    /// Derives the update from classified movement.
    ///
    /// Teleports remove the avatar; the coordinator adds it back with a
    /// fresh fragment if it is still in view.
    #[must_use]
    pub fn from_movement(details: &AvatarDetails, extended_info: bool) -> Self {
        let movement = details.movement();
        if movement.is_teleporting() {
            return Self::Remove;
        }

        let first = details.first_step().unwrap_or_default();
        match movement.dominant() {
            MovementFlags::RUN => Self::Run {
                first,
                second: details.second_step().unwrap_or_default(),
                extended_info,
            },
            MovementFlags::WALK => Self::Walk {
                direction: first,
                extended_info,
            },
            MovementFlags::CRAWL => Self::Crawl {
                direction: first,
                extended_info,
            },
            _ if extended_info => Self::ExtendedInfo,
            _ => Self::Idle,
        }
    }

    /// Returns true if an extended info mask follows for this avatar.
    #[must_use]
    pub const fn carries_extended_info(self) -> bool {
        match self {
            Self::ExtendedInfo => true,
            Self::Walk { extended_info, .. }
            | Self::Crawl { extended_info, .. }
            | Self::Run { extended_info, .. } => extended_info,
            Self::Idle | Self::Remove => false,
        }
    }

    /// Writes the update.
    pub fn write(self, out: &mut BitBuf) {
        if self == Self::Idle {
            out.write_bool(false);
            return;
        }
        out.write_bool(true);

        match self {
            Self::Idle => {}
            Self::ExtendedInfo => {
                out.write_bits(OPCODE_EXTENDED_INFO, UPDATE_OPCODE_BITS);
                out.write_bool(true);
            }
            Self::Walk {
                direction,
                extended_info,
            } => {
                out.write_bits(OPCODE_WALK, UPDATE_OPCODE_BITS);
                out.write_bits(u32::from(direction.id()), DIRECTION_BITS);
                out.write_bool(extended_info);
            }
            Self::Crawl {
                direction,
                extended_info,
            } => {
                out.write_bits(OPCODE_CRAWL_OR_RUN, UPDATE_OPCODE_BITS);
                out.write_bool(false);
                out.write_bits(u32::from(direction.id()), DIRECTION_BITS);
                out.write_bool(extended_info);
            }
            Self::Run {
                first,
                second,
                extended_info,
            } => {
                out.write_bits(OPCODE_CRAWL_OR_RUN, UPDATE_OPCODE_BITS);
                out.write_bool(true);
                out.write_bits(u32::from(first.id()), DIRECTION_BITS);
                out.write_bits(u32::from(second.id()), DIRECTION_BITS);
                out.write_bool(extended_info);
            }
            Self::Remove => out.write_bits(OPCODE_REMOVE, UPDATE_OPCODE_BITS),
        }
    }
}
