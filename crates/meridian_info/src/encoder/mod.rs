//! # Resolution Change Encoders
//!
//! Bit-level encoding of the avatar info packet.
//!
//! A *resolution change* moves an avatar from the observer's low
//! resolution pool (known to exist, not rendered) into its high
//! resolution list (tracked and rendered). The fragment written at that
//! moment carries everything the client needs to draw the avatar.
//!
//! ## Packet Bit Section
//!
//! ```text
//! ┌─────────┬──────────────────────────┬─────────────────────────┬────────────┐
//! │ count:8 │ tracked updates          │ additions               │ terminator │
//! │         │ (1 per tracked avatar)   │ detail:1 + fragment     │ 0 + 0xFFFF │
//! └─────────┴──────────────────────────┴─────────────────────────┴────────────┘
//! ```
//!
//! The extended info section follows, byte aligned.

mod high_resolution;
mod low_resolution;
mod tracked;

pub use high_resolution::HighResolutionChangeEncoder;
pub use low_resolution::LowResolutionChangeEncoder;
pub use tracked::TrackedUpdate;

use meridian_core::BitBuf;
use meridian_shared::CoordGrid;

use crate::avatar::AvatarDetails;
use crate::error::{Axis, InfoError, InfoResult};

/// Which fragment layout an addition uses. Written as one bit before the
/// fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Detail {
    /// Coordinates relative to the observer.
    Low,
    /// Absolute coordinates.
    High,
}

impl Detail {
    /// The detail bit.
    #[must_use]
    pub const fn bit(self) -> bool {
        matches!(self, Self::High)
    }
}

/// Inputs of one resolution change fragment.
#[derive(Clone, Copy, Debug)]
pub struct ResolutionChange<'a> {
    /// The avatar entering view.
    pub details: &'a AvatarDetails,
    /// The observer's point of view.
    pub observer: CoordGrid,
    /// Whether an extended info mask follows for this avatar.
    pub extended_info: bool,
    /// Whether the observer uses 8-bit deltas.
    pub large_distance: bool,
    /// The tick being encoded.
    pub cycle: u32,
}

impl ResolutionChange<'_> {
    /// The no-jump bit: set when the avatar teleported this tick without a
    /// jump and was not allocated this tick.
    #[must_use]
    pub const fn no_jump(&self) -> bool {
        self.details.movement().is_tele_without_jump()
            && self.details.allocate_cycle() != self.cycle
    }
}

/// Writes the fragment that adds an avatar to an observer's view.
///
/// Implementations validate every field before writing: a rejected
/// fragment leaves `out` untouched.
pub trait ResolutionChangeEncoder: Send + Sync {
    /// The layout this encoder writes.
    fn detail(&self) -> Detail;

    /// Checks that every field fits its width.
    ///
    /// # Errors
    ///
    /// Returns the first field that does not fit.
    fn check(&self, change: &ResolutionChange<'_>) -> InfoResult<()>;

    /// Writes the fragment.
    ///
    /// # Errors
    ///
    /// As [`ResolutionChangeEncoder::check`]; nothing is written on error.
    fn encode(&self, change: &ResolutionChange<'_>, out: &mut BitBuf) -> InfoResult<()>;
}

/// Rejects deltas outside the signed range of `bits`.
pub(crate) fn check_delta(axis: Axis, delta: i32, bits: u8) -> InfoResult<()> {
    let limit = 1i32 << (bits - 1);
    if delta < -limit || delta >= limit {
        return Err(InfoError::DeltaOutOfRange { axis, delta, bits });
    }
    Ok(())
}

/// Writes the optional spawn cycle: a presence bit, then 32 bits if set.
pub(crate) fn write_spawn_cycle(out: &mut BitBuf, spawn_cycle: u32) {
    out.write_bool(spawn_cycle != 0);
    if spawn_cycle != 0 {
        out.write_bits(spawn_cycle, meridian_shared::constants::SPAWN_CYCLE_BITS);
    }
}
