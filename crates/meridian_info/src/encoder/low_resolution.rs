//! Low detail fragment: coordinates relative to the observer.
//!
//! ```text
//! index:16  ext:1  nojump:1  dz:W  spawn:1[+32]  type:14  dir:3  dx:W
//! ```
//!
//! `W` is 5 bits, or 8 for observers with an extended view distance.
//! Deltas are two's complement.

use meridian_core::BitBuf;
use meridian_shared::constants::{
    DIRECTION_BITS, INDEX_BITS, LARGE_DELTA_BITS, SMALL_DELTA_BITS, TYPE_ID_BITS,
};

use super::{check_delta, write_spawn_cycle, Detail, ResolutionChange, ResolutionChangeEncoder};
use crate::error::{Axis, InfoResult};

/// Revision 228 low detail layout.
#[derive(Clone, Copy, Debug, Default)]
pub struct LowResolutionChangeEncoder;

impl LowResolutionChangeEncoder {
    const fn delta_bits(large_distance: bool) -> u8 {
        if large_distance {
            LARGE_DELTA_BITS
        } else {
            SMALL_DELTA_BITS
        }
    }
}

impl ResolutionChangeEncoder for LowResolutionChangeEncoder {
    fn detail(&self) -> Detail {
        Detail::Low
    }

    fn check(&self, change: &ResolutionChange<'_>) -> InfoResult<()> {
        let bits = Self::delta_bits(change.large_distance);
        let (dx, dz) = change.details.coord().delta_from(change.observer);
        check_delta(Axis::X, dx, bits)?;
        check_delta(Axis::Z, dz, bits)
    }

    #[allow(clippy::cast_sign_loss)]
    fn encode(&self, change: &ResolutionChange<'_>, out: &mut BitBuf) -> InfoResult<()> {
        self.check(change)?;

        let details = change.details;
        let bits = Self::delta_bits(change.large_distance);
        let (dx, dz) = details.coord().delta_from(change.observer);

        out.write_bits(u32::from(details.index()), INDEX_BITS);
        out.write_bool(change.extended_info);
        out.write_bool(change.no_jump());
        out.write_bits(dz as u32, bits);
        write_spawn_cycle(out, details.spawn_cycle());
        out.write_bits(details.wire_type_id(), TYPE_ID_BITS);
        out.write_bits(u32::from(details.direction().id()), DIRECTION_BITS);
        out.write_bits(dx as u32, bits);
        Ok(())
    }
}
