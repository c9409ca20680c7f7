//! High detail fragment: absolute coordinates.
//!
//! ```text
//! index:16  ext:1  nojump:1  level:2 z:14  spawn:1[+32]  type:14  dir:3  x:14
//! ```
//!
//! Used for avatars close enough to the observer that the client wants an
//! exact position regardless of view distance.

use meridian_core::BitBuf;
use meridian_shared::constants::{
    COORD_AXIS_BITS, DIRECTION_BITS, INDEX_BITS, LEVEL_BITS, TYPE_ID_BITS,
};

use super::{write_spawn_cycle, Detail, ResolutionChange, ResolutionChangeEncoder};
use crate::error::InfoResult;

/// Revision 228 high detail layout.
#[derive(Clone, Copy, Debug, Default)]
pub struct HighResolutionChangeEncoder;

impl ResolutionChangeEncoder for HighResolutionChangeEncoder {
    fn detail(&self) -> Detail {
        Detail::High
    }

    fn check(&self, _change: &ResolutionChange<'_>) -> InfoResult<()> {
        // Every field is masked to its full range by construction.
        Ok(())
    }

    fn encode(&self, change: &ResolutionChange<'_>, out: &mut BitBuf) -> InfoResult<()> {
        let details = change.details;
        let coord = details.coord();

        out.write_bits(u32::from(details.index()), INDEX_BITS);
        out.write_bool(change.extended_info);
        out.write_bool(change.no_jump());
        out.write_bits(coord.level(), LEVEL_BITS);
        out.write_bits(coord.z(), COORD_AXIS_BITS);
        write_spawn_cycle(out, details.spawn_cycle());
        out.write_bits(details.wire_type_id(), TYPE_ID_BITS);
        out.write_bits(u32::from(details.direction().id()), DIRECTION_BITS);
        out.write_bits(coord.x(), COORD_AXIS_BITS);
        Ok(())
    }
}
