//! Encodes one observer's packet from its plan.

use meridian_core::{BitBuf, BufferPool, ByteBuf};
use meridian_shared::constants::{ADDITIONS_TERMINATOR, INDEX_BITS, TRACKED_COUNT_BITS};

use super::plan::{ObserverJob, TrackedAction};
use crate::avatar::{Avatar, AvatarRepository};
use crate::encoder::{ResolutionChange, ResolutionChangeEncoder, TrackedUpdate};
use crate::error::InfoError;
use crate::extended_info::BlockMask;

/// Shared, read-only inputs of the encode phase.
pub(crate) struct EncodeContext<'a> {
    pub avatars: &'a AvatarRepository,
    pub low_resolution: &'a dyn ResolutionChangeEncoder,
    pub high_resolution: &'a dyn ResolutionChangeEncoder,
    pub pool: &'a BufferPool,
    pub cycle: u32,
    pub high_detail_radius: u32,
    pub extended_info_budget: usize,
}

/// Outcome of asking for room for an avatar's extended info.
enum Admission {
    /// Nothing to send.
    Empty,
    /// Fits; the mask follows the bit section.
    Admitted(BlockMask),
    /// Over the packet budget.
    OverBudget,
    /// A block was not precomputed for this client.
    Missing,
}

impl ObserverJob {
    fn admit(
        &mut self,
        index: u16,
        avatar: &Avatar,
        mask: BlockMask,
        remaining: &mut usize,
    ) -> Admission {
        if mask.is_empty() {
            return Admission::Empty;
        }
        match avatar.extended_info().encoded_len(mask, self.client) {
            Ok(len) if len <= *remaining => {
                *remaining -= len;
                Admission::Admitted(mask)
            }
            Ok(_) => Admission::OverBudget,
            Err(error) => {
                tracing::error!("Observer {} skipped avatar {}: {}", self.observer, index, error);
                self.cache_misses += 1;
                Admission::Missing
            }
        }
    }

    fn fail(&mut self, pool: &BufferPool, error: &InfoError) {
        tracing::error!("Observer {} packet abandoned: {}", self.observer, error);
        self.failed = true;
        pool.release(std::mem::take(&mut self.packet));
        self.next_tracked.clear();
    }
}

/// Writes the bit section, then the extended info section.
pub(crate) fn encode_observer(job: &mut ObserverJob, ctx: &EncodeContext<'_>) {
    let capacity = 8 + job.tracked.len() + job.additions.len() * 10;
    let mut bits = BitBuf::from_vec(ctx.pool.acquire(capacity));
    let mut flagged: Vec<(u16, BlockMask)> = Vec::new();
    let mut remaining = ctx.extended_info_budget;

    // Bounded by the tracking cap, which never exceeds the field.
    #[allow(clippy::cast_possible_truncation)]
    bits.write_bits(job.tracked.len() as u32, TRACKED_COUNT_BITS);

    let tracked = std::mem::take(&mut job.tracked);
    for &(index, action) in &tracked {
        let avatar = match (action, ctx.avatars.get(index)) {
            (TrackedAction::Stay, Some(avatar)) => avatar,
            (action, _) => {
                TrackedUpdate::Remove.write(&mut bits);
                if action != TrackedAction::Readd {
                    job.removed += 1;
                }
                continue;
            }
        };

        let mask = avatar.extended_info().dirty_mask();
        let extended_info = match job.admit(index, avatar, mask, &mut remaining) {
            Admission::Admitted(mask) => {
                flagged.push((index, mask));
                true
            }
            Admission::Empty => false,
            Admission::OverBudget | Admission::Missing => {
                job.deferred.push(index);
                false
            }
        };

        TrackedUpdate::from_movement(avatar.details(), extended_info).write(&mut bits);
        job.next_tracked.push(index);
    }
    job.tracked = tracked;

    let additions = std::mem::take(&mut job.additions);
    for &index in &additions {
        let Some(avatar) = ctx.avatars.get(index) else {
            continue;
        };
        let details = avatar.details();
        let dirty = avatar.extended_info().dirty_mask();

        let encoder = if ctx.high_detail_radius > 0
            && job.coord.in_distance(details.coord(), ctx.high_detail_radius)
        {
            ctx.high_resolution
        } else {
            ctx.low_resolution
        };
        let mut change = ResolutionChange {
            details,
            observer: job.coord,
            extended_info: false,
            large_distance: job.large_distance,
            cycle: ctx.cycle,
        };

        // Not tracked yet: delivery does not wait for this observer.
        if let Err(error) = encoder.check(&change) {
            tracing::warn!("Observer {} cannot add avatar {}: {}", job.observer, index, error);
            job.violations += 1;
            continue;
        }

        let mask = dirty | avatar.extended_info().persistent_mask();
        match job.admit(index, avatar, mask, &mut remaining) {
            Admission::Admitted(mask) => {
                flagged.push((index, mask));
                change.extended_info = true;
            }
            Admission::Empty => {}
            // Added on a later tick, with its full state.
            Admission::OverBudget => continue,
            Admission::Missing => {
                job.deferred.push(index);
                continue;
            }
        }

        bits.write_bool(encoder.detail().bit());
        if let Err(error) = encoder.encode(&change, &mut bits) {
            job.additions = additions;
            job.packet = bits.into_bytes();
            job.fail(ctx.pool, &error);
            return;
        }
        job.next_tracked.push(index);
        job.added += 1;
    }
    job.additions = additions;

    bits.write_bool(false);
    bits.write_bits(ADDITIONS_TERMINATOR, INDEX_BITS);

    let mut out = ByteBuf::wrap(bits.into_bytes());
    for (index, mask) in flagged {
        let written = ctx
            .avatars
            .get(index)
            .ok_or(InfoError::UnknownAvatar(usize::from(index)))
            .and_then(|avatar| avatar.extended_info().write(mask, job.client, &mut out));
        if let Err(error) = written {
            job.packet = out.into_bytes();
            job.fail(ctx.pool, &error);
            return;
        }
    }

    job.next_tracked.sort_unstable();
    job.packet = out.into_bytes();
}
