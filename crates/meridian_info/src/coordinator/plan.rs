//! View planning: which avatars each observer keeps, drops, and adds.

use meridian_shared::{ClientType, CoordGrid};

use crate::avatar::{AvatarRepository, Priority};
use crate::config::InfoConfig;
use crate::observer::{Observer, ObserverId};

/// Fate of an avatar the observer tracked after the previous tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TrackedAction {
    /// Still visible; send its movement.
    Stay,
    /// Gone, out of range, or hidden.
    Remove,
    /// Teleported but still visible; removed and added back.
    Readd,
}

/// Work item of one observer for the encode phase.
#[derive(Debug)]
pub(crate) struct ObserverJob {
    pub observer: ObserverId,
    pub client: ClientType,
    pub coord: CoordGrid,
    pub large_distance: bool,
    /// Every previously tracked avatar, ascending.
    pub tracked: Vec<(u16, TrackedAction)>,
    /// Avatars entering view, ascending. Includes re-adds.
    pub additions: Vec<u16>,

    pub packet: Vec<u8>,
    pub next_tracked: Vec<u16>,
    /// Avatars whose dirty blocks this observer did not receive.
    pub deferred: Vec<u16>,
    pub added: usize,
    pub removed: usize,
    pub violations: usize,
    pub cache_misses: usize,
    pub failed: bool,
}

impl ObserverJob {
    /// Avatars that needed something from this observer's packet.
    pub fn involved(&self) -> impl Iterator<Item = u16> + '_ {
        self.tracked
            .iter()
            .filter(|(_, action)| *action == TrackedAction::Stay)
            .map(|(index, _)| *index)
            .chain(self.additions.iter().copied())
    }
}

/// Plans one observer's view for the coming packet.
///
/// Visible avatars are admitted in increasing index order until the
/// tracking cap is reached. Low-priority avatars also count against their
/// own cap.
pub(crate) fn plan_observer(
    observer: &Observer,
    avatars: &AvatarRepository,
    config: &InfoConfig,
) -> ObserverJob {
    let mut tracked = Vec::with_capacity(observer.tracked().len());
    let mut additions = Vec::new();
    let mut kept = 0;
    let mut kept_low = 0;

    for &index in observer.tracked() {
        let action = match avatars.get(index) {
            Some(avatar) if observer.can_see(avatar.details()) => {
                kept += 1;
                if avatar.details().priority() == Priority::Low {
                    kept_low += 1;
                }
                if avatar.details().teleport().is_some() {
                    additions.push(index);
                    TrackedAction::Readd
                } else {
                    TrackedAction::Stay
                }
            }
            _ => TrackedAction::Remove,
        };
        tracked.push((index, action));
    }

    let mut admitted = kept;
    for (index, avatar) in avatars.iter() {
        if admitted >= config.max_tracked {
            break;
        }
        let details = avatar.details();
        if observer.is_tracking(index) || !observer.can_see(details) {
            continue;
        }
        if details.priority() == Priority::Low {
            if kept_low >= config.low_priority_cap {
                continue;
            }
            kept_low += 1;
        }
        additions.push(index);
        admitted += 1;
    }
    additions.sort_unstable();

    ObserverJob {
        observer: observer.id(),
        client: observer.client_type(),
        coord: observer.coord(),
        large_distance: observer.uses_large_deltas(config.small_view_radius),
        tracked,
        additions,
        packet: Vec::new(),
        next_tracked: Vec::new(),
        deferred: Vec::new(),
        added: 0,
        removed: 0,
        violations: 0,
        cache_misses: 0,
        failed: false,
    }
}
