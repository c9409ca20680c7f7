//! # Observers
//!
//! A connected client that receives one avatar info packet per tick.
//!
//! ## Visibility
//!
//! An avatar is visible to an observer when all of these hold:
//!
//! ```text
//! accessible  &&  same level  &&  chebyshev distance <= view distance
//!             &&  (public  ||  explicitly allowed by this observer)
//!             &&  not the observer's own avatar
//! ```

use std::collections::BTreeSet;

use meridian_shared::constants::{DEFAULT_VIEW_DISTANCE, MAX_VIEW_DISTANCE};
use meridian_shared::{ClientType, CoordGrid};

use crate::avatar::{AvatarDetails, Visibility};

/// Stable handle of a registered observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u32);

impl ObserverId {
    /// Creates an id from a raw slot number.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw slot number.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    pub(crate) const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A client receiving avatar info.
#[derive(Debug)]
pub struct Observer {
    id: ObserverId,
    client: ClientType,
    coord: CoordGrid,
    view_distance: u32,
    local_avatar: Option<u16>,
    allowed: BTreeSet<u16>,
    /// Indices tracked at the end of the previous tick, ascending.
    tracked: Vec<u16>,
}

impl Observer {
    pub(crate) fn new(id: ObserverId, client: ClientType, coord: CoordGrid) -> Self {
        Self {
            id,
            client,
            coord,
            view_distance: DEFAULT_VIEW_DISTANCE,
            local_avatar: None,
            allowed: BTreeSet::new(),
            tracked: Vec::new(),
        }
    }

    /// The observer's handle.
    #[must_use]
    pub const fn id(&self) -> ObserverId {
        self.id
    }

    /// Client type declared at registration.
    #[must_use]
    pub const fn client_type(&self) -> ClientType {
        self.client
    }

    /// Point of view.
    #[must_use]
    pub const fn coord(&self) -> CoordGrid {
        self.coord
    }

    /// Moves the point of view.
    pub fn set_coord(&mut self, coord: CoordGrid) {
        self.coord = coord;
    }

    /// View distance in tiles.
    #[must_use]
    pub const fn view_distance(&self) -> u32 {
        self.view_distance
    }

    /// Changes the view distance. Takes effect on the next tick.
    ///
    /// Clamped to [`MAX_VIEW_DISTANCE`] so every visible avatar fits the
    /// 8-bit delta fields.
    pub fn set_view_distance(&mut self, view_distance: u32) {
        self.view_distance = view_distance.min(MAX_VIEW_DISTANCE);
    }

    /// Avatar controlled by this observer, never listed to it.
    #[must_use]
    pub const fn local_avatar(&self) -> Option<u16> {
        self.local_avatar
    }

    /// Sets the avatar controlled by this observer.
    pub fn set_local_avatar(&mut self, index: Option<u16>) {
        self.local_avatar = index;
    }

    /// Lets this observer see a [`Visibility::Specific`] avatar.
    pub fn allow(&mut self, index: u16) {
        self.allowed.insert(index);
    }

    /// Withdraws a previous [`Observer::allow`].
    pub fn revoke(&mut self, index: u16) {
        self.allowed.remove(&index);
    }

    /// Avatars tracked after the last tick, ascending.
    #[must_use]
    pub fn tracked(&self) -> &[u16] {
        &self.tracked
    }

    /// Returns true if the avatar was tracked after the last tick.
    #[must_use]
    pub fn is_tracking(&self, index: u16) -> bool {
        self.tracked.binary_search(&index).is_ok()
    }

    /// Additions use 8-bit deltas when the view extends past
    /// `small_view_radius`.
    #[must_use]
    pub const fn uses_large_deltas(&self, small_view_radius: u32) -> bool {
        self.view_distance > small_view_radius
    }

    pub(crate) fn can_see(&self, details: &AvatarDetails) -> bool {
        if details.is_inaccessible() || self.local_avatar == Some(details.index()) {
            return false;
        }
        if !self.coord.in_distance(details.coord(), self.view_distance) {
            return false;
        }
        match details.visibility() {
            Visibility::Public => true,
            Visibility::Specific => self.allowed.contains(&details.index()),
        }
    }

    pub(crate) fn commit_tracked(&mut self, tracked: Vec<u16>) {
        debug_assert!(tracked.windows(2).all(|w| w[0] < w[1]), "tracked must ascend");
        self.tracked = tracked;
    }
}
