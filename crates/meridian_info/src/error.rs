//! # Avatar Info Error Types
//!
//! All errors that can occur while registering state or encoding a tick.
//!
//! Most of these are reported per (observer, avatar) pair and never leave
//! the tick: the pair is skipped, the block stays dirty and the rest of the
//! packet is still produced. Only phase ordering and setup errors are
//! returned to the caller.

use meridian_shared::ClientType;
use thiserror::Error;

use crate::coordinator::TickPhase;
use crate::extended_info::ExtendedInfoKind;
use crate::observer::ObserverId;

/// Coordinate axis of a delta field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// The x axis.
    X,
    /// The z axis.
    Z,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::X => "x",
            Self::Z => "z",
        })
    }
}

/// Errors that can occur in the avatar info subsystem.
#[derive(Error, Debug)]
pub enum InfoError {
    /// A relative delta does not fit the signed field width.
    #[error("{axis} delta {delta} does not fit in {bits} signed bits")]
    DeltaOutOfRange {
        /// The offending axis.
        axis: Axis,
        /// The delta that was rejected.
        delta: i32,
        /// Width of the field.
        bits: u8,
    },

    /// An index cannot be represented in the 16-bit index field.
    #[error("avatar index {0} exceeds the index field")]
    IndexOutOfRange(usize),

    /// Every avatar slot is in use or quarantined.
    #[error("avatar capacity exhausted: {0} slots")]
    AvatarCapacityExhausted(usize),

    /// No live avatar at this index.
    #[error("unknown avatar: {0}")]
    UnknownAvatar(usize),

    /// No registered observer with this id.
    #[error("unknown observer: {0}")]
    UnknownObserver(ObserverId),

    /// Every observer slot is in use.
    #[error("observer capacity exhausted: {0} slots")]
    ObserverCapacityExhausted(usize),

    /// No extended info encoder is registered for the client type.
    #[error("no extended info encoder registered for {0} clients")]
    UnsupportedClient(ClientType),

    /// A block was requested for a client type it was not precomputed for.
    #[error("no precomputed {kind:?} buffer for avatar {index} ({client} client)")]
    CacheMiss {
        /// The avatar whose block was requested.
        index: usize,
        /// The block kind.
        kind: ExtendedInfoKind,
        /// The client type that was requested.
        client: ClientType,
    },

    /// A tick phase was entered out of order.
    #[error("tick phase {actual:?} entered, expected {expected:?}")]
    PhaseOrder {
        /// The phase that must come next.
        expected: TickPhase,
        /// The phase that was attempted.
        actual: TickPhase,
    },

    /// Configuration values are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file is not valid TOML for [`crate::InfoConfig`].
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for avatar info operations.
pub type InfoResult<T> = Result<T, InfoError>;
