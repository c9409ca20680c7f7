//! # Meridian Info - Avatar Information Synchronization
//!
//! Builds the per-observer avatar info packet every game tick.
//!
//! ## Architecture
//!
//! - **Avatars**: movement and identity recorded by game logic, classified
//!   into crawl/walk/run/teleport flags once per tick
//! - **Encoders**: bit-packed resolution change fragments in low (relative)
//!   and high (absolute) detail
//! - **Extended info**: optional blocks encoded once per client type and
//!   shared by every observer of that type
//! - **Coordinator**: the phase-ordered tick pipeline on a worker pool
//!
//! ## Data Flow
//!
//! ```text
//! GAME LOGIC                    TICK                         TRANSPORT
//!    |                            |                              |
//!    |-- walk / teleport -------->|                              |
//!    |-- set_sequence ----------->|                              |
//!    |                            | collect -> classify          |
//!    |                            | -> precompute -> encode      |
//!    |                            |--- one packet per observer ->|
//!    |                            | release buffers              |
//! ```
//!
//! ## Example
//!
//! ```rust
//! use meridian_info::{AvatarSpawn, InfoConfig, TickCoordinator};
//! use meridian_shared::{ClientType, CoordGrid, Direction};
//!
//! let mut coordinator = TickCoordinator::new(InfoConfig::default()).unwrap();
//! let rat = coordinator
//!     .avatars_mut()
//!     .allocate(AvatarSpawn::new(2854, CoordGrid::new(0, 3200, 3200)))
//!     .unwrap();
//! coordinator
//!     .register_observer(ClientType::Desktop, CoordGrid::new(0, 3202, 3202))
//!     .unwrap();
//! coordinator.tick().unwrap();
//!
//! coordinator.avatars_mut().details_mut(rat).unwrap().walk(Direction::North);
//! let output = coordinator.tick().unwrap();
//! assert_eq!(output.report.moved, 1);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod avatar;
pub mod config;
pub mod coordinator;
pub mod encoder;
pub mod error;
pub mod extended_info;
pub mod observer;
pub mod timing;
pub mod worker;

// Re-exports for convenience
pub use avatar::{
    Avatar, AvatarDetails, AvatarRepository, AvatarSpawn, Priority, TeleJumpPolicy, Visibility,
};
pub use config::InfoConfig;
pub use coordinator::{ObserverPacket, TickCoordinator, TickOutput, TickPhase, TickReport};
pub use encoder::{
    Detail, HighResolutionChangeEncoder, LowResolutionChangeEncoder, ResolutionChange,
    ResolutionChangeEncoder, TrackedUpdate,
};
pub use error::{Axis, InfoError, InfoResult};
pub use extended_info::{
    AvatarExtendedInfo, BlockEncoder, BlockMask, DesktopBlockEncoder, ExtendedInfoEncoders,
    ExtendedInfoKind, PlainTextCodec, PrecomputedBuffer, TextCodec,
};
pub use observer::{Observer, ObserverId};
pub use timing::{TickTimer, TickTimings};
pub use worker::WorkerPool;
