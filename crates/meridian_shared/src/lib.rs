//! # Meridian Shared
//!
//! Types the server encoders and the client decoders agree on.
//!
//! ## CRITICAL RULE
//!
//! Every width and flag value in this crate is frozen for the protocol
//! revision in [`constants::PROTOCOL_REVISION`]. Changing one is a new
//! revision, not a patch.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod constants;
pub mod coord;
pub mod movement;

pub use client::{ClientType, ClientTypeMap, ClientTypeSet};
pub use constants::{PROTOCOL_REVISION, TICK_DURATION_MS};
pub use coord::{CoordGrid, Direction};
pub use movement::MovementFlags;
