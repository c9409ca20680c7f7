//! # Meridian Core
//!
//! The primitives the avatar info encoders are built on:
//!
//! - **Buffers**: MSB-first bit packing and byte buffers with the
//!   transformed (`Alt`) integer writes the game client expects
//! - **Memory**: a slot arena that hands out stable indices and a pool of
//!   recycled byte buffers for per-tick precomputation
//!
//! ## Architecture Rules
//!
//! 1. **Stable indices** - An arena index is never reissued in the same tick
//!    it was released
//! 2. **Recycle, don't allocate** - Per-tick buffers go back to the pool

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod buffer;
pub mod memory;

pub use buffer::{BitBuf, BitReader, ByteBuf, ByteReader};
pub use memory::{BufferPool, BufferPoolStats, SlotArena};
