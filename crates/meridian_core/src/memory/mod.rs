//! # Memory Management
//!
//! Slot storage for long-lived avatars and recycling for per-tick buffers.

mod buffer_pool;
mod slot_arena;

pub use buffer_pool::{BufferPool, BufferPoolStats};
pub use slot_arena::SlotArena;
