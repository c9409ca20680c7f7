//! # Protocol Constants
//!
//! Field widths and limits of the avatar info packet.
//!
//! **CRITICAL:** These values are baked into the client binary.
//! Changes require a client rebuild.

// =============================================================================
// REVISION
// =============================================================================

/// Protocol revision this build encodes for.
pub const PROTOCOL_REVISION: u32 = 228;

/// Duration of one simulation tick in milliseconds.
pub const TICK_DURATION_MS: u64 = 600;

// =============================================================================
// RESOLUTION CHANGE FIELDS
// =============================================================================

/// Width of an avatar index.
pub const INDEX_BITS: u8 = 16;

/// Index value that terminates the additions list.
pub const ADDITIONS_TERMINATOR: u32 = 0xFFFF;

/// Largest index an avatar may occupy (the terminator is reserved).
pub const MAX_AVATAR_INDEX: usize = 0xFFFE;

/// Width of the type id field.
pub const TYPE_ID_BITS: u8 = 14;

/// Type ids are clamped to this value before encoding.
pub const MAX_TYPE_ID: u32 = 16_383;

/// Width of the spawn cycle payload.
pub const SPAWN_CYCLE_BITS: u8 = 32;

/// Width of a direction field.
pub const DIRECTION_BITS: u8 = 3;

/// Delta width for observers with a small view distance.
pub const SMALL_DELTA_BITS: u8 = 5;

/// Delta width for observers with an extended view distance.
pub const LARGE_DELTA_BITS: u8 = 8;

/// Width of the level field in a high detail fragment.
pub const LEVEL_BITS: u8 = 2;

/// Width of an absolute coordinate axis in a high detail fragment.
pub const COORD_AXIS_BITS: u8 = 14;

// =============================================================================
// HIGH RESOLUTION (TRACKED) SECTION
// =============================================================================

/// Width of the tracked avatar count at the head of a packet.
pub const TRACKED_COUNT_BITS: u8 = 8;

/// Most avatars a single observer can track (limited by the count field).
pub const MAX_TRACKED_AVATARS: usize = 255;

/// Width of a tracked avatar update opcode.
pub const UPDATE_OPCODE_BITS: u8 = 2;

/// Opcode: extended info only.
pub const OPCODE_EXTENDED_INFO: u32 = 0;

/// Opcode: one walk step.
pub const OPCODE_WALK: u32 = 1;

/// Opcode: crawl or run.
pub const OPCODE_CRAWL_OR_RUN: u32 = 2;

/// Opcode: removed from view.
pub const OPCODE_REMOVE: u32 = 3;

// =============================================================================
// VIEW
// =============================================================================

/// View distances above this use the large (8-bit) delta encoding.
pub const DEFAULT_SMALL_VIEW_RADIUS: u32 = 15;

/// Largest small view radius whose deltas fit the 5-bit fields.
pub const MAX_SMALL_VIEW_RADIUS: u32 = 15;

/// Largest view distance whose deltas fit the 8-bit fields.
pub const MAX_VIEW_DISTANCE: u32 = 127;

/// Default view distance for a fresh observer.
pub const DEFAULT_VIEW_DISTANCE: u32 = 15;

/// Per-observer extended info budget in bytes.
pub const DEFAULT_EXTENDED_INFO_BUDGET: usize = 40_000;
