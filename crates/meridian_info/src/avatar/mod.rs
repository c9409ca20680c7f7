//! # Avatars
//!
//! Per-avatar state recorded by the game logic between ticks, the movement
//! classifier that turns it into flags, and the repository that owns it.

mod details;
mod movement;
mod repository;

pub use details::{AvatarDetails, AvatarSpawn, Priority, Visibility};
pub use movement::{classify, Classification, Step, StepKind, TeleJumpPolicy, Teleport};
pub use repository::{Avatar, AvatarRepository};

pub(crate) use repository::TickScratch;
