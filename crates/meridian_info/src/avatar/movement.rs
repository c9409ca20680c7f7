//! # Movement Classifier
//!
//! Derives the movement flags of one tick from the raw steps and teleport
//! recorded by the game logic.
//!
//! ## Decision Table
//!
//! ```text
//! teleport?  jump?  steps  ->  flags
//! ---------  -----  -----      -----------------
//!    yes      yes     *        TELE | TELEJUMP
//!    yes      no      *        TELE
//!    no       -       2        RUN
//!    no       -       1        WALK or CRAWL
//!    no       -       0        (empty)
//! ```
//!
//! A teleport discards the steps: the avatar ends the tick at the teleport
//! destination, wherever it walked before.

use meridian_shared::{CoordGrid, Direction, MovementFlags};

/// Whether a single step was a walk or a crawl.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    /// A normal walk step.
    Walk,
    /// A slow crawl step.
    Crawl,
}

/// One step recorded during the tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    /// Direction of the step.
    pub direction: Direction,
    /// Walk or crawl.
    pub kind: StepKind,
}

/// A teleport recorded during the tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Teleport {
    /// Coordinate at the start of the tick.
    pub origin: CoordGrid,
    /// Where the avatar ends up.
    pub destination: CoordGrid,
    /// The game asked for a jump explicitly.
    pub force_jump: bool,
}

/// Decides whether a teleport is rendered as an instant jump.
///
/// A teleport onto the tile the avatar started the tick on has distance 0
/// and is interpolated like a move to an adjacent tile; only `force_jump`
/// makes it jump.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeleJumpPolicy {
    max_distance: u32,
}

impl TeleJumpPolicy {
    /// Creates a policy that lets the client interpolate teleports of up to
    /// `max_distance` tiles on the same level.
    #[must_use]
    pub const fn new(max_distance: u32) -> Self {
        Self { max_distance }
    }

    /// Largest distance that is still interpolated.
    #[must_use]
    pub const fn max_distance(self) -> u32 {
        self.max_distance
    }

    /// Returns true if the teleport must jump.
    #[must_use]
    pub const fn requires_jump(self, teleport: &Teleport) -> bool {
        if teleport.force_jump {
            return true;
        }
        match teleport.origin.chebyshev_distance(teleport.destination) {
            Some(distance) => distance > self.max_distance,
            None => true,
        }
    }
}

impl Default for TeleJumpPolicy {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Result of classifying one tick of movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    /// Flags for the tick.
    pub flags: MovementFlags,
    /// New facing direction, if the movement implies one.
    pub facing: Option<Direction>,
}

/// Classifies one tick of movement.
///
/// Total over its inputs: more than two steps classify as RUN facing the
/// last step, although the recording setters never produce that.
#[must_use]
pub fn classify(steps: &[Step], teleport: Option<&Teleport>, policy: TeleJumpPolicy) -> Classification {
    if let Some(teleport) = teleport {
        let mut flags = MovementFlags::TELE;
        if policy.requires_jump(teleport) {
            flags |= MovementFlags::TELEJUMP;
        }
        return Classification {
            flags,
            facing: None,
        };
    }

    match steps {
        [] => Classification {
            flags: MovementFlags::EMPTY,
            facing: None,
        },
        [step] => Classification {
            flags: match step.kind {
                StepKind::Walk => MovementFlags::WALK,
                StepKind::Crawl => MovementFlags::CRAWL,
            },
            facing: Some(step.direction),
        },
        [.., last] => Classification {
            flags: MovementFlags::RUN,
            facing: Some(last.direction),
        },
    }
}
