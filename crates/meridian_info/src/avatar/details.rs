//! Per-avatar movement and identity state.

use meridian_shared::constants::MAX_TYPE_ID;
use meridian_shared::{CoordGrid, Direction, MovementFlags};

use super::movement::{classify, Step, StepKind, TeleJumpPolicy, Teleport};

const IDLE_STEP: Step = Step {
    direction: Direction::South,
    kind: StepKind::Walk,
};

/// How an avatar competes for an observer's tracking slots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Priority {
    /// Counts against the tracking cap only.
    #[default]
    Normal,
    /// Also counts against the low-priority cap.
    Low,
}

/// Who may see an avatar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    /// Every observer in range.
    #[default]
    Public,
    /// Only observers that explicitly allowed this avatar.
    Specific,
}

/// Everything needed to allocate an avatar.
#[derive(Clone, Copy, Debug)]
pub struct AvatarSpawn {
    /// Definition id shown by the client.
    pub type_id: u32,
    /// Starting coordinate.
    pub coord: CoordGrid,
    /// Game cycle the avatar was spawned on. 0 means "not spawned this
    /// session" and is not transmitted.
    pub spawn_cycle: u32,
    /// Initial facing direction.
    pub direction: Direction,
    /// Tracking priority.
    pub priority: Priority,
    /// Visibility class.
    pub visibility: Visibility,
}

impl AvatarSpawn {
    /// Creates a public, normal-priority spawn facing south.
    #[must_use]
    pub const fn new(type_id: u32, coord: CoordGrid) -> Self {
        Self {
            type_id,
            coord,
            spawn_cycle: 0,
            direction: Direction::South,
            priority: Priority::Normal,
            visibility: Visibility::Public,
        }
    }

    /// Sets the spawn cycle.
    #[must_use]
    pub const fn with_spawn_cycle(mut self, spawn_cycle: u32) -> Self {
        self.spawn_cycle = spawn_cycle;
        self
    }

    /// Sets the facing direction.
    #[must_use]
    pub const fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Sets the tracking priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the visibility class.
    #[must_use]
    pub const fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Movement and identity state of one avatar.
///
/// Game logic records steps and teleports through the setters between
/// ticks. The tick classifies them once, encodes them, and clears them.
#[derive(Clone, Debug)]
pub struct AvatarDetails {
    index: u16,
    type_id: u32,
    coord: CoordGrid,
    tick_origin: CoordGrid,
    steps: [Step; 2],
    step_count: u8,
    teleport: Option<Teleport>,
    movement: MovementFlags,
    direction: Direction,
    spawn_cycle: u32,
    allocate_cycle: u32,
    inaccessible: bool,
    priority: Priority,
    visibility: Visibility,
}

impl AvatarDetails {
    /// Creates the state of a freshly allocated avatar.
    #[must_use]
    pub(crate) const fn new(index: u16, spawn: &AvatarSpawn, allocate_cycle: u32) -> Self {
        Self {
            index,
            type_id: spawn.type_id,
            coord: spawn.coord,
            tick_origin: spawn.coord,
            steps: [IDLE_STEP; 2],
            step_count: 0,
            teleport: None,
            movement: MovementFlags::EMPTY,
            direction: spawn.direction,
            spawn_cycle: spawn.spawn_cycle,
            allocate_cycle,
            inaccessible: false,
            priority: spawn.priority,
            visibility: spawn.visibility,
        }
    }

    /// Slot index, as written in the 16-bit index field.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> u16 {
        self.index
    }

    /// Definition id as given at allocation.
    #[must_use]
    pub const fn type_id(&self) -> u32 {
        self.type_id
    }

    /// Definition id clamped to the 14-bit field.
    #[must_use]
    pub const fn wire_type_id(&self) -> u32 {
        if self.type_id > MAX_TYPE_ID {
            MAX_TYPE_ID
        } else {
            self.type_id
        }
    }

    /// Current coordinate, including movement recorded this tick.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> CoordGrid {
        self.coord
    }

    /// Coordinate at the start of the current tick.
    #[must_use]
    pub const fn tick_origin(&self) -> CoordGrid {
        self.tick_origin
    }

    /// Facing direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Flags from the last classification.
    #[inline]
    #[must_use]
    pub const fn movement(&self) -> MovementFlags {
        self.movement
    }

    /// Spawn cycle, 0 if not transmitted.
    #[must_use]
    pub const fn spawn_cycle(&self) -> u32 {
        self.spawn_cycle
    }

    /// Tick on which this slot was allocated.
    #[must_use]
    pub const fn allocate_cycle(&self) -> u32 {
        self.allocate_cycle
    }

    /// Hidden from every observer while true.
    #[must_use]
    pub const fn is_inaccessible(&self) -> bool {
        self.inaccessible
    }

    /// Tracking priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Visibility class.
    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Number of steps recorded this tick.
    #[must_use]
    pub const fn step_count(&self) -> u8 {
        self.step_count
    }

    /// First recorded step direction.
    #[must_use]
    pub const fn first_step(&self) -> Option<Direction> {
        if self.step_count >= 1 {
            Some(self.steps[0].direction)
        } else {
            None
        }
    }

    /// Second recorded step direction.
    #[must_use]
    pub const fn second_step(&self) -> Option<Direction> {
        if self.step_count >= 2 {
            Some(self.steps[1].direction)
        } else {
            None
        }
    }

    /// The teleport recorded this tick.
    #[must_use]
    pub const fn teleport(&self) -> Option<&Teleport> {
        self.teleport.as_ref()
    }

    /// True if the avatar moved in any way this tick.
    #[must_use]
    pub const fn has_moved(&self) -> bool {
        self.step_count > 0 || self.teleport.is_some()
    }

    /// Records one walk step.
    pub fn walk(&mut self, direction: Direction) {
        self.record_step(direction, StepKind::Walk);
    }

    /// Records one crawl step.
    pub fn crawl(&mut self, direction: Direction) {
        self.record_step(direction, StepKind::Crawl);
    }

    /// Records a teleport to an absolute coordinate.
    ///
    /// With `jump` set the client renders it as an instant jump however
    /// close the destination is.
    pub fn teleport_to(&mut self, level: u32, x: u32, z: u32, jump: bool) {
        let destination = CoordGrid::new(level, x, z);
        let force_jump = jump || self.teleport.is_some_and(|t| t.force_jump);
        self.coord = destination;
        self.teleport = Some(Teleport {
            origin: self.tick_origin,
            destination,
            force_jump,
        });
    }

    /// Turns the avatar without moving it.
    pub fn update_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub(crate) fn set_inaccessible(&mut self, inaccessible: bool) {
        self.inaccessible = inaccessible;
    }

    /// Classifies the movement recorded this tick.
    ///
    /// Flags are rebuilt from scratch on every call, so classifying twice
    /// in one tick gives the same result.
    pub(crate) fn classify_movement(&mut self, policy: TeleJumpPolicy) -> MovementFlags {
        let recorded = usize::from(self.step_count).min(self.steps.len());
        let result = classify(&self.steps[..recorded], self.teleport.as_ref(), policy);
        self.movement = result.flags;
        if let Some(facing) = result.facing {
            self.direction = facing;
        }
        self.movement
    }

    /// Clears the movement of the finished tick.
    pub(crate) fn end_tick(&mut self) {
        self.step_count = 0;
        self.teleport = None;
        self.movement = MovementFlags::EMPTY;
        self.tick_origin = self.coord;
    }

    fn record_step(&mut self, direction: Direction, kind: StepKind) {
        let destination = self.coord.step(direction);

        if self.teleport.is_some() || self.step_count >= 2 {
            // A third step cannot be encoded; the client jumps instead.
            self.teleport_to(destination.level(), destination.x(), destination.z(), true);
            return;
        }

        self.steps[usize::from(self.step_count)] = Step { direction, kind };
        self.step_count += 1;
        self.coord = destination;
    }
}
