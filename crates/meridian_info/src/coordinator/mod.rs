//! # Tick Coordinator
//!
//! Runs the avatar info pipeline once per game tick.
//!
//! ## Phases
//!
//! ```text
//!  Idle
//!   │
//!   ▼
//!  CollectDirty ────────── plan every observer's view (sequential)
//!   │
//!   ▼
//!  ClassifyMovement ────── derive movement flags (sequential)
//!   │
//!   ▼
//!  PrecomputeShared ───┐   encode dirty blocks once per client type
//!                      ├── worker pool, chunks of avatars
//!   ┌──── barrier ─────┘
//!   ▼
//!  EncodePerObserver ──┐   build every observer's packet, read-only
//!                      ├── worker pool, chunks of observers
//!   ┌──── barrier ─────┘
//!   ▼
//!  ReleaseBuffers ──────── commit views, clear delivered blocks,
//!   │                      return buffers, recycle indices
//!   ▼
//!  Idle
//! ```
//!
//! Phases run strictly in this order. Entering one out of order is an
//! [`InfoError::PhaseOrder`] and abandons the tick: every buffer is
//! released and no packet is produced.
//!
//! ## Delivery
//!
//! A dirty block is delivered when every observer that needed it received
//! it. Delivered transient blocks are reset, delivered persistent blocks go
//! clean. A block that a tracking observer could not receive (packet
//! budget, missing buffer) stays dirty and is offered again next tick. An
//! observer whose addition fragment was rejected never started tracking,
//! so delivery does not wait for it.

mod packet;
mod plan;

use std::collections::BTreeSet;
use std::time::Duration;

use meridian_core::{BufferPool, SlotArena};
use meridian_shared::{ClientType, CoordGrid};

use crate::avatar::{AvatarRepository, TeleJumpPolicy, TickScratch};
use crate::config::InfoConfig;
use crate::encoder::{
    HighResolutionChangeEncoder, LowResolutionChangeEncoder, ResolutionChangeEncoder,
};
use crate::error::{InfoError, InfoResult};
use crate::extended_info::ExtendedInfoEncoders;
use crate::observer::{Observer, ObserverId};
use crate::timing::{TickTimer, TickTimings};
use crate::worker::WorkerPool;

use packet::{encode_observer, EncodeContext};
use plan::{plan_observer, ObserverJob, TrackedAction};

/// Where the coordinator is within a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickPhase {
    /// Between ticks. Game logic may mutate state.
    Idle,
    /// Planning views and gathering dirty state.
    CollectDirty,
    /// Deriving movement flags.
    ClassifyMovement,
    /// Encoding blocks once per client type.
    PrecomputeShared,
    /// Building per-observer packets.
    EncodePerObserver,
    /// Committing results and returning buffers.
    ReleaseBuffers,
}

impl TickPhase {
    /// The phase that must follow this one.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Idle => Self::CollectDirty,
            Self::CollectDirty => Self::ClassifyMovement,
            Self::ClassifyMovement => Self::PrecomputeShared,
            Self::PrecomputeShared => Self::EncodePerObserver,
            Self::EncodePerObserver => Self::ReleaseBuffers,
            Self::ReleaseBuffers => Self::Idle,
        }
    }
}

/// One observer's packet for the tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObserverPacket {
    /// Recipient.
    pub observer: ObserverId,
    /// Bit section followed by the extended info section.
    pub bytes: Vec<u8>,
}

/// What happened during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The tick number.
    pub cycle: u32,
    /// Live avatars.
    pub avatars: usize,
    /// Registered observers.
    pub observers: usize,
    /// Avatars that moved.
    pub moved: usize,
    /// Avatars with at least one dirty block.
    pub dirty: usize,
    /// Encoder invocations in the precompute phase.
    pub precompute_runs: u64,
    /// Avatars added to views.
    pub additions: usize,
    /// Avatars removed from views (re-adds excluded).
    pub removals: usize,
    /// Avatars whose dirty blocks stay dirty.
    pub deferred: usize,
    /// Fragments rejected for out-of-range fields.
    pub violations: usize,
    /// Extended info lookups that found no precomputed buffer.
    pub cache_misses: usize,
    /// Observers whose packet was abandoned.
    pub failed_observers: usize,
    /// Total packet bytes.
    pub bytes: usize,
    /// Avatar indices released from quarantine.
    pub recycled_indices: usize,
    /// Wall time of the tick.
    pub duration: Duration,
}

/// Packets and statistics of a tick.
#[derive(Debug)]
pub struct TickOutput {
    /// One packet per observer, in observer id order.
    pub packets: Vec<ObserverPacket>,
    /// Statistics.
    pub report: TickReport,
}

/// Owns avatars, observers and encoders, and runs the tick pipeline.
///
/// # Example
///
/// ```rust
/// use meridian_info::{AvatarSpawn, InfoConfig, TickCoordinator};
/// use meridian_shared::{ClientType, CoordGrid};
///
/// let mut coordinator = TickCoordinator::new(InfoConfig::default()).unwrap();
/// let guard = coordinator
///     .avatars_mut()
///     .allocate(AvatarSpawn::new(3010, CoordGrid::new(0, 3200, 3200)))
///     .unwrap();
/// let viewer = coordinator
///     .register_observer(ClientType::Desktop, CoordGrid::new(0, 3205, 3200))
///     .unwrap();
///
/// let output = coordinator.tick().unwrap();
/// assert_eq!(output.packets.len(), 1);
/// assert!(coordinator.observer(viewer).unwrap().is_tracking(guard));
/// ```
pub struct TickCoordinator {
    config: InfoConfig,
    policy: TeleJumpPolicy,
    avatars: AvatarRepository,
    observers: SlotArena<Observer>,
    extended_encoders: ExtendedInfoEncoders,
    low_resolution: Box<dyn ResolutionChangeEncoder>,
    high_resolution: Box<dyn ResolutionChangeEncoder>,
    pool: BufferPool,
    workers: WorkerPool,
    timer: TickTimer,
    phase: TickPhase,
}

impl TickCoordinator {
    /// Creates a coordinator that serves desktop clients.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::InvalidConfig`] if the configuration does not
    /// validate.
    pub fn new(config: InfoConfig) -> InfoResult<Self> {
        Self::with_encoders(config, ExtendedInfoEncoders::default())
    }

    /// Creates a coordinator serving every client type in `encoders`.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::InvalidConfig`] if the configuration does not
    /// validate.
    pub fn with_encoders(config: InfoConfig, encoders: ExtendedInfoEncoders) -> InfoResult<Self> {
        config.validate()?;
        tracing::info!(
            "Avatar info: {} workers, {} avatar slots, {} observer slots",
            config.worker_count,
            config.max_avatars,
            config.max_observers
        );

        Ok(Self {
            policy: config.tele_jump_policy(),
            avatars: AvatarRepository::new(config.max_avatars),
            observers: SlotArena::new(config.max_observers),
            extended_encoders: encoders,
            low_resolution: Box::new(LowResolutionChangeEncoder),
            high_resolution: Box::new(HighResolutionChangeEncoder),
            pool: BufferPool::new(config.buffer_pool_capacity),
            workers: WorkerPool::new(config.worker_count, config.chunk_size),
            timer: TickTimer::new(Duration::from_millis(config.tick_budget_ms)),
            phase: TickPhase::Idle,
            config,
        })
    }

    /// Replaces the resolution change encoders with another protocol
    /// revision's layouts.
    #[must_use]
    pub fn with_resolution_encoders(
        mut self,
        low: Box<dyn ResolutionChangeEncoder>,
        high: Box<dyn ResolutionChangeEncoder>,
    ) -> Self {
        self.low_resolution = low;
        self.high_resolution = high;
        self
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &InfoConfig {
        &self.config
    }

    /// The current phase. Always [`TickPhase::Idle`] between ticks.
    #[must_use]
    pub const fn phase(&self) -> TickPhase {
        self.phase
    }

    /// The tick that will run next.
    #[must_use]
    pub const fn cycle(&self) -> u32 {
        self.avatars.cycle()
    }

    /// All avatars.
    #[must_use]
    pub const fn avatars(&self) -> &AvatarRepository {
        &self.avatars
    }

    /// All avatars, for the game logic setters.
    pub fn avatars_mut(&mut self) -> &mut AvatarRepository {
        &mut self.avatars
    }

    /// The shared buffer pool.
    #[must_use]
    pub const fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Tick duration statistics.
    #[must_use]
    pub const fn timings(&self) -> &TickTimings {
        self.timer.stats()
    }

    /// Number of registered observers.
    #[must_use]
    pub const fn observer_count(&self) -> usize {
        self.observers.allocated_count()
    }

    /// Registers an observer.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::UnsupportedClient`] if no block encoder is
    /// registered for `client`, or [`InfoError::ObserverCapacityExhausted`]
    /// when every slot is taken.
    pub fn register_observer(&mut self, client: ClientType, coord: CoordGrid) -> InfoResult<ObserverId> {
        if !self.extended_encoders.supports(client) {
            return Err(InfoError::UnsupportedClient(client));
        }

        let slot = self
            .observers
            .allocate_with(|slot| Observer::new(observer_id(slot), client, coord))
            .ok_or(InfoError::ObserverCapacityExhausted(self.observers.capacity()))?;

        let id = observer_id(slot);
        tracing::debug!("Registered observer {} ({} client)", id, client);
        Ok(id)
    }

    /// Removes an observer.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::UnknownObserver`] if `id` is not registered.
    pub fn unregister_observer(&mut self, id: ObserverId) -> InfoResult<()> {
        if self.observers.free(id.slot()).is_none() {
            return Err(InfoError::UnknownObserver(id));
        }
        tracing::debug!("Unregistered observer {}", id);
        Ok(())
    }

    /// Returns an observer.
    #[must_use]
    pub fn observer(&self, id: ObserverId) -> Option<&Observer> {
        self.observers.get(id.slot())
    }

    /// Returns an observer for updates between ticks.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::UnknownObserver`] if `id` is not registered.
    pub fn observer_mut(&mut self, id: ObserverId) -> InfoResult<&mut Observer> {
        self.observers
            .get_mut(id.slot())
            .ok_or(InfoError::UnknownObserver(id))
    }

    /// Hands a sent packet's allocation back for reuse.
    pub fn recycle_packet(&self, bytes: Vec<u8>) {
        self.pool.release(bytes);
    }

    /// Runs one complete tick.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::PhaseOrder`] if a phase is entered out of
    /// order. The tick is abandoned and the coordinator is left idle.
    pub fn tick(&mut self) -> InfoResult<TickOutput> {
        let start = self.timer.begin();
        match self.run_phases() {
            Ok(mut output) => {
                output.report.duration = self.timer.end(start);
                let report = &output.report;
                tracing::debug!(
                    "Tick {}: {} avatars, {} observers, {} moved, {} dirty, {} precomputed, {} deferred, {} rejected, {} bytes in {:?}",
                    report.cycle,
                    report.avatars,
                    report.observers,
                    report.moved,
                    report.dirty,
                    report.precompute_runs,
                    report.deferred,
                    report.violations,
                    report.bytes,
                    report.duration
                );
                Ok(output)
            }
            Err(error) => {
                tracing::error!("Tick {} abandoned: {}", self.avatars.cycle(), error);
                self.abandon();
                Err(error)
            }
        }
    }

    fn run_phases(&mut self) -> InfoResult<TickOutput> {
        let cycle = self.avatars.cycle();
        let mut report = TickReport {
            cycle,
            avatars: self.avatars.len(),
            observers: self.observers.allocated_count(),
            ..TickReport::default()
        };

        self.enter(TickPhase::CollectDirty)?;
        let mut jobs = self.collect_dirty(&mut report);

        self.enter(TickPhase::ClassifyMovement)?;
        self.classify_movement();

        self.enter(TickPhase::PrecomputeShared)?;
        report.precompute_runs = self.precompute_shared();

        self.enter(TickPhase::EncodePerObserver)?;
        self.encode_per_observer(&mut jobs, cycle);

        self.enter(TickPhase::ReleaseBuffers)?;
        let packets = self.release_buffers(jobs, &mut report);

        self.enter(TickPhase::Idle)?;
        Ok(TickOutput { packets, report })
    }

    fn enter(&mut self, phase: TickPhase) -> InfoResult<()> {
        let expected = self.phase.next();
        if phase != expected {
            return Err(InfoError::PhaseOrder {
                expected,
                actual: phase,
            });
        }
        self.phase = phase;
        Ok(())
    }

    fn abandon(&mut self) {
        for avatar in self.avatars.iter_mut() {
            avatar.extended_info.release_buffers(&self.pool);
            avatar.scratch = TickScratch::default();
        }
        self.phase = TickPhase::Idle;
    }

    fn collect_dirty(&mut self, report: &mut TickReport) -> Vec<ObserverJob> {
        for (_, avatar) in self.avatars.iter() {
            if avatar.details().has_moved() {
                report.moved += 1;
            }
            if !avatar.extended_info().dirty_mask().is_empty() {
                report.dirty += 1;
            }
        }

        let jobs: Vec<ObserverJob> = self
            .observers
            .iter()
            .map(|(_, observer)| plan_observer(observer, &self.avatars, &self.config))
            .collect();

        for job in &jobs {
            for (index, action) in &job.tracked {
                if *action == TrackedAction::Stay {
                    if let Some(avatar) = self.avatars.get_mut(*index) {
                        avatar.scratch.clients.insert(job.client);
                    }
                }
            }
            for index in &job.additions {
                if let Some(avatar) = self.avatars.get_mut(*index) {
                    avatar.scratch.clients.insert(job.client);
                    avatar.scratch.entering.insert(job.client);
                }
            }
        }
        jobs
    }

    fn classify_movement(&mut self) {
        let policy = self.policy;
        for avatar in self.avatars.iter_mut() {
            avatar.details.classify_movement(policy);
        }
    }

    fn precompute_shared(&mut self) -> u64 {
        let encoders = &self.extended_encoders;
        let pool = &self.pool;

        self.workers.for_each_mut(self.avatars.slots_mut(), |slot| {
            let Some(avatar) = slot else {
                return;
            };
            let dirty = avatar.extended_info.dirty_mask();
            let persistent = avatar.extended_info.persistent_mask();

            let mut runs = 0;
            for client in avatar.scratch.clients.iter() {
                let mut mask = dirty;
                if avatar.scratch.entering.contains(client) {
                    mask |= persistent;
                }
                match avatar.extended_info.precompute(mask, client, encoders, pool) {
                    Ok(count) => runs += count,
                    Err(error) => tracing::error!(
                        "Precompute failed for avatar {}: {}",
                        avatar.details.index(),
                        error
                    ),
                }
            }
            avatar.scratch.precompute_runs = runs;
        });

        self.avatars
            .iter()
            .map(|(_, avatar)| avatar.scratch.precompute_runs)
            .sum()
    }

    fn encode_per_observer(&self, jobs: &mut [ObserverJob], cycle: u32) {
        let ctx = EncodeContext {
            avatars: &self.avatars,
            low_resolution: self.low_resolution.as_ref(),
            high_resolution: self.high_resolution.as_ref(),
            pool: &self.pool,
            cycle,
            high_detail_radius: self.config.high_detail_radius,
            extended_info_budget: self.config.max_extended_info_bytes,
        };
        self.workers.for_each_mut(jobs, |job| encode_observer(job, &ctx));
    }

    fn release_buffers(&mut self, jobs: Vec<ObserverJob>, report: &mut TickReport) -> Vec<ObserverPacket> {
        let mut deferred: BTreeSet<u16> = BTreeSet::new();
        let mut packets = Vec::with_capacity(jobs.len());

        for mut job in jobs {
            report.violations += job.violations;
            report.cache_misses += job.cache_misses;

            if job.failed {
                report.failed_observers += 1;
                deferred.extend(job.involved());
                continue;
            }

            report.additions += job.added;
            report.removals += job.removed;
            deferred.extend(job.deferred.iter().copied());

            if let Some(observer) = self.observers.get_mut(job.observer.slot()) {
                observer.commit_tracked(std::mem::take(&mut job.next_tracked));
            }
            report.bytes += job.packet.len();
            packets.push(ObserverPacket {
                observer: job.observer,
                bytes: job.packet,
            });
        }

        if report.violations > 0 {
            tracing::warn!("Tick {}: {} fragments rejected", report.cycle, report.violations);
        }
        report.deferred = deferred.len();

        for avatar in self.avatars.iter_mut() {
            let delivered = !deferred.contains(&avatar.details.index());
            avatar.extended_info.finish_tick(delivered, &self.pool);
            avatar.details.end_tick();
            avatar.scratch = TickScratch::default();
        }

        // Observers with an abandoned packet still track released indices.
        report.recycled_indices = self.avatars.end_tick(report.failed_observers == 0);
        self.observers.recycle();
        packets
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn observer_id(slot: usize) -> ObserverId {
    // Observer slots are far below u32::MAX.
    ObserverId::new(slot as u32)
}

impl std::fmt::Debug for TickCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickCoordinator")
            .field("phase", &self.phase)
            .field("avatars", &self.avatars)
            .field("observers", &self.observers.allocated_count())
            .field("encoders", &self.extended_encoders)
            .finish_non_exhaustive()
    }
}
