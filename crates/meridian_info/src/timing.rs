//! # Tick Timing
//!
//! Measures how long each avatar info tick takes against its budget.
//!
//! The game loop owns the schedule; this only records what happened so a
//! slow encode shows up in the logs before it shows up as lag.

use std::time::{Duration, Instant};

/// Tick timing statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickTimings {
    /// Minimum tick duration observed.
    pub min_tick_us: u64,
    /// Maximum tick duration observed.
    pub max_tick_us: u64,
    /// Average tick duration (rolling).
    pub avg_tick_us: u64,
    /// Number of late ticks (took longer than budget).
    pub late_ticks: u64,
    /// Total ticks measured.
    pub total_ticks: u64,
}

/// Records the duration of every tick.
#[derive(Clone, Debug)]
pub struct TickTimer {
    budget: Duration,
    stats: TickTimings,
}

impl TickTimer {
    /// Creates a timer with the given per-tick budget.
    #[must_use]
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            stats: TickTimings {
                min_tick_us: u64::MAX,
                ..TickTimings::default()
            },
        }
    }

    /// Marks the start of a tick.
    #[must_use]
    pub fn begin(&self) -> Instant {
        Instant::now()
    }

    /// Marks the end of a tick.
    ///
    /// Returns the tick duration.
    pub fn end(&mut self, start: Instant) -> Duration {
        let duration = start.elapsed();
        let duration_us = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        self.stats.total_ticks += 1;
        self.stats.min_tick_us = self.stats.min_tick_us.min(duration_us);
        self.stats.max_tick_us = self.stats.max_tick_us.max(duration_us);

        // Rolling average
        self.stats.avg_tick_us = if self.stats.total_ticks == 1 {
            duration_us
        } else {
            (self.stats.avg_tick_us.saturating_mul(15).saturating_add(duration_us)) / 16
        };

        if duration > self.budget {
            self.stats.late_ticks += 1;
            tracing::warn!(
                "Avatar info tick took {}us, budget is {}us",
                duration_us,
                self.budget.as_micros()
            );
        }
        duration
    }

    /// Returns tick statistics.
    #[must_use]
    pub const fn stats(&self) -> &TickTimings {
        &self.stats
    }

    /// Returns the per-tick budget.
    #[must_use]
    pub const fn budget(&self) -> Duration {
        self.budget
    }

    /// Clears the statistics.
    pub fn reset_stats(&mut self) {
        self.stats = TickTimings {
            min_tick_us: u64::MAX,
            ..TickTimings::default()
        };
    }
}
