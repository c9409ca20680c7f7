//! # Avatar Info Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an
//! empty file is a valid configuration.
//!
//! ```toml
//! worker_count = 4
//! max_tracked = 250
//! small_view_radius = 15
//! max_extended_info_bytes = 40000
//! ```

use std::path::Path;

use meridian_shared::constants::{
    DEFAULT_EXTENDED_INFO_BUDGET, DEFAULT_SMALL_VIEW_RADIUS, MAX_AVATAR_INDEX,
    MAX_SMALL_VIEW_RADIUS, MAX_TRACKED_AVATARS,
};
use meridian_shared::TICK_DURATION_MS;
use serde::Deserialize;

use crate::avatar::TeleJumpPolicy;
use crate::error::{InfoError, InfoResult};

/// Tunables of the avatar info subsystem.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InfoConfig {
    /// Threads used by the parallel phases. 1 runs everything inline.
    pub worker_count: usize,
    /// Items handed to a worker at a time.
    pub chunk_size: usize,
    /// Avatar slots in the repository.
    pub max_avatars: usize,
    /// Observer slots.
    pub max_observers: usize,
    /// Most avatars one observer tracks at once.
    pub max_tracked: usize,
    /// Most low-priority avatars one observer tracks at once.
    pub low_priority_cap: usize,
    /// View distances above this use 8-bit deltas in additions.
    pub small_view_radius: u32,
    /// Additions within this distance use the high detail fragment.
    /// 0 disables high detail.
    pub high_detail_radius: u32,
    /// Teleports further than this from the start-of-tick tile jump.
    pub tele_jump_distance: u32,
    /// Extended info bytes allowed in one observer packet.
    pub max_extended_info_bytes: usize,
    /// Byte buffers the pool keeps between ticks.
    pub buffer_pool_capacity: usize,
    /// Ticks slower than this are counted as late.
    pub tick_budget_ms: u64,
}

impl Default for InfoConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get().max(1),
            chunk_size: 16,
            max_avatars: 32_768,
            max_observers: 2_048,
            max_tracked: 250,
            low_priority_cap: 50,
            small_view_radius: DEFAULT_SMALL_VIEW_RADIUS,
            high_detail_radius: 0,
            tele_jump_distance: 1,
            max_extended_info_bytes: DEFAULT_EXTENDED_INFO_BUDGET,
            buffer_pool_capacity: 4_096,
            tick_budget_ms: TICK_DURATION_MS,
        }
    }
}

impl InfoConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::ConfigParse`] for malformed TOML or unknown keys
    /// and [`InfoError::InvalidConfig`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> InfoResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::Io`] if the file cannot be read, otherwise as
    /// [`InfoConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> InfoResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> InfoResult<()> {
        if self.worker_count == 0 {
            return Err(invalid("worker_count must be at least 1"));
        }
        if self.chunk_size == 0 {
            return Err(invalid("chunk_size must be at least 1"));
        }
        if self.max_avatars == 0 || self.max_avatars > MAX_AVATAR_INDEX + 1 {
            return Err(InfoError::InvalidConfig(format!(
                "max_avatars must be in 1..={}, got {}",
                MAX_AVATAR_INDEX + 1,
                self.max_avatars
            )));
        }
        if self.max_observers == 0 {
            return Err(invalid("max_observers must be at least 1"));
        }
        if self.max_tracked == 0 || self.max_tracked > MAX_TRACKED_AVATARS {
            return Err(InfoError::InvalidConfig(format!(
                "max_tracked must be in 1..={MAX_TRACKED_AVATARS}, got {}",
                self.max_tracked
            )));
        }
        if self.low_priority_cap > self.max_tracked {
            return Err(invalid("low_priority_cap cannot exceed max_tracked"));
        }
        if self.small_view_radius > MAX_SMALL_VIEW_RADIUS {
            return Err(InfoError::InvalidConfig(format!(
                "small_view_radius must be at most {MAX_SMALL_VIEW_RADIUS}, got {}",
                self.small_view_radius
            )));
        }
        if self.tick_budget_ms == 0 {
            return Err(invalid("tick_budget_ms must be at least 1"));
        }
        Ok(())
    }

    /// Teleport classification policy derived from this configuration.
    #[must_use]
    pub const fn tele_jump_policy(&self) -> TeleJumpPolicy {
        TeleJumpPolicy::new(self.tele_jump_distance)
    }
}

fn invalid(message: &str) -> InfoError {
    InfoError::InvalidConfig(message.to_owned())
}
