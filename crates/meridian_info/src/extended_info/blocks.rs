//! Block payloads and the per-block dirty flag and buffer cache.

use meridian_core::{BufferPool, ByteBuf};
use meridian_shared::{ClientType, ClientTypeMap};

use super::cache::PrecomputedBuffer;
use super::encoders::ExtendedInfoEncoders;
use super::ExtendedInfoKind;
use crate::error::{InfoError, InfoResult};

/// Movement speed the client animates with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveSpeed {
    /// Speed id.
    pub value: u8,
}

impl MoveSpeed {
    /// Crawling speed.
    pub const CRAWL: u8 = 0;
    /// Walking speed, assumed by the client until told otherwise.
    pub const WALK: u8 = 1;
    /// Running speed.
    pub const RUN: u8 = 2;
}

impl Default for MoveSpeed {
    fn default() -> Self {
        Self {
            value: Self::WALK,
        }
    }
}

/// Animation sequence to play.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sequence {
    /// Sequence id, `0xFFFF` stops the current animation.
    pub id: u16,
    /// Client cycles to wait before starting.
    pub delay: u8,
}

impl Default for Sequence {
    fn default() -> Self {
        Self { id: 0xFFFF, delay: 0 }
    }
}

/// Colour tint applied over a range of client cycles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tinting {
    /// First client cycle of the tint.
    pub start: u16,
    /// Last client cycle of the tint.
    pub end: u16,
    /// Hue.
    pub hue: u8,
    /// Saturation.
    pub saturation: u8,
    /// Lightness.
    pub lightness: u8,
    /// Blend weight.
    pub weight: u8,
}

/// New display name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameChange {
    /// The name, None when unset.
    pub name: Option<String>,
}

/// Semantic value of one block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockPayload {
    /// See [`MoveSpeed`].
    MoveSpeed(MoveSpeed),
    /// See [`Sequence`].
    Sequence(Sequence),
    /// See [`Tinting`].
    Tinting(Tinting),
    /// See [`NameChange`].
    NameChange(NameChange),
}

impl BlockPayload {
    /// The default payload of a kind.
    #[must_use]
    pub fn empty(kind: ExtendedInfoKind) -> Self {
        match kind {
            ExtendedInfoKind::MoveSpeed => Self::MoveSpeed(MoveSpeed::default()),
            ExtendedInfoKind::Sequence => Self::Sequence(Sequence::default()),
            ExtendedInfoKind::Tinting => Self::Tinting(Tinting::default()),
            ExtendedInfoKind::NameChange => Self::NameChange(NameChange::default()),
        }
    }

    /// The kind of this payload.
    #[must_use]
    pub const fn kind(&self) -> ExtendedInfoKind {
        match self {
            Self::MoveSpeed(_) => ExtendedInfoKind::MoveSpeed,
            Self::Sequence(_) => ExtendedInfoKind::Sequence,
            Self::Tinting(_) => ExtendedInfoKind::Tinting,
            Self::NameChange(_) => ExtendedInfoKind::NameChange,
        }
    }
}

/// One block of one avatar.
///
/// Holds the semantic value, whether it changed since it was last fully
/// delivered, and the bytes precomputed this tick for each client type.
#[derive(Debug)]
pub struct ExtendedInfoBlock {
    payload: BlockPayload,
    dirty: bool,
    buffers: ClientTypeMap<PrecomputedBuffer>,
    precompute_runs: u64,
}

impl ExtendedInfoBlock {
    /// Creates a clean block holding the default payload.
    #[must_use]
    pub fn new(kind: ExtendedInfoKind) -> Self {
        Self {
            payload: BlockPayload::empty(kind),
            dirty: false,
            buffers: ClientTypeMap::new(),
            precompute_runs: 0,
        }
    }

    /// The block kind.
    #[must_use]
    pub const fn kind(&self) -> ExtendedInfoKind {
        self.payload.kind()
    }

    /// The current semantic value.
    #[must_use]
    pub const fn payload(&self) -> &BlockPayload {
        &self.payload
    }

    /// True if the value changed and has not been delivered to every
    /// observer yet.
    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// True if the value differs from what a fresh client assumes.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.payload != BlockPayload::empty(self.kind())
    }

    /// Number of encoder invocations over the block's lifetime.
    #[must_use]
    pub const fn precompute_runs(&self) -> u64 {
        self.precompute_runs
    }

    /// The bytes precomputed for `client` this tick.
    #[inline]
    #[must_use]
    pub fn buffer(&self, client: ClientType) -> Option<&PrecomputedBuffer> {
        self.buffers.get(client)
    }

    /// Replaces the value and marks the block dirty.
    pub(crate) fn set(&mut self, payload: BlockPayload) {
        debug_assert_eq!(payload.kind(), self.kind(), "payload kind mismatch");
        self.payload = payload;
        self.dirty = true;
    }

    /// Encodes the value for `client` unless already encoded this tick, and
    /// returns the bytes.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::UnsupportedClient`] if no encoder is registered
    /// for `client`.
    pub fn precompute(
        &mut self,
        client: ClientType,
        encoders: &ExtendedInfoEncoders,
        pool: &BufferPool,
    ) -> InfoResult<&PrecomputedBuffer> {
        let payload = &self.payload;
        let runs = &mut self.precompute_runs;
        self.buffers.get_or_try_insert_with(client, || {
            let encoder = encoders
                .get(client)
                .ok_or(InfoError::UnsupportedClient(client))?;
            let mut out = ByteBuf::from_vec(pool.acquire(encoder.size_hint(payload.kind())));
            encoder.encode(payload, encoders.text(), &mut out);
            *runs += 1;
            Ok(PrecomputedBuffer::new(out.into_bytes()))
        })
    }

    /// Returns every precomputed buffer to the pool. The value and dirty
    /// flag are untouched.
    pub fn release_buffers(&mut self, pool: &BufferPool) {
        for buffer in self.buffers.drain() {
            buffer.release(pool);
        }
    }

    /// Marks the block delivered.
    ///
    /// Buffers are released. Transient blocks drop their value; persistent
    /// blocks keep it for future observers.
    pub fn clear(&mut self, pool: &BufferPool) {
        self.release_buffers(pool);
        self.dirty = false;
        if !self.kind().is_persistent() {
            self.payload = BlockPayload::empty(self.kind());
        }
    }
}
