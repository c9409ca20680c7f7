//! The complete set of blocks owned by one avatar.

use meridian_core::{BufferPool, ByteBuf};
use meridian_shared::ClientType;

use super::blocks::{BlockPayload, ExtendedInfoBlock, MoveSpeed, NameChange, Sequence, Tinting};
use super::cache::PrecomputedBuffer;
use super::encoders::ExtendedInfoEncoders;
use super::{BlockMask, ExtendedInfoKind};
use crate::error::{InfoError, InfoResult};

/// Every extended info block of one avatar, indexed by kind.
#[derive(Debug)]
pub struct AvatarExtendedInfo {
    index: u16,
    blocks: [ExtendedInfoBlock; ExtendedInfoKind::COUNT],
}

impl AvatarExtendedInfo {
    /// Creates clean blocks for the avatar at `index`.
    #[must_use]
    pub fn new(index: u16) -> Self {
        Self {
            index,
            blocks: ExtendedInfoKind::ALL.map(ExtendedInfoBlock::new),
        }
    }

    /// The block of `kind`.
    #[inline]
    #[must_use]
    pub fn block(&self, kind: ExtendedInfoKind) -> &ExtendedInfoBlock {
        &self.blocks[kind.id()]
    }

    /// Sets the persistent move speed.
    pub fn set_move_speed(&mut self, value: u8) {
        self.set(BlockPayload::MoveSpeed(MoveSpeed { value }));
    }

    /// Plays an animation sequence.
    pub fn set_sequence(&mut self, id: u16, delay: u8) {
        self.set(BlockPayload::Sequence(Sequence { id, delay }));
    }

    /// Applies a colour tint.
    pub fn set_tinting(&mut self, tinting: Tinting) {
        self.set(BlockPayload::Tinting(tinting));
    }

    /// Changes the display name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.set(BlockPayload::NameChange(NameChange {
            name: Some(name.into()),
        }));
    }

    /// Blocks changed since their last full delivery.
    #[must_use]
    pub fn dirty_mask(&self) -> BlockMask {
        self.mask_where(ExtendedInfoBlock::is_dirty)
    }

    /// Persistent blocks a new observer must receive.
    #[must_use]
    pub fn persistent_mask(&self) -> BlockMask {
        self.mask_where(|block| block.kind().is_persistent() && block.has_value())
    }

    /// Precomputes every block in `mask` for `client`.
    ///
    /// Returns the number of encoder invocations; blocks already cached for
    /// `client` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::UnsupportedClient`] if `client` has no encoder.
    pub fn precompute(
        &mut self,
        mask: BlockMask,
        client: ClientType,
        encoders: &ExtendedInfoEncoders,
        pool: &BufferPool,
    ) -> InfoResult<u64> {
        let mut runs = 0;
        for kind in mask.iter() {
            let block = &mut self.blocks[kind.id()];
            let before = block.precompute_runs();
            block.precompute(client, encoders, pool)?;
            runs += block.precompute_runs() - before;
        }
        Ok(runs)
    }

    /// Size of the mask byte plus every block in `mask` for `client`.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::CacheMiss`] for the first block that was not
    /// precomputed for `client`.
    pub fn encoded_len(&self, mask: BlockMask, client: ClientType) -> InfoResult<usize> {
        let mut len = 1;
        for kind in mask.iter() {
            len += self.cached(kind, client)?.len();
        }
        Ok(len)
    }

    /// Appends the mask byte and the precomputed blocks to `out`.
    ///
    /// Nothing is written unless every block is available.
    ///
    /// # Errors
    ///
    /// Returns [`InfoError::CacheMiss`] for the first missing block.
    pub fn write(&self, mask: BlockMask, client: ClientType, out: &mut ByteBuf) -> InfoResult<()> {
        self.encoded_len(mask, client)?;
        out.p1(mask.bits());
        for kind in mask.iter() {
            out.pdata(self.cached(kind, client)?.as_slice());
        }
        Ok(())
    }

    /// Ends the tick for this avatar.
    ///
    /// If every observer received the dirty blocks they are cleared;
    /// otherwise they stay dirty for the next tick. Buffers are released
    /// either way.
    pub fn finish_tick(&mut self, delivered: bool, pool: &BufferPool) {
        for block in &mut self.blocks {
            if delivered && block.is_dirty() {
                block.clear(pool);
            } else {
                block.release_buffers(pool);
            }
        }
    }

    /// Returns every buffer to the pool without touching values.
    pub fn release_buffers(&mut self, pool: &BufferPool) {
        for block in &mut self.blocks {
            block.release_buffers(pool);
        }
    }

    fn set(&mut self, payload: BlockPayload) {
        self.blocks[payload.kind().id()].set(payload);
    }

    fn mask_where(&self, predicate: impl Fn(&ExtendedInfoBlock) -> bool) -> BlockMask {
        let mut mask = BlockMask::EMPTY;
        for block in self.blocks.iter().filter(|block| predicate(block)) {
            mask.insert(block.kind());
        }
        mask
    }

    fn cached(&self, kind: ExtendedInfoKind, client: ClientType) -> InfoResult<&PrecomputedBuffer> {
        self.block(kind).buffer(client).ok_or(InfoError::CacheMiss {
            index: usize::from(self.index),
            kind,
            client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_and_persistent_masks() {
        let mut info = AvatarExtendedInfo::new(3);
        assert!(info.dirty_mask().is_empty());
        assert!(info.persistent_mask().is_empty());

        info.set_move_speed(MoveSpeed::RUN);
        info.set_sequence(100, 0);
        assert_eq!(info.dirty_mask().bits(), 0x03);
        assert_eq!(info.persistent_mask().bits(), 0x01);
    }

    #[test]
    fn test_write_in_bit_order() {
        let pool = BufferPool::new(8);
        let encoders = ExtendedInfoEncoders::default();
        let mut info = AvatarExtendedInfo::new(3);
        info.set_name("Al");
        info.set_move_speed(MoveSpeed::RUN);

        let mask = info.dirty_mask();
        let runs = info.precompute(mask, ClientType::Desktop, &encoders, &pool).unwrap();
        assert_eq!(runs, 2);
        assert_eq!(info.encoded_len(mask, ClientType::Desktop).unwrap(), 5);

        let mut out = ByteBuf::new();
        info.write(mask, ClientType::Desktop, &mut out).unwrap();
        assert_eq!(out.as_slice(), &[0x09, 254, b'A', b'l', 0]);
    }

    #[test]
    fn test_write_cache_miss_writes_nothing() {
        let mut info = AvatarExtendedInfo::new(9);
        info.set_sequence(1, 1);

        let mut out = ByteBuf::new();
        let result = info.write(info.dirty_mask(), ClientType::Desktop, &mut out);
        assert!(matches!(
            result,
            Err(InfoError::CacheMiss {
                index: 9,
                kind: ExtendedInfoKind::Sequence,
                client: ClientType::Desktop,
            })
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_finish_tick() {
        let pool = BufferPool::new(8);
        let encoders = ExtendedInfoEncoders::default();
        let mut info = AvatarExtendedInfo::new(0);
        info.set_sequence(5, 0);
        let mask = info.dirty_mask();
        info.precompute(mask, ClientType::Desktop, &encoders, &pool).unwrap();

        info.finish_tick(false, &pool);
        assert_eq!(info.dirty_mask(), mask);
        assert!(info.block(ExtendedInfoKind::Sequence).buffer(ClientType::Desktop).is_none());

        info.finish_tick(true, &pool);
        assert!(info.dirty_mask().is_empty());
        assert!(!info.block(ExtendedInfoKind::Sequence).has_value());
    }
}
