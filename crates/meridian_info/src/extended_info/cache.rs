//! Shared, reference-counted precomputed bytes.

use std::sync::Arc;

use meridian_core::BufferPool;

/// Encoded bytes of one block for one client type.
///
/// Cloning shares the bytes. The last owner to [`release`] the buffer hands
/// its allocation back to the pool.
///
/// [`release`]: PrecomputedBuffer::release
#[derive(Clone, Debug)]
pub struct PrecomputedBuffer(Arc<Vec<u8>>);

impl PrecomputedBuffer {
    /// Wraps freshly encoded bytes.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Arc::new(bytes))
    }

    /// The encoded bytes.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Number of encoded bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the block encoded to nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of live handles to these bytes.
    #[must_use]
    pub fn owners(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Drops this handle, recycling the allocation if it was the last one.
    pub fn release(self, pool: &BufferPool) {
        if let Ok(bytes) = Arc::try_unwrap(self.0) {
            pool.release(bytes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_owner_recycles() {
        let pool = BufferPool::new(4);
        let buffer = PrecomputedBuffer::new(vec![1, 2, 3]);
        let copy = buffer.clone();
        assert_eq!(buffer.owners(), 2);

        copy.release(&pool);
        assert_eq!(pool.retained(), 0);
        assert_eq!(buffer.as_slice(), &[1, 2, 3]);

        buffer.release(&pool);
        assert_eq!(pool.retained(), 1);
    }
}
