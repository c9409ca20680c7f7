//! # Buffer Pool
//!
//! Recycles byte vectors between ticks so precomputation and packet
//! encoding stop hitting the allocator once the server is warm.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Counters describing pool traffic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferPoolStats {
    /// Buffers handed out.
    pub acquired: u64,
    /// Buffers handed out that came from the free list.
    pub reused: u64,
    /// Buffers given back.
    pub released: u64,
}

/// A thread-safe pool of reusable byte buffers.
///
/// Any number of workers may acquire and release concurrently; the only
/// shared state is the free list behind a short critical section.
///
/// # Example
///
/// ```rust
/// use meridian_core::BufferPool;
///
/// let pool = BufferPool::new(16);
/// let mut buf = pool.acquire(32);
/// buf.push(7);
/// pool.release(buf);
///
/// let again = pool.acquire(8);
/// assert!(again.is_empty());
/// assert_eq!(pool.stats().reused, 1);
/// ```
pub struct BufferPool {
    /// Cleared buffers ready for reuse.
    free: Mutex<Vec<Vec<u8>>>,
    /// Maximum number of buffers kept on the free list.
    max_retained: usize,
    acquired: AtomicU64,
    reused: AtomicU64,
    released: AtomicU64,
}

impl BufferPool {
    /// Creates an empty pool that retains at most `max_retained` buffers.
    #[must_use]
    pub fn new(max_retained: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(max_retained.min(1024))),
            max_retained,
            acquired: AtomicU64::new(0),
            reused: AtomicU64::new(0),
            released: AtomicU64::new(0),
        }
    }

    /// Takes an empty buffer with at least `min_capacity` bytes reserved.
    #[must_use]
    pub fn acquire(&self, min_capacity: usize) -> Vec<u8> {
        self.acquired.fetch_add(1, Ordering::Relaxed);

        let recycled = self.free.lock().pop();
        match recycled {
            Some(mut buf) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                buf.reserve(min_capacity);
                buf
            }
            None => Vec::with_capacity(min_capacity),
        }
    }

    /// Returns a buffer to the pool.
    ///
    /// The contents are discarded. Buffers beyond the retention limit are
    /// simply dropped.
    pub fn release(&self, mut buf: Vec<u8>) {
        self.released.fetch_add(1, Ordering::Relaxed);
        buf.clear();

        let mut free = self.free.lock();
        if free.len() < self.max_retained {
            free.push(buf);
        }
    }

    /// Returns the number of buffers currently waiting for reuse.
    #[must_use]
    pub fn retained(&self) -> usize {
        self.free.lock().len()
    }

    /// Returns the traffic counters.
    #[must_use]
    pub fn stats(&self) -> BufferPoolStats {
        BufferPoolStats {
            acquired: self.acquired.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(4096)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release_reuse() {
        let pool = BufferPool::new(4);
        let mut buf = pool.acquire(16);
        buf.extend_from_slice(&[1, 2, 3]);
        pool.release(buf);
        assert_eq!(pool.retained(), 1);

        let buf = pool.acquire(4);
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 16);
        assert_eq!(pool.retained(), 0);

        let stats = pool.stats();
        assert_eq!(stats.acquired, 2);
        assert_eq!(stats.reused, 1);
        assert_eq!(stats.released, 1);
    }

    #[test]
    fn test_retention_limit() {
        let pool = BufferPool::new(1);
        pool.release(Vec::new());
        pool.release(Vec::new());
        assert_eq!(pool.retained(), 1);
        assert_eq!(pool.stats().released, 2);
    }

    #[test]
    fn test_concurrent_use() {
        let pool = BufferPool::new(64);
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        let buf = pool.acquire(8);
                        pool.release(buf);
                    }
                });
            }
        });
        assert_eq!(pool.stats().acquired, 400);
        assert!(pool.retained() <= 4);
    }
}
