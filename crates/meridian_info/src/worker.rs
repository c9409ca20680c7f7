//! # Worker Pool
//!
//! Runs the parallel tick phases over chunks of a mutable slice.
//!
//! ## Execution Model
//!
//! ```text
//!            items: [ chunk 0 | chunk 1 | chunk 2 | ... ]
//!                        │         │         │
//!                        ▼         ▼         ▼
//!                   ┌─────────────────────────────┐
//!                   │   crossbeam work channel    │
//!                   └─────────────────────────────┘
//!                      │          │          │
//!                  worker 0   worker 1   worker N
//!                      │          │          │
//!                      └──────────┴──────────┘
//!                                 │
//!                        scope end = barrier
//! ```
//!
//! Each chunk is handed out exactly once, so every worker holds exclusive
//! access to its items. The call returns only after every chunk has been
//! processed, which is what separates one tick phase from the next.
//! With a single worker, or a slice that fits in one chunk, everything
//! runs inline on the calling thread.

use crossbeam_channel::unbounded;

/// Fixed-size pool of scoped worker threads.
#[derive(Clone, Copy, Debug)]
pub struct WorkerPool {
    workers: usize,
    chunk_size: usize,
}

impl WorkerPool {
    /// Creates a pool. Zero values are raised to 1.
    #[must_use]
    pub fn new(workers: usize, chunk_size: usize) -> Self {
        Self {
            workers: workers.max(1),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Number of worker threads.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Items handed out per chunk.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Applies `task` to every item and waits for all of them.
    pub fn for_each_mut<T, F>(&self, items: &mut [T], task: F)
    where
        T: Send,
        F: Fn(&mut T) + Sync,
    {
        if self.workers == 1 || items.len() <= self.chunk_size {
            items.iter_mut().for_each(task);
            return;
        }

        let chunk_count = items.len().div_ceil(self.chunk_size);
        let (sender, receiver) = unbounded();
        for chunk in items.chunks_mut(self.chunk_size) {
            if sender.send(chunk).is_err() {
                break;
            }
        }
        drop(sender);

        let task = &task;
        std::thread::scope(|scope| {
            for _ in 0..self.workers.min(chunk_count) {
                let receiver = receiver.clone();
                scope.spawn(move || {
                    while let Ok(chunk) = receiver.recv() {
                        chunk.iter_mut().for_each(task);
                    }
                });
            }
        });
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(num_cpus::get(), 16)
    }
}
