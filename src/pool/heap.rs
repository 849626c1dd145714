//! Size-class heap pool.

use allocator_api2::alloc::{Allocator, Global};
use parking_lot::Mutex;
use tracing::{trace, warn};

use super::{Buffer, BufferPool};
use crate::config::MAX_SEGMENT_CAPACITY;
use crate::error::Result;

/// Configuration for a [`HeapPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapPoolConfig {
    /// Buffers with a larger capacity are allocated exactly and freed on
    /// return instead of being kept.
    pub max_pooled_capacity: usize,
    /// How many idle buffers each size class keeps.
    pub max_retained_per_class: usize,
}

impl Default for HeapPoolConfig {
    fn default() -> Self {
        Self {
            max_pooled_capacity: MAX_SEGMENT_CAPACITY,
            max_retained_per_class: 32,
        }
    }
}

/// Counters describing a pool's traffic since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Successful `rent` calls.
    pub rented: usize,
    /// `give_back` calls.
    pub returned: usize,
    /// Rents that had to allocate a fresh buffer.
    pub allocated: usize,
    /// Returned buffers that were freed rather than kept.
    pub discarded: usize,
}

struct Inner<T, A: Allocator> {
    /// Idle buffers; `classes[k]` holds buffers of capacity `1 << k`.
    classes: Vec<Vec<Buffer<T, A>>>,
    stats: PoolStats,
}

/// A buffer pool that rounds requests up to a power of two and recycles
/// returned buffers per size class.
///
/// The pool is `Sync` when `T` and the allocator are `Send`, so a single pool
/// can be shared between containers through `&HeapPool`, `Rc` or `Arc`.
pub struct HeapPool<T, A: Allocator + Clone = Global> {
    config: HeapPoolConfig,
    alloc: A,
    inner: Mutex<Inner<T, A>>,
}

impl<T> HeapPool<T> {
    /// Creates an empty pool with the default configuration.
    pub fn new() -> Self {
        Self::with_config_in(HeapPoolConfig::default(), Global)
    }

    /// Creates an empty pool with the given configuration.
    pub fn with_config(config: HeapPoolConfig) -> Self {
        Self::with_config_in(config, Global)
    }
}

impl<T> Default for HeapPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: Allocator + Clone> HeapPool<T, A> {
    /// Creates an empty pool that allocates through `alloc`.
    pub fn new_in(alloc: A) -> Self {
        Self::with_config_in(HeapPoolConfig::default(), alloc)
    }

    /// Creates an empty pool with the given configuration and allocator.
    pub fn with_config_in(config: HeapPoolConfig, alloc: A) -> Self {
        Self {
            config,
            alloc,
            inner: Mutex::new(Inner {
                classes: Vec::new(),
                stats: PoolStats::default(),
            }),
        }
    }

    /// Returns the pool configuration.
    #[inline]
    pub fn config(&self) -> &HeapPoolConfig {
        &self.config
    }

    /// Returns the allocator buffers are obtained from.
    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Returns a snapshot of the traffic counters.
    pub fn stats(&self) -> PoolStats {
        self.inner.lock().stats
    }

    /// Number of idle buffers currently held.
    pub fn retained(&self) -> usize {
        self.inner.lock().classes.iter().map(Vec::len).sum()
    }

    /// Capacity a request for `minimum` elements is rounded up to, or `None`
    /// when the request is too large to pool.
    fn class_capacity(&self, minimum: usize) -> Option<usize> {
        let cap = minimum.max(1).checked_next_power_of_two()?;
        (cap <= self.config.max_pooled_capacity).then_some(cap)
    }
}

impl<T, A: Allocator + Clone> BufferPool<T> for HeapPool<T, A> {
    type Alloc = A;

    fn rent(&self, minimum: usize) -> Result<Buffer<T, A>> {
        let Some(cap) = self.class_capacity(minimum) else {
            {
                let mut inner = self.inner.lock();
                inner.stats.rented += 1;
                inner.stats.allocated += 1;
            }
            trace!(minimum, "renting unpooled buffer");
            return Ok(Buffer::with_capacity_in(minimum, self.alloc.clone()));
        };

        let class = cap.trailing_zeros() as usize;
        let reused = {
            let mut inner = self.inner.lock();
            inner.stats.rented += 1;
            let reused = inner.classes.get_mut(class).and_then(Vec::pop);
            if reused.is_none() {
                inner.stats.allocated += 1;
            }
            reused
        };

        if let Some(buffer) = reused {
            trace!(minimum, capacity = buffer.capacity(), "pool hit");
            return Ok(buffer);
        }

        // Allocate outside the lock.
        trace!(minimum, capacity = cap, "pool miss, allocating");
        Ok(Buffer::with_capacity_in(cap, self.alloc.clone()))
    }

    fn give_back(&self, mut buffer: Buffer<T, A>) {
        buffer.clear();
        let cap = buffer.capacity();

        let mut inner = self.inner.lock();
        inner.stats.returned += 1;

        if !cap.is_power_of_two() || cap > self.config.max_pooled_capacity {
            inner.stats.discarded += 1;
            trace!(capacity = cap, "freeing unpooled buffer");
            return;
        }

        let class = cap.trailing_zeros() as usize;
        if inner.classes.len() <= class {
            inner.classes.resize_with(class + 1, Vec::new);
        }
        if inner.classes[class].len() >= self.config.max_retained_per_class {
            inner.stats.discarded += 1;
            warn!(
                capacity = cap,
                limit = self.config.max_retained_per_class,
                "size class full, freeing returned buffer"
            );
            return;
        }
        inner.classes[class].push(buffer);
    }
}

impl<T, A: Allocator + Clone> std::fmt::Debug for HeapPool<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapPool")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .field("retained", &self.retained())
            .finish()
    }
}
