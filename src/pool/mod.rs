//! The buffer pool contract consumed by `PooledVec`, and two implementations.
//!
//! A pool rents out empty buffers of at least a requested capacity and takes
//! them back once the renter is done. `PooledVec` rents one buffer per segment
//! and hands every buffer back exactly once, when it is disposed or dropped.
//!
//! - [`HeapPool`] keeps returned buffers in power-of-two size classes so the
//!   next renter gets them without touching the allocator.
//! - [`FixedPool`] hands out a fixed inventory in order and records what came
//!   back. It exists to verify the rent/return discipline in tests.

mod fixed;
mod heap;

use std::rc::Rc;
use std::sync::Arc;

use allocator_api2::alloc::Allocator;

use crate::error::Result;

pub use fixed::FixedPool;
pub use heap::{HeapPool, HeapPoolConfig, PoolStats};

/// A rented buffer. `len()` is zero on rent; `capacity()` is what the segment
/// may fill.
pub type Buffer<T, A> = allocator_api2::vec::Vec<T, A>;

/// Source of reusable buffers.
///
/// Implementations must hand out buffers with `len() == 0`. The returned
/// capacity may exceed `minimum`; callers use the actual capacity.
pub trait BufferPool<T> {
    /// Allocator backing the buffers this pool hands out.
    type Alloc: Allocator;

    /// Rents a buffer able to hold at least `minimum` elements.
    fn rent(&self, minimum: usize) -> Result<Buffer<T, Self::Alloc>>;

    /// Takes back a buffer previously obtained from [`rent`](Self::rent).
    ///
    /// Returning a buffer twice, or one this pool never rented, violates the
    /// contract.
    fn give_back(&self, buffer: Buffer<T, Self::Alloc>);
}

impl<T, P: BufferPool<T> + ?Sized> BufferPool<T> for &P {
    type Alloc = P::Alloc;

    #[inline]
    fn rent(&self, minimum: usize) -> Result<Buffer<T, Self::Alloc>> {
        (**self).rent(minimum)
    }

    #[inline]
    fn give_back(&self, buffer: Buffer<T, Self::Alloc>) {
        (**self).give_back(buffer)
    }
}

impl<T, P: BufferPool<T> + ?Sized> BufferPool<T> for Rc<P> {
    type Alloc = P::Alloc;

    #[inline]
    fn rent(&self, minimum: usize) -> Result<Buffer<T, Self::Alloc>> {
        (**self).rent(minimum)
    }

    #[inline]
    fn give_back(&self, buffer: Buffer<T, Self::Alloc>) {
        (**self).give_back(buffer)
    }
}

impl<T, P: BufferPool<T> + ?Sized> BufferPool<T> for Arc<P> {
    type Alloc = P::Alloc;

    #[inline]
    fn rent(&self, minimum: usize) -> Result<Buffer<T, Self::Alloc>> {
        (**self).rent(minimum)
    }

    #[inline]
    fn give_back(&self, buffer: Buffer<T, Self::Alloc>) {
        (**self).give_back(buffer)
    }
}
