//! Deterministic fixed-inventory pool for exercising the rent/return protocol.

use allocator_api2::alloc::Global;
use parking_lot::Mutex;

use super::{Buffer, BufferPool};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Available,
    Rented,
    Returned,
}

struct Slot<T> {
    /// Address of the buffer's storage; identifies it when it comes back.
    addr: usize,
    capacity: usize,
    state: SlotState,
    /// Holds the buffer while available and after it has been returned, so
    /// its address stays unique for the life of the pool.
    buffer: Option<Buffer<T, Global>>,
}

struct Inner<T> {
    slots: Vec<Slot<T>>,
    next: usize,
    rents: usize,
    returns: usize,
}

/// A pool with a fixed inventory of pre-allocated buffers.
///
/// Buffers are handed out in inventory order regardless of the requested size,
/// so tests can force exact segment capacities. Every buffer can be rented
/// once. `rent` fails with [`Error::PoolExhausted`] once the inventory is used
/// up; returning a buffer twice, or one the pool never rented, panics.
///
/// Buffers are recognized by the address of their storage, so capacities must
/// be non-zero and `T` must not be zero-sized.
pub struct FixedPool<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> FixedPool<T> {
    /// Creates a pool holding one buffer per entry of `capacities`.
    ///
    /// # Panics
    ///
    /// Panics if any capacity is zero or `T` is zero-sized.
    pub fn new(capacities: impl IntoIterator<Item = usize>) -> Self {
        assert!(
            std::mem::size_of::<T>() != 0,
            "FixedPool cannot track zero-sized element buffers"
        );
        let slots = capacities
            .into_iter()
            .map(|capacity| {
                assert!(capacity > 0, "FixedPool buffer capacity must be non-zero");
                let buffer: Buffer<T, Global> = Buffer::with_capacity(capacity);
                Slot {
                    addr: buffer.as_ptr() as usize,
                    capacity: buffer.capacity(),
                    state: SlotState::Available,
                    buffer: Some(buffer),
                }
            })
            .collect();
        Self {
            inner: Mutex::new(Inner {
                slots,
                next: 0,
                rents: 0,
                returns: 0,
            }),
        }
    }

    /// Creates a pool of `count` buffers that all have capacity `capacity`.
    pub fn uniform(capacity: usize, count: usize) -> Self {
        Self::new(std::iter::repeat(capacity).take(count))
    }

    /// Number of successful `rent` calls.
    pub fn rent_count(&self) -> usize {
        self.inner.lock().rents
    }

    /// Number of buffers given back.
    pub fn return_count(&self) -> usize {
        self.inner.lock().returns
    }

    /// Number of buffers currently rented and not yet returned.
    pub fn outstanding(&self) -> usize {
        let inner = self.inner.lock();
        inner.rents - inner.returns
    }

    /// Returns `true` if every buffer that was rented has been returned.
    pub fn all_returned(&self) -> bool {
        self.inner
            .lock()
            .slots
            .iter()
            .all(|slot| slot.state != SlotState::Rented)
    }

    /// Capacities of the buffers not yet handed out.
    pub fn remaining(&self) -> Vec<usize> {
        let inner = self.inner.lock();
        inner.slots[inner.next..]
            .iter()
            .map(|slot| slot.capacity)
            .collect()
    }
}

impl<T> BufferPool<T> for FixedPool<T> {
    type Alloc = Global;

    fn rent(&self, minimum: usize) -> Result<Buffer<T, Global>> {
        let mut inner = self.inner.lock();
        let next = inner.next;
        let slot = inner
            .slots
            .get_mut(next)
            .ok_or(Error::PoolExhausted { requested: minimum })?;
        let buffer = slot
            .buffer
            .take()
            .ok_or(Error::PoolExhausted { requested: minimum })?;
        slot.state = SlotState::Rented;
        inner.next += 1;
        inner.rents += 1;
        Ok(buffer)
    }

    fn give_back(&self, mut buffer: Buffer<T, Global>) {
        let addr = buffer.as_ptr() as usize;
        let mut inner = self.inner.lock();
        let slot = inner
            .slots
            .iter_mut()
            .find(|slot| slot.addr == addr)
            .expect("buffer was not rented from this pool");
        match slot.state {
            SlotState::Rented => {
                buffer.clear();
                slot.state = SlotState::Returned;
                slot.buffer = Some(buffer);
            }
            SlotState::Returned => panic!("buffer returned to the pool twice"),
            SlotState::Available => panic!("buffer returned before it was rented"),
        }
        inner.returns += 1;
    }
}

impl<T> std::fmt::Debug for FixedPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("FixedPool")
            .field("buffers", &inner.slots.len())
            .field("rents", &inner.rents)
            .field("returns", &inner.returns)
            .finish()
    }
}
