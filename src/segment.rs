//! A single pooled segment: one rented buffer holding a contiguous run of the
//! container's elements.

use allocator_api2::alloc::Allocator;

use crate::error::{Error, Result};
use crate::pool::{Buffer, BufferPool};

/// One rented buffer plus the global index of its first element.
///
/// The buffer's length is the number of occupied slots. The buffer never grows
/// past the capacity it was rented with, so its storage is never reallocated
/// while the segment owns it.
pub(crate) struct Segment<T, A: Allocator> {
    /// Global index of the first element.
    start: usize,
    /// Capacity of the rented buffer (what the pool actually handed out).
    capacity: usize,
    buffer: Buffer<T, A>,
}

impl<T, A: Allocator> Segment<T, A> {
    /// Wraps a freshly rented buffer whose first element will live at `start`.
    pub(crate) fn new(start: usize, mut buffer: Buffer<T, A>) -> Self {
        debug_assert!(buffer.is_empty(), "pool handed out a non-empty buffer");
        buffer.clear();
        Self {
            start,
            capacity: buffer.capacity(),
            buffer,
        }
    }

    #[inline]
    pub(crate) const fn start(&self) -> usize {
        self.start
    }

    /// One past the global index of the last occupied slot.
    #[inline]
    pub(crate) fn end(&self) -> usize {
        self.start + self.buffer.len()
    }

    #[inline]
    pub(crate) fn occupied(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub(crate) const fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn can_append(&self) -> bool {
        self.buffer.len() < self.capacity
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[T] {
        &self.buffer
    }

    #[inline]
    fn local(&self, global: usize) -> Option<usize> {
        global
            .checked_sub(self.start)
            .filter(|&offset| offset < self.buffer.len())
    }

    #[inline]
    pub(crate) fn get(&self, global: usize) -> Option<&T> {
        self.local(global).map(|offset| &self.buffer[offset])
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, global: usize) -> Option<&mut T> {
        self.local(global).map(move |offset| &mut self.buffer[offset])
    }

    /// Overwrites the element at `global`, returning the old value. `None` if
    /// `global` is not an occupied slot of this segment.
    pub(crate) fn set(&mut self, global: usize, value: T) -> Option<T> {
        self.get_mut(global).map(|slot| std::mem::replace(slot, value))
    }

    /// Appends into the next free slot.
    #[inline]
    pub(crate) fn push(&mut self, value: T) {
        debug_assert!(self.can_append(), "push into a full segment");
        self.buffer.push(value);
    }

    /// Global index of the first element equal to `value`.
    pub(crate) fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.buffer
            .iter()
            .position(|x| x == value)
            .map(|offset| self.start + offset)
    }

    /// Drops every element. The buffer and its capacity are kept.
    pub(crate) fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Makes an empty retained segment the tail again, its first element
    /// landing at `start`.
    pub(crate) fn activate(&mut self, start: usize) {
        debug_assert!(self.buffer.is_empty(), "activating an occupied segment");
        self.start = start;
    }

    /// Removes the element at local `offset`, shifting the tail left.
    #[allow(dead_code)]
    pub(crate) fn remove_at(&mut self, offset: usize) -> Result<T> {
        if offset >= self.buffer.len() {
            return Err(Error::out_of_range(offset, self.buffer.len()));
        }
        Ok(self.buffer.remove(offset))
    }

    /// Hands the buffer back to `pool`. Consumes the segment, so a buffer can
    /// only ever be returned once.
    pub(crate) fn release<P>(self, pool: &P)
    where
        P: BufferPool<T, Alloc = A> + ?Sized,
    {
        pool.give_back(self.buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::FixedPool;

    type TestSegment = Segment<i32, allocator_api2::alloc::Global>;

    fn segment(start: usize, capacity: usize) -> (FixedPool<i32>, TestSegment) {
        let pool = FixedPool::new([capacity]);
        let buffer = pool.rent(capacity).unwrap();
        (pool, Segment::new(start, buffer))
    }

    #[test]
    fn test_push_and_get() {
        let (pool, mut seg) = segment(10, 3);
        assert!(seg.can_append());
        seg.push(1);
        seg.push(2);
        seg.push(3);
        assert!(!seg.can_append());
        assert_eq!(seg.occupied(), 3);
        assert_eq!(seg.end(), 13);

        assert_eq!(seg.get(9), None);
        assert_eq!(seg.get(10), Some(&1));
        assert_eq!(seg.get(12), Some(&3));
        assert_eq!(seg.get(13), None);
        seg.release(&pool);
        assert!(pool.all_returned());
    }

    #[test]
    fn test_set() {
        let (pool, mut seg) = segment(0, 2);
        seg.push(5);
        assert_eq!(seg.set(0, 6), Some(5));
        assert_eq!(seg.get(0), Some(&6));
        assert_eq!(seg.set(1, 7), None);
        assert_eq!(seg.occupied(), 1);
        seg.release(&pool);
    }

    #[test]
    fn test_index_of_is_global() {
        let (pool, mut seg) = segment(100, 4);
        seg.push(4);
        seg.push(8);
        seg.push(8);
        assert_eq!(seg.index_of(&8), Some(101));
        assert_eq!(seg.index_of(&9), None);
        seg.release(&pool);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let (pool, mut seg) = segment(0, 4);
        seg.push(1);
        seg.push(2);
        seg.clear();
        seg.activate(20);
        assert_eq!(seg.occupied(), 0);
        assert_eq!(seg.capacity(), 4);
        assert_eq!(seg.start(), 20);
        assert_eq!(seg.get(20), None);
        seg.push(3);
        assert_eq!(seg.get(20), Some(&3));
        seg.release(&pool);
    }

    #[test]
    fn test_remove_at_shifts_left() {
        let (pool, mut seg) = segment(0, 4);
        for v in [1, 2, 3, 4] {
            seg.push(v);
        }
        assert_eq!(seg.remove_at(1), Ok(2));
        assert_eq!(seg.as_slice(), &[1, 3, 4]);
        assert!(seg.can_append());
        assert!(seg.remove_at(3).is_err());
        seg.release(&pool);
    }
}
