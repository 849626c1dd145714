//! Iteration over `PooledVec`.
//!
//! [`Iter`] borrows the container, so the borrow checker already rules out
//! mutation while it is alive. [`Cursor`] holds no borrow: it remembers a
//! position and the container version it was created at, and every step checks
//! that the container has not been structurally modified since.

use allocator_api2::alloc::{Allocator, Global};

use crate::error::{Error, Result};
use crate::pool::BufferPool;
use crate::segment::Segment;
use crate::PooledVec;

/// An iterator over references to the elements of a `PooledVec`.
pub struct Iter<'a, T, A: Allocator = Global> {
    /// In-use segments not yet started.
    pub(crate) segments: std::slice::Iter<'a, Segment<T, A>>,
    /// Remaining elements of the current segment.
    pub(crate) current: std::slice::Iter<'a, T>,
    /// Elements not yet yielded.
    pub(crate) remaining: usize,
}

impl<'a, T, A: Allocator> Iter<'a, T, A> {
    pub(crate) fn new(segments: &'a [Segment<T, A>], len: usize) -> Self {
        Self {
            segments: segments.iter(),
            current: <&[T]>::default().iter(),
            remaining: len,
        }
    }

    #[cold]
    fn next_segment(&mut self) -> Option<&'a T> {
        for segment in self.segments.by_ref() {
            self.current = segment.as_slice().iter();
            if let Some(item) = self.current.next() {
                self.remaining -= 1;
                return Some(item);
            }
        }
        None
    }
}

impl<'a, T, A: Allocator> Iterator for Iter<'a, T, A> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(item) = self.current.next() {
            self.remaining -= 1;
            return Some(item);
        }
        self.next_segment()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, A: Allocator> ExactSizeIterator for Iter<'_, T, A> {}

impl<T, A: Allocator> std::iter::FusedIterator for Iter<'_, T, A> {}

impl<T, A: Allocator> Clone for Iter<'_, T, A> {
    fn clone(&self) -> Self {
        Self {
            segments: self.segments.clone(),
            current: self.current.clone(),
            remaining: self.remaining,
        }
    }
}

/// A detached, change-tracked position in a `PooledVec`.
///
/// Created by [`PooledVec::cursor`]. Each [`advance`](Cursor::advance)
/// re-reads the container and fails with
/// [`Error::ConcurrentModification`] if an append, clear or dispose happened
/// since the cursor was created. After such a failure the cursor must not be
/// reused.
///
/// A cursor belongs to the container that created it; passing a different
/// container is a logic error.
///
/// ```
/// use pooled_vec::{Error, PooledVec};
///
/// let mut vec: PooledVec<i32> = PooledVec::new();
/// vec.extend([1, 2, 3]);
///
/// let mut cursor = vec.cursor();
/// assert_eq!(cursor.advance(&vec).unwrap(), Some(&1));
///
/// vec.push(4);
/// assert!(matches!(
///     cursor.advance(&vec),
///     Err(Error::ConcurrentModification { .. })
/// ));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    version: u64,
    /// Global index of the next element.
    index: usize,
    /// Segment holding the next element.
    segment: usize,
    /// Offset of the next element within `segment`.
    offset: usize,
}

impl Cursor {
    pub(crate) const fn new(version: u64) -> Self {
        Self {
            version,
            index: 0,
            segment: 0,
            offset: 0,
        }
    }

    /// Global index of the element the next `advance` will yield.
    #[inline]
    pub const fn position(&self) -> usize {
        self.index
    }

    #[inline]
    fn check<T, P: BufferPool<T>>(&self, vec: &PooledVec<T, P>) -> Result<()> {
        if self.version != vec.version() {
            return Err(Error::ConcurrentModification {
                expected: self.version,
                found: vec.version(),
            });
        }
        Ok(())
    }

    /// Yields the next element, or `Ok(None)` once the end is reached.
    pub fn advance<'v, T, P: BufferPool<T>>(
        &mut self,
        vec: &'v PooledVec<T, P>,
    ) -> Result<Option<&'v T>> {
        self.check(vec)?;
        if self.index >= vec.len() {
            return Ok(None);
        }

        loop {
            let segment = vec
                .table
                .segment(self.segment)
                .ok_or(Error::out_of_range(self.index, vec.len()))?;
            if let Some(item) = segment.as_slice().get(self.offset) {
                self.offset += 1;
                self.index += 1;
                return Ok(Some(item));
            }
            self.segment += 1;
            self.offset = 0;
        }
    }

    /// Moves back to the first element. Fails if the container was modified.
    pub fn reset<T, P: BufferPool<T>>(&mut self, vec: &PooledVec<T, P>) -> Result<()> {
        self.check(vec)?;
        self.index = 0;
        self.segment = 0;
        self.offset = 0;
        Ok(())
    }
}
