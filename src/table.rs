//! The segment table: ordered segments, index resolution and growth.
//!
//! Segments are kept in a `Vec` ordered by their starting index. The in-use
//! segments `segments[..=active]` are contiguous:
//!
//! ```text
//! segments[i].start == segments[i - 1].start + segments[i - 1].occupied
//! ```
//!
//! Segments after `active` are empty buffers retained across a `clear` so that
//! later appends refill them before renting anything new. The slot vector
//! itself grows geometrically, independently of segment capacities.

use allocator_api2::alloc::Allocator;
use tracing::trace;

use crate::config::GrowthPolicy;
use crate::error::{Error, Result};
use crate::pool::BufferPool;
use crate::segment::Segment;

pub(crate) struct SegmentTable<T, A: Allocator> {
    segments: Vec<Segment<T, A>>,
    /// Index of the tail segment accepting appends; `None` when nothing is in
    /// use.
    active: Option<usize>,
    /// Total number of elements across all in-use segments.
    len: usize,
    policy: GrowthPolicy,
}

impl<T, A: Allocator> SegmentTable<T, A> {
    pub(crate) const fn new(policy: GrowthPolicy) -> Self {
        Self {
            segments: Vec::new(),
            active: None,
            len: 0,
            policy,
        }
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) const fn policy(&self) -> &GrowthPolicy {
        &self.policy
    }

    /// Pre-sizes the slot vector for the number of segments `elements` would
    /// need under the growth policy. Rents nothing.
    pub(crate) fn reserve_slots(&mut self, elements: usize) {
        let needed = self.policy.segments_for(elements);
        self.segments
            .reserve(needed.saturating_sub(self.segments.len()));
    }

    /// Number of segments holding elements.
    #[inline]
    pub(crate) fn in_use_count(&self) -> usize {
        self.active.map_or(0, |i| i + 1)
    }

    /// Segments holding elements, in index order.
    #[inline]
    pub(crate) fn in_use(&self) -> &[Segment<T, A>] {
        &self.segments[..self.in_use_count()]
    }

    /// Number of rented buffers, including empty retained ones.
    #[inline]
    pub(crate) fn rented_count(&self) -> usize {
        self.segments.len()
    }

    /// Total capacity of every rented buffer.
    pub(crate) fn capacity(&self) -> usize {
        self.segments.iter().map(Segment::capacity).sum()
    }

    #[inline]
    pub(crate) fn segment(&self, index: usize) -> Option<&Segment<T, A>> {
        self.in_use().get(index)
    }

    /// Maps a global index to `(segment, offset)`.
    ///
    /// In-use segments are sorted and contiguous, so a binary search over
    /// their starts finds the same segment a front-to-back scan would.
    pub(crate) fn resolve(&self, index: usize) -> Result<(usize, usize)> {
        if index >= self.len {
            return Err(Error::out_of_range(index, self.len));
        }
        let in_use = self.in_use();
        let segment = in_use.partition_point(|seg| seg.start() <= index) - 1;
        let offset = index - in_use[segment].start();
        debug_assert!(offset < in_use[segment].occupied());
        Ok((segment, offset))
    }

    pub(crate) fn get(&self, index: usize) -> Result<&T> {
        let (segment, _) = self.resolve(index)?;
        self.segments[segment]
            .get(index)
            .ok_or(Error::out_of_range(index, self.len))
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        let (segment, _) = self.resolve(index)?;
        let len = self.len;
        self.segments[segment]
            .get_mut(index)
            .ok_or(Error::out_of_range(index, len))
    }

    /// Resolves and overwrites in one step, returning the previous value.
    pub(crate) fn set(&mut self, index: usize, value: T) -> Result<T> {
        let (segment, _) = self.resolve(index)?;
        let len = self.len;
        self.segments[segment]
            .set(index, value)
            .ok_or(Error::out_of_range(index, len))
    }

    /// Appends `value`, moving to a retained segment or renting a new one when
    /// the tail is full.
    pub(crate) fn push<P>(&mut self, value: T, pool: &P) -> Result<()>
    where
        P: BufferPool<T, Alloc = A> + ?Sized,
    {
        let tail = match self.active {
            Some(i) if self.segments[i].can_append() => i,
            _ => self.advance_tail(pool)?,
        };
        self.segments[tail].push(value);
        self.len += 1;
        Ok(())
    }

    #[cold]
    #[inline(never)]
    fn advance_tail<P>(&mut self, pool: &P) -> Result<usize>
    where
        P: BufferPool<T, Alloc = A> + ?Sized,
    {
        let next = self.in_use_count();
        if next < self.segments.len() {
            self.segments[next].activate(self.len);
            trace!(segment = next, start = self.len, "reusing retained segment");
        } else {
            self.append_segment(pool)?;
        }
        self.active = Some(next);
        Ok(next)
    }

    /// Rents a buffer sized by the growth policy and appends it as a new,
    /// empty segment starting at the current length.
    fn append_segment<P>(&mut self, pool: &P) -> Result<()>
    where
        P: BufferPool<T, Alloc = A> + ?Sized,
    {
        let previous = self.segments.last().map(Segment::capacity);
        let requested = self
            .policy
            .next_capacity(previous)
            .min(self.policy.max_capacity());
        let buffer = pool.rent(requested)?;
        if buffer.capacity() == 0 {
            pool.give_back(buffer);
            return Err(Error::PoolExhausted { requested });
        }

        let segment = Segment::new(self.len, buffer);
        trace!(
            segment = self.segments.len(),
            start = self.len,
            requested,
            capacity = segment.capacity(),
            "rented segment"
        );
        self.segments.push(segment);
        Ok(())
    }

    /// Empties every in-use segment. All buffers stay rented.
    pub(crate) fn clear(&mut self) {
        for segment in &mut self.segments[..self.active.map_or(0, |i| i + 1)] {
            segment.clear();
        }
        self.active = None;
        self.len = 0;
    }

    /// Global index of the first element equal to `value`.
    pub(crate) fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.in_use().iter().find_map(|seg| seg.index_of(value))
    }

    /// Clones every element, in order, into `dest`, which must be exactly
    /// `len` long.
    pub(crate) fn copy_into(&self, dest: &mut [T])
    where
        T: Clone,
    {
        debug_assert_eq!(dest.len(), self.len);
        let mut offset = 0;
        for segment in self.in_use() {
            let src = segment.as_slice();
            dest[offset..offset + src.len()].clone_from_slice(src);
            offset += src.len();
        }
    }

    /// Returns every buffer, in use or retained, to `pool` and leaves the
    /// table empty. Returns how many buffers were handed back.
    pub(crate) fn release_all<P>(&mut self, pool: &P) -> usize
    where
        P: BufferPool<T, Alloc = A> + ?Sized,
    {
        let count = self.segments.len();
        for segment in self.segments.drain(..) {
            segment.release(pool);
        }
        self.active = None;
        self.len = 0;
        count
    }
}
