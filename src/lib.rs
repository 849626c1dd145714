//! A segmented growable vector whose segments are rented from a buffer pool.
//!
//! `PooledVec` is meant for very large sequences (tens of millions of
//! elements). Instead of one contiguous allocation that is copied on every
//! growth step, elements live in a list of segments. Each segment is a buffer
//! rented from a [`BufferPool`], and every buffer goes back to the pool exactly
//! once, when the vector is disposed or dropped. Clearing the vector keeps the
//! buffers, so refilling it does not touch the pool at all.
//!
//! The container only appends at the tail; indexed reads and writes, search and
//! bulk copy-out are supported, but arbitrary-position insertion and removal
//! are not.
//!
//! # Example
//!
//! ```
//! use pooled_vec::PooledVec;
//!
//! let mut vec: PooledVec<String> = PooledVec::new();
//! for i in 0..1000 {
//!     vec.push(i.to_string());
//! }
//!
//! assert_eq!(vec.len(), 1000);
//! assert_eq!(vec.get(42).unwrap(), "42");
//! assert_eq!(vec.index_of(&"999".to_string()), Some(999));
//!
//! // Buffers go back to the pool here; dropping the vector would do the same.
//! vec.dispose();
//! ```
//!
//! # Sharing a pool
//!
//! ```
//! use pooled_vec::{Config, HeapPool, PooledVec};
//!
//! let pool: HeapPool<u64> = HeapPool::new();
//! {
//!     let mut a = PooledVec::new_in(&pool);
//!     a.extend(0..10_000u64);
//! }
//! // The second vector reuses the buffers the first one returned.
//! let mut b = PooledVec::with_config_in(Config::default(), &pool).unwrap();
//! b.extend(0..10_000u64);
//! assert!(pool.stats().rented > pool.stats().allocated);
//! ```

#![forbid(unsafe_code)]

mod config;
mod error;
mod iter;
pub mod pool;
mod segment;
mod table;

pub use config::{Config, GrowthPolicy, DEFAULT_INITIAL_SEGMENT_CAPACITY, MAX_SEGMENT_CAPACITY};
pub use error::{Error, Result};
pub use iter::{Cursor, Iter};
pub use pool::{BufferPool, FixedPool, HeapPool, HeapPoolConfig, PoolStats};

use std::ops::{Index, IndexMut};

use tracing::debug;

use table::SegmentTable;

/// A growable, indexable sequence stored in pool-rented segments.
///
/// `P` is the pool buffers are rented from. The default, [`HeapPool`], is
/// private to the vector when created through [`PooledVec::new`]; pass `&pool`,
/// `Rc<pool>` or `Arc<pool>` to [`PooledVec::new_in`] to share one pool
/// between many vectors.
///
/// Every append, clear and dispose bumps an internal version counter that
/// [`Cursor`] uses to detect modification during iteration.
pub struct PooledVec<T, P: BufferPool<T> = HeapPool<T>> {
    pub(crate) table: SegmentTable<T, P::Alloc>,
    pool: P,
    /// Bumped by every structural mutation.
    version: u64,
    disposed: bool,
}

impl<T> PooledVec<T> {
    /// Creates an empty vector with its own heap pool.
    ///
    /// Does not rent anything until elements are pushed.
    ///
    /// # Example
    ///
    /// ```
    /// use pooled_vec::PooledVec;
    /// let vec: PooledVec<i32> = PooledVec::new();
    /// assert!(vec.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::new_in(HeapPool::new())
    }

    /// Creates an empty vector whose segment list is pre-sized for `capacity`
    /// elements. No buffers are rented up front.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_in(capacity, HeapPool::new())
    }

    /// Creates an empty vector with its own heap pool and the given config.
    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_config_in(config, HeapPool::new())
    }
}

impl<T> Default for PooledVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P: BufferPool<T>> PooledVec<T, P> {
    /// Creates an empty vector renting from `pool`.
    pub fn new_in(pool: P) -> Self {
        Self {
            table: SegmentTable::new(GrowthPolicy::default()),
            pool,
            version: 0,
            disposed: false,
        }
    }

    /// Creates an empty vector renting from `pool`, with the segment list
    /// pre-sized for `capacity` elements.
    pub fn with_capacity_in(capacity: usize, pool: P) -> Self {
        let mut vec = Self::new_in(pool);
        vec.table.reserve_slots(capacity);
        vec
    }

    /// Creates an empty vector renting from `pool` with a validated config.
    ///
    /// # Example
    ///
    /// ```
    /// use pooled_vec::{Config, FixedPool, PooledVec};
    ///
    /// let pool: FixedPool<i32> = FixedPool::uniform(5, 3);
    /// let mut vec = PooledVec::with_config_in(Config::fixed(5), &pool).unwrap();
    /// vec.extend(0..11);
    /// assert_eq!(vec.segment_lens(), vec![5, 5, 1]);
    /// ```
    pub fn with_config_in(config: Config, pool: P) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            table: SegmentTable::new(config.growth),
            pool,
            version: 0,
            disposed: false,
        })
    }

    /// Returns the number of elements in the vector.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the vector contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Total capacity of every rented buffer, including ones emptied by
    /// [`clear`](Self::clear).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Number of segments currently holding elements.
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.table.in_use_count()
    }

    /// Occupied length of each in-use segment, in order.
    pub fn segment_lens(&self) -> Vec<usize> {
        self.table.in_use().iter().map(|s| s.occupied()).collect()
    }

    /// Global index of the first element of each in-use segment.
    pub fn segment_starts(&self) -> Vec<usize> {
        self.table.in_use().iter().map(|s| s.start()).collect()
    }

    /// Current value of the modification counter.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns `true` once [`dispose`](Self::dispose) has run.
    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Returns the configuration the vector was built with.
    pub fn config(&self) -> Config {
        Config {
            growth: *self.table.policy(),
        }
    }

    /// Returns the pool buffers are rented from.
    #[inline]
    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// Returns a reference to the element at `index`.
    ///
    /// # Example
    ///
    /// ```
    /// use pooled_vec::{Error, PooledVec};
    /// let mut vec: PooledVec<i32> = PooledVec::new();
    /// vec.push(10);
    /// assert_eq!(vec.get(0), Ok(&10));
    /// assert_eq!(vec.get(1), Err(Error::IndexOutOfRange { index: 1, len: 1 }));
    /// ```
    #[inline]
    pub fn get(&self, index: usize) -> Result<&T> {
        self.table.get(index)
    }

    /// Returns a mutable reference to the element at `index`.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        self.table.get_mut(index)
    }

    /// Replaces the element at `index`, returning the previous value.
    ///
    /// Not a structural change: cursors stay valid.
    pub fn set(&mut self, index: usize, value: T) -> Result<T> {
        self.table.set(index, value)
    }

    /// Appends an element to the back of the vector.
    ///
    /// # Panics
    ///
    /// Panics if the pool cannot supply a buffer or the vector has been
    /// disposed. Use [`try_push`](Self::try_push) to handle those cases.
    ///
    /// # Example
    ///
    /// ```
    /// use pooled_vec::PooledVec;
    /// let mut vec: PooledVec<i32> = PooledVec::new();
    /// vec.push(1);
    /// vec.push(2);
    /// assert_eq!(vec.len(), 2);
    /// ```
    #[inline]
    pub fn push(&mut self, value: T) {
        if let Err(err) = self.try_push(value) {
            panic!("PooledVec::push failed: {err}");
        }
    }

    /// Appends an element, renting a new segment if the tail is full.
    ///
    /// Fails with [`Error::Disposed`] after disposal, or with the pool's error
    /// if it cannot supply a buffer. On failure the vector is unchanged.
    pub fn try_push(&mut self, value: T) -> Result<()> {
        if self.disposed {
            return Err(Error::Disposed);
        }
        self.table.push(value, &self.pool)?;
        self.version += 1;
        Ok(())
    }

    /// Removes every element. Buffers stay rented and are refilled by later
    /// appends before anything new is rented.
    pub fn clear(&mut self) {
        let len = self.table.len();
        self.table.clear();
        self.version += 1;
        debug!(
            cleared = len,
            retained = self.table.rented_count(),
            "cleared PooledVec"
        );
    }

    /// Returns `true` if the vector contains an element equal to `value`.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.table.index_of(value).is_some()
    }

    /// Index of the first element equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.table.index_of(value)
    }

    /// Clones every element, in order, into `dest[start..start + len]`.
    ///
    /// # Example
    ///
    /// ```
    /// use pooled_vec::PooledVec;
    /// let mut vec: PooledVec<i32> = PooledVec::new();
    /// vec.extend([1, 2, 3]);
    /// let mut out = [0; 5];
    /// vec.copy_into(&mut out, 1).unwrap();
    /// assert_eq!(out, [0, 1, 2, 3, 0]);
    /// ```
    pub fn copy_into(&self, dest: &mut [T], start: usize) -> Result<()>
    where
        T: Clone,
    {
        let required = start
            .checked_add(self.len())
            .filter(|&end| end <= dest.len())
            .ok_or(Error::DestinationTooSmall {
                required: start.saturating_add(self.len()),
                available: dest.len(),
            })?;
        self.table.copy_into(&mut dest[start..required]);
        Ok(())
    }

    /// Copies the elements into a new `Vec`.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut out = Vec::with_capacity(self.len());
        for segment in self.table.in_use() {
            out.extend_from_slice(segment.as_slice());
        }
        out
    }

    /// Not supported: the vector only grows at the tail.
    pub fn insert(&mut self, _index: usize, _value: T) -> Result<()> {
        Err(Error::unsupported("insert"))
    }

    /// Not supported: the vector only shrinks through [`clear`](Self::clear).
    pub fn remove_at(&mut self, _index: usize) -> Result<T> {
        Err(Error::unsupported("remove_at"))
    }

    /// Removes the first element equal to `value`.
    ///
    /// Returns `Ok(false)` when no element matches. Removal itself goes through
    /// [`remove_at`](Self::remove_at), so a match fails with
    /// [`Error::Unsupported`].
    pub fn remove(&mut self, value: &T) -> Result<bool>
    where
        T: PartialEq,
    {
        match self.index_of(value) {
            Some(index) => self.remove_at(index).map(|_| true),
            None => Ok(false),
        }
    }

    /// Returns an iterator over references to the elements.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T, P::Alloc> {
        Iter::new(self.table.in_use(), self.len())
    }

    /// Returns a detached cursor at the first element that fails once the
    /// vector is structurally modified.
    #[inline]
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.version)
    }

    /// Returns every rented buffer to the pool and empties the vector.
    ///
    /// Safe to call more than once: only the first call returns buffers.
    /// Appending afterwards fails with [`Error::Disposed`]. Dropping the vector
    /// disposes it.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        let released = self.table.release_all(&self.pool);
        self.disposed = true;
        self.version += 1;
        debug!(released, "disposed PooledVec");
    }
}

impl<T, P: BufferPool<T>> Drop for PooledVec<T, P> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T, P: BufferPool<T>> Index<usize> for PooledVec<T, P> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        match self.get(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T, P: BufferPool<T>> IndexMut<usize> for PooledVec<T, P> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        match self.get_mut(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T, P: BufferPool<T>> Extend<T> for PooledVec<T, P> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<'a, T: Clone + 'a, P: BufferPool<T>> Extend<&'a T> for PooledVec<T, P> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item.clone());
        }
    }
}

impl<T> FromIterator<T> for PooledVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut vec = Self::new();
        vec.extend(iter);
        vec
    }
}

impl<'a, T, P: BufferPool<T>> IntoIterator for &'a PooledVec<T, P> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, P::Alloc>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, P, Q> PartialEq<PooledVec<T, Q>> for PooledVec<T, P>
where
    T: PartialEq,
    P: BufferPool<T>,
    Q: BufferPool<T>,
{
    fn eq(&self, other: &PooledVec<T, Q>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: std::fmt::Debug, P: BufferPool<T>> std::fmt::Debug for PooledVec<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
