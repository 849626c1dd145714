//! Configuration for `PooledVec` segment growth.

use crate::error::{Error, Result};

/// Capacity requested for the first segment under the default policy.
pub const DEFAULT_INITIAL_SEGMENT_CAPACITY: usize = 16;

/// Upper bound on the capacity requested for any single segment.
///
/// Keeps every rented buffer small enough to stay poolable.
pub const MAX_SEGMENT_CAPACITY: usize = 1 << 20;

/// Rule deciding how large each newly rented segment should be.
///
/// The policy only affects how elements are spread over buffers; values,
/// ordering and counts are identical under every policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthPolicy {
    /// Start at `initial` and double the previous segment's capacity for each
    /// new segment, never asking for more than `max`.
    Doubling {
        /// Capacity requested for the first segment.
        initial: usize,
        /// Cap on any request.
        max: usize,
    },
    /// Every segment requests the same capacity.
    Fixed {
        /// Capacity requested for each segment.
        size: usize,
    },
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::Doubling {
            initial: DEFAULT_INITIAL_SEGMENT_CAPACITY,
            max: MAX_SEGMENT_CAPACITY,
        }
    }
}

impl GrowthPolicy {
    /// Largest capacity this policy will ever request.
    #[inline]
    pub const fn max_capacity(&self) -> usize {
        match *self {
            Self::Doubling { max, .. } => max,
            Self::Fixed { size } => size,
        }
    }

    /// Capacity to request for the next segment, given the actual capacity
    /// of the current last segment (if any).
    ///
    /// Pools may hand out larger buffers than requested, so doubling is based
    /// on what was really received.
    #[inline]
    pub fn next_capacity(&self, previous: Option<usize>) -> usize {
        match (*self, previous) {
            (Self::Doubling { initial, max }, None) => initial.min(max),
            (Self::Doubling { max, .. }, Some(prev)) => prev.saturating_mul(2).min(max),
            (Self::Fixed { size }, _) => size,
        }
    }

    /// Number of segments needed to hold `elements`, assuming every buffer is
    /// exactly the requested size.
    pub fn segments_for(&self, elements: usize) -> usize {
        if elements == 0 {
            return 0;
        }
        match *self {
            Self::Fixed { size } => elements.div_ceil(size.max(1)),
            Self::Doubling { .. } => {
                let mut covered = 0usize;
                let mut segments = 0usize;
                let mut previous = None;
                while covered < elements {
                    let cap = self.next_capacity(previous).max(1);
                    covered = covered.saturating_add(cap);
                    previous = Some(cap);
                    segments += 1;
                }
                segments
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            Self::Doubling { initial, max } => {
                if initial == 0 {
                    return Err(Error::InvalidConfig(
                        "initial segment capacity must be non-zero".into(),
                    ));
                }
                if max < initial {
                    return Err(Error::InvalidConfig(format!(
                        "maximum segment capacity {max} is below the initial capacity {initial}"
                    )));
                }
                if max > MAX_SEGMENT_CAPACITY {
                    return Err(Error::InvalidConfig(format!(
                        "maximum segment capacity {max} exceeds {MAX_SEGMENT_CAPACITY}"
                    )));
                }
            }
            Self::Fixed { size } => {
                if size == 0 {
                    return Err(Error::InvalidConfig(
                        "fixed segment size must be non-zero".into(),
                    ));
                }
                if size > MAX_SEGMENT_CAPACITY {
                    return Err(Error::InvalidConfig(format!(
                        "fixed segment size {size} exceeds {MAX_SEGMENT_CAPACITY}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Container configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    /// How new segments are sized.
    pub growth: GrowthPolicy,
}

impl Config {
    /// Configuration using fixed-size segments of `size` elements.
    pub const fn fixed(size: usize) -> Self {
        Self {
            growth: GrowthPolicy::Fixed { size },
        }
    }

    /// Configuration using doubling segments.
    pub const fn doubling(initial: usize, max: usize) -> Self {
        Self {
            growth: GrowthPolicy::Doubling { initial, max },
        }
    }

    /// Checks that the configuration can produce non-empty segments.
    pub fn validate(&self) -> Result<()> {
        self.growth.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doubling_sequence() {
        let policy = GrowthPolicy::Doubling { initial: 4, max: 20 };
        assert_eq!(policy.next_capacity(None), 4);
        assert_eq!(policy.next_capacity(Some(4)), 8);
        assert_eq!(policy.next_capacity(Some(8)), 16);
        assert_eq!(policy.next_capacity(Some(16)), 20);
        assert_eq!(policy.next_capacity(Some(20)), 20);
    }

    #[test]
    fn test_doubling_follows_actual_capacity() {
        let policy = GrowthPolicy::default();
        // A pool that rounded 16 up to 32 makes the next request 64.
        assert_eq!(policy.next_capacity(Some(32)), 64);
        assert_eq!(
            policy.next_capacity(Some(MAX_SEGMENT_CAPACITY)),
            MAX_SEGMENT_CAPACITY
        );
        assert_eq!(policy.next_capacity(Some(usize::MAX)), MAX_SEGMENT_CAPACITY);
    }

    #[test]
    fn test_fixed_sequence() {
        let policy = GrowthPolicy::Fixed { size: 5 };
        assert_eq!(policy.next_capacity(None), 5);
        assert_eq!(policy.next_capacity(Some(8)), 5);
    }

    #[test]
    fn test_segments_for() {
        let fixed = GrowthPolicy::Fixed { size: 5 };
        assert_eq!(fixed.segments_for(0), 0);
        assert_eq!(fixed.segments_for(5), 1);
        assert_eq!(fixed.segments_for(11), 3);

        // 4 + 8 + 16 = 28
        let doubling = GrowthPolicy::Doubling { initial: 4, max: 1024 };
        assert_eq!(doubling.segments_for(1), 1);
        assert_eq!(doubling.segments_for(12), 2);
        assert_eq!(doubling.segments_for(13), 3);
        assert_eq!(doubling.segments_for(28), 3);
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());
        assert!(Config::fixed(5).validate().is_ok());
        assert!(matches!(
            Config::fixed(0).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Config::fixed(MAX_SEGMENT_CAPACITY + 1).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Config::doubling(0, 16).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Config::doubling(32, 16).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(Config::doubling(16, MAX_SEGMENT_CAPACITY).validate().is_ok());
        assert!(matches!(
            Config::doubling(16, 1 << 24).validate(),
            Err(Error::InvalidConfig(_))
        ));
    }
}
