//! Half-open token intervals
//!
//! An [`Interval`] is stored as `(start, length)` so a negative length is
//! unrepresentable. Iterating an interval yields the token indices it covers.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::{OreError, Result};

/// Half-open range of token positions `[start, start + length)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Interval {
    start: usize,
    length: usize,
}

impl Interval {
    /// Create an interval from a start position and a length
    pub const fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Create an interval from `[start, end)` bounds
    pub fn from_bounds(start: usize, end: usize) -> Result<Self> {
        if end < start {
            return Err(OreError::Bounds(format!(
                "interval end {end} precedes start {start}"
            )));
        }
        Ok(Self::new(start, end - start))
    }

    /// Zero-length interval at `position`
    pub const fn empty_at(position: usize) -> Self {
        Self::new(position, 0)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// `end()`, or `None` when it does not fit in a `usize`
    pub fn checked_end(&self) -> Option<usize> {
        self.start.checked_add(self.length)
    }

    /// True if the interval lies inside a sequence of `length` positions
    pub fn fits_within(&self, length: usize) -> bool {
        self.checked_end().is_some_and(|end| end <= length)
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Check whether token position `i` lies inside this interval
    pub fn contains(&self, i: usize) -> bool {
        self.start <= i && i < self.end()
    }

    /// Check whether `other` lies entirely inside this interval
    pub fn contains_interval(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end() <= self.end()
    }

    /// True if one interval ends exactly where the other starts
    pub fn is_adjacent_to(&self, other: &Interval) -> bool {
        self.end() == other.start || other.end() == self.start
    }

    /// True if the intervals share at least one token position; an empty
    /// interval shares none
    pub fn overlaps_with(&self, other: &Interval) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.start < other.end()
            && other.start < self.end()
    }

    /// True if every interval in `intervals` is pairwise non-overlapping
    pub fn is_disjoint(intervals: &[Interval]) -> bool {
        Self::first_overlap(intervals).is_none()
    }

    /// Some overlapping pair from `intervals`, if any exists
    pub fn first_overlap(intervals: &[Interval]) -> Option<(Interval, Interval)> {
        let mut sorted: Vec<Interval> = intervals
            .iter()
            .filter(|i| !i.is_empty())
            .copied()
            .collect();
        sorted.sort();

        // Furthest-reaching interval seen so far.
        let mut reach: Option<Interval> = None;
        for interval in sorted {
            match reach {
                Some(prev) if prev.overlaps_with(&interval) => return Some((prev, interval)),
                _ => reach = Some(interval),
            }
        }
        None
    }

    /// Smallest interval covering both `self` and `other`
    pub fn join(&self, other: &Interval) -> Interval {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        Interval::new(start, end - start)
    }

    /// Shared positions of both intervals, if any
    pub fn intersection(&self, other: &Interval) -> Option<Interval> {
        if !self.overlaps_with(other) {
            return None;
        }
        let start = self.start.max(other.start);
        let end = self.end().min(other.end());
        Some(Interval::new(start, end - start))
    }

    /// Number of token positions separating the two intervals (0 if they
    /// touch or overlap)
    pub fn distance_to(&self, other: &Interval) -> usize {
        if self.end() <= other.start {
            other.start - self.end()
        } else if other.end() <= self.start {
            self.start - other.end()
        } else {
            0
        }
    }

    /// The same interval moved left by `offset` positions, for re-basing
    /// into a sliced sequence
    pub fn shift_left(&self, offset: usize) -> Result<Interval> {
        if offset > self.start {
            return Err(OreError::Bounds(format!(
                "cannot shift {self} left by {offset}"
            )));
        }
        Ok(Interval::new(self.start - offset, self.length))
    }

    pub fn iter(&self) -> Range<usize> {
        self.as_range()
    }
}

impl Ord for Interval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then(self.length.cmp(&other.length))
    }
}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl IntoIterator for Interval {
    type Item = usize;
    type IntoIter = Range<usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_range()
    }
}

impl IntoIterator for &Interval {
    type Item = usize;
    type IntoIter = Range<usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_range()
    }
}

impl From<Range<usize>> for Interval {
    fn from(range: Range<usize>) -> Self {
        Interval::new(range.start, range.end.saturating_sub(range.start))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}

// ============================================================================
// Tests
// ============================================================================
