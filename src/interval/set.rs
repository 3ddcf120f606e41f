//! The [`IntervalSet`] algebra.
//!
//! An interval set is an ordered collection of [`Interval`]s. In the default
//! mode no two intervals overlap; a keep-distinct set relaxes that so several
//! payloads can cover the same span, which is what precedence resolution
//! consumes. Every operation is pure and returns a new set.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::Interval;

/// An ordered collection of intervals supporting union, intersection and
/// difference.
///
/// # Example
///
/// ```
/// use work_entry_engine::interval::{Interval, IntervalSet};
/// use work_entry_engine::models::PayloadRef;
/// use chrono::{TimeZone, Utc};
///
/// let at = |h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap();
/// let shift = IntervalSet::new([Interval::new(at(9), at(17), PayloadRef::Planning { slot_id: 1 }).unwrap()]);
/// let lunch = IntervalSet::new([Interval::new(at(12), at(13), PayloadRef::Planning { slot_id: 2 }).unwrap()]);
///
/// let worked = shift.difference(&lunch);
/// assert_eq!(worked.len(), 2);
/// assert_eq!(worked.sum_duration().num_hours(), 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
    keep_distinct: bool,
}

impl IntervalSet {
    /// An empty, default-mode set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a default-mode set.
    ///
    /// Overlapping intervals are merged into one covering interval that keeps
    /// the payload of the earliest-starting one (input order breaks ties).
    /// Adjacent intervals are merged only when their payloads are equal.
    pub fn new(intervals: impl IntoIterator<Item = Interval>) -> Self {
        Self {
            intervals: normalize(intervals.into_iter().collect()),
            keep_distinct: false,
        }
    }

    /// Builds a keep-distinct set: intervals are sorted by start (input order
    /// breaks ties) but never merged.
    pub fn distinct(intervals: impl IntoIterator<Item = Interval>) -> Self {
        let mut intervals: Vec<Interval> = intervals.into_iter().collect();
        intervals.sort_by_key(|interval| interval.start());
        Self {
            intervals,
            keep_distinct: true,
        }
    }

    /// True for keep-distinct sets.
    pub fn is_keep_distinct(&self) -> bool {
        self.keep_distinct
    }

    /// Number of intervals in the set.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// True when the set holds no interval.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Iterates intervals in non-decreasing start order.
    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.intervals.iter()
    }

    /// The intervals as a slice, in non-decreasing start order.
    pub fn as_slice(&self) -> &[Interval] {
        &self.intervals
    }

    /// Merges two sets.
    ///
    /// With `keep_distinct = false` overlapping intervals collapse into one
    /// covering interval whose payload is that of the earliest-starting one,
    /// with `self` winning ties. Callers must settle payload priority before
    /// relying on that. With `keep_distinct = true` every interval is kept.
    pub fn union(&self, other: &IntervalSet, keep_distinct: bool) -> IntervalSet {
        let combined = self.intervals.iter().chain(other.intervals.iter()).cloned();
        if keep_distinct {
            Self::distinct(combined)
        } else {
            Self::new(combined)
        }
    }

    /// Returns the regions of `self` covered by `other`.
    ///
    /// Payloads always come from `self`; in a keep-distinct set every
    /// overlapping interval of `self` keeps its own fragment.
    pub fn intersection(&self, other: &IntervalSet) -> IntervalSet {
        let spans = other.coverage();
        let mut fragments = Vec::new();

        for interval in &self.intervals {
            for &(start, end) in overlapping_spans(&spans, interval) {
                let start = start.max(interval.start());
                let end = end.min(interval.end());
                if start < end {
                    fragments.push(interval.with_bounds(start, end));
                }
            }
        }

        self.rebuild(fragments)
    }

    /// Subtracts the time covered by `other`, splitting intervals at its
    /// boundaries. Fragment bounds are exact; nothing is rounded.
    pub fn difference(&self, other: &IntervalSet) -> IntervalSet {
        let spans = other.coverage();
        let mut fragments = Vec::new();

        for interval in &self.intervals {
            let mut cursor = interval.start();
            for &(start, end) in overlapping_spans(&spans, interval) {
                if start > cursor {
                    fragments.push(interval.with_bounds(cursor, start));
                }
                cursor = cursor.max(end);
            }
            if cursor < interval.end() {
                fragments.push(interval.with_bounds(cursor, interval.end()));
            }
        }

        self.rebuild(fragments)
    }

    /// Restricts the set to `[start, end)`.
    pub fn clip(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> IntervalSet {
        let fragments = self
            .intervals
            .iter()
            .filter_map(|interval| {
                let from = interval.start().max(start);
                let to = interval.end().min(end);
                (from < to).then(|| interval.with_bounds(from, to))
            })
            .collect();
        self.rebuild(fragments)
    }

    /// Returns a default-mode copy of this set.
    pub fn merged(&self) -> IntervalSet {
        if self.keep_distinct {
            Self::new(self.intervals.iter().cloned())
        } else {
            self.clone()
        }
    }

    /// Total wall-clock duration: the sum of `end - start` over every
    /// interval. Overlaps in a keep-distinct set are counted once per interval.
    pub fn sum_duration(&self) -> Duration {
        self.intervals
            .iter()
            .fold(Duration::zero(), |total, interval| total + interval.duration())
    }

    /// The covered time as merged `(start, end)` spans, ignoring payloads.
    pub fn coverage(&self) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let mut spans: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();
        for interval in &self.intervals {
            match spans.last_mut() {
                Some(last) if interval.start() <= last.1 => {
                    last.1 = last.1.max(interval.end());
                }
                _ => spans.push((interval.start(), interval.end())),
            }
        }
        spans
    }

    fn rebuild(&self, fragments: Vec<Interval>) -> IntervalSet {
        if self.keep_distinct {
            Self::distinct(fragments)
        } else {
            Self::new(fragments)
        }
    }
}

impl<'a> IntoIterator for &'a IntervalSet {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}

impl IntoIterator for IntervalSet {
    type Item = Interval;
    type IntoIter = std::vec::IntoIter<Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.into_iter()
    }
}

impl FromIterator<Interval> for IntervalSet {
    fn from_iter<T: IntoIterator<Item = Interval>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// Returns the merged spans that may overlap `interval`.
///
/// `spans` must be sorted and disjoint, as produced by `coverage`.
fn overlapping_spans<'a>(
    spans: &'a [(DateTime<Utc>, DateTime<Utc>)],
    interval: &Interval,
) -> &'a [(DateTime<Utc>, DateTime<Utc>)] {
    let first = spans.partition_point(|(_, end)| *end <= interval.start());
    let last = spans.partition_point(|(start, _)| *start < interval.end());
    &spans[first..last.max(first)]
}

fn normalize(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort_by_key(|interval| interval.start());

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last)
                if interval.start() < last.end()
                    || (interval.start() == last.end() && interval.payload() == last.payload()) =>
            {
                last.extend_to(interval.end());
            }
            _ => merged.push(interval),
        }
    }
    merged
}
