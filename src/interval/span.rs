//! The half-open [`Interval`] value type.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::PayloadRef;

/// A half-open time range `[start, end)` with an attached payload.
///
/// Bounds are kept at whole-second resolution and construction enforces
/// `start < end`; two intervals `[a, b)` and `[b, c)` are adjacent, not
/// overlapping.
///
/// # Example
///
/// ```
/// use work_entry_engine::interval::Interval;
/// use work_entry_engine::models::PayloadRef;
/// use chrono::{TimeZone, Utc};
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2024, 1, 1, 17, 0, 0).unwrap();
/// let interval = Interval::new(start, end, PayloadRef::Planning { slot_id: 3 }).unwrap();
/// assert_eq!(interval.duration().num_hours(), 8);
///
/// assert!(Interval::new(end, start, PayloadRef::Planning { slot_id: 3 }).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    payload: PayloadRef,
}

#[derive(Deserialize)]
struct RawInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    payload: PayloadRef,
}

impl TryFrom<RawInterval> for Interval {
    type Error = EngineError;

    fn try_from(raw: RawInterval) -> EngineResult<Self> {
        Interval::new(raw.start, raw.end, raw.payload)
    }
}

impl Interval {
    /// Creates an interval, failing with `InvalidInterval` when `start >= end`.
    ///
    /// Sub-second parts of both bounds are dropped first, so an interval
    /// shorter than a second inside one second is invalid.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, payload: PayloadRef) -> EngineResult<Self> {
        let (start, end) = (truncate_to_second(start), truncate_to_second(end));
        if start >= end {
            return Err(EngineError::InvalidInterval { start, end });
        }
        Ok(Self {
            start,
            end,
            payload,
        })
    }

    /// The inclusive start.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// The exclusive end.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// The record that produced this interval.
    pub fn payload(&self) -> &PayloadRef {
        &self.payload
    }

    /// Wall-clock length of the interval.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// True when the two intervals share at least one instant.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns a copy with new bounds and the same payload.
    ///
    /// Callers inside the crate guarantee `start < end`.
    pub(crate) fn with_bounds(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start < end, "fragment bounds must be ordered");
        Self {
            start,
            end,
            payload: self.payload.clone(),
        }
    }

    /// Builds an interval from bounds already known to be ordered.
    pub(crate) fn from_ordered(start: DateTime<Utc>, end: DateTime<Utc>, payload: PayloadRef) -> Self {
        debug_assert!(start < end, "fragment bounds must be ordered");
        Self {
            start,
            end,
            payload,
        }
    }

    pub(crate) fn extend_to(&mut self, end: DateTime<Utc>) {
        if end > self.end {
            self.end = end;
        }
    }
}

/// Drops the sub-second part of an instant.
pub(crate) fn truncate_to_second(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.with_nanosecond(0).unwrap_or(instant)
}
