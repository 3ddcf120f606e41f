//! Interval algebra.
//!
//! This module contains the [`Interval`] value type, the [`IntervalSet`]
//! collection with its union/intersection/difference operations, and the
//! timezone-aware calendar-day helpers used to slice intervals by local day.

mod calendar_day;
mod set;
mod span;

pub use calendar_day::{local_date, local_day_start, next_local_midnight, split_by_local_day};
pub use set::IntervalSet;
pub use span::Interval;
pub(crate) use span::truncate_to_second;
