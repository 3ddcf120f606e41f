//! Work entry value objects handed to the payroll subsystem.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{PayloadCategory, PayloadRef};

/// Reference to a payroll work entry type, by code (e.g. "WORK100").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkEntryTypeRef(String);

impl WorkEntryTypeRef {
    /// Creates a reference from a work entry type code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the work entry type code.
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkEntryTypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single-day, typed, duration-bearing unit consumed by payroll.
///
/// # Example
///
/// ```
/// use work_entry_engine::models::{CalendarLineKind, PayloadRef, WorkEntry, WorkEntryTypeRef};
/// use chrono::{NaiveDate, TimeZone, Utc};
/// use rust_decimal::Decimal;
///
/// let entry = WorkEntry {
///     date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     start: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
///     end: Utc.with_ymd_and_hms(2024, 1, 1, 17, 30, 0).unwrap(),
///     duration_seconds: 30_600,
///     work_entry_type: WorkEntryTypeRef::new("WORK100"),
///     source: PayloadRef::Calendar { line_id: 1, kind: CalendarLineKind::Regular },
/// };
/// assert_eq!(entry.hours(), Decimal::new(85, 1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkEntry {
    /// The local calendar day this entry belongs to.
    pub date: NaiveDate,
    /// Start of the fragment (UTC).
    pub start: DateTime<Utc>,
    /// End of the fragment (UTC, exclusive).
    pub end: DateTime<Utc>,
    /// Elapsed seconds between `start` and `end`.
    pub duration_seconds: u64,
    /// The payroll work entry type.
    pub work_entry_type: WorkEntryTypeRef,
    /// The record that produced this entry.
    pub source: PayloadRef,
}

impl WorkEntry {
    /// Returns the duration in hours.
    pub fn hours(&self) -> Decimal {
        Decimal::from(self.duration_seconds) / Decimal::from(3600)
    }

    /// Returns the category of the source payload.
    pub fn category(&self) -> PayloadCategory {
        self.source.category()
    }
}
